//! Include resolution over real directory trees.

use std::fs;

use flattex::files::{find_main_file, resolve};
use tempfile::TempDir;

#[test]
fn resolves_nested_includes_across_subdirectories() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sections")).unwrap();
    fs::write(
        dir.path().join("main.tex"),
        "\\begin{document}\n\\input{sections/intro}\n\\end{document}\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("sections/intro.tex"),
        "Intro text.\n\\input{sections/details}\n",
    )
    .unwrap();
    fs::write(dir.path().join("sections/details.tex"), "Details.\n").unwrap();

    let resolved = resolve(&dir.path().join("main.tex"), dir.path()).unwrap();
    assert!(resolved.contains("Intro text."));
    assert!(resolved.contains("Details."));
    assert!(!resolved.contains("\\input"));
}

#[test]
fn discovery_then_resolution_round_trip() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("style.tex"), "% just macros\n").unwrap();
    fs::write(
        dir.path().join("paper.tex"),
        "\\begin{document}\n\\input{chapter}\n\\end{document}\n",
    )
    .unwrap();
    fs::write(dir.path().join("chapter.tex"), "Chapter body.\n").unwrap();

    let main = find_main_file(dir.path()).unwrap().expect("main file found");
    let resolved = resolve(&main, dir.path()).unwrap();
    assert!(resolved.contains("Chapter body."));
}

#[test]
fn mutual_inclusion_terminates_with_finite_output() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.tex"), "A says:\n\\input{b}\n").unwrap();
    fs::write(dir.path().join("b.tex"), "B says:\n\\input{a}\n").unwrap();

    let resolved = resolve(&dir.path().join("a.tex"), dir.path()).unwrap();
    assert_eq!(resolved.matches("A says:").count(), 1);
    assert_eq!(resolved.matches("B says:").count(), 1);
}
