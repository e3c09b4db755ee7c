//! End-to-end pipeline tests over realistic paper-shaped sources.

use flattex::cache::{cache_key, EntryStatus, RunCache};
use flattex::latex::rules;
use flattex::latex::{restore, Masker};
use flattex::pipeline::{finalize, Flattener};
use flattex::Config;
use tempfile::TempDir;

fn no_cache_config() -> Config {
    Config {
        no_cache: true,
        ..Config::default()
    }
}

const PAPER: &str = r"\documentclass{article}
\newtheorem{theorem}{Theorem}
\begin{document}
\section{Introduction}
We study the map $f(x) = x^2$ over the reals.
This paragraph is wrapped
across several lines.

\begin{theorem}
Every bounded sequence has a convergent subsequence.
\end{theorem}

\begin{itemize}
\item First observation about convergence.
\item Second observation, see \cite{rudin76}.
\end{itemize}

\begin{equation}
e^{i\pi} + 1 = 0
\end{equation}

Final remarks with \textbf{emphasis} and a ratio of 50\% cases.
\end{document}
";

#[test]
fn paper_flattens_to_plain_text() {
    let flattener = Flattener::new(no_cache_config());
    let output = finalize(&flattener.flatten(PAPER).unwrap());

    assert!(output.contains("Introduction"));
    assert!(output.contains("We study the map"));
    assert!(output.contains("First observation about convergence."));
    assert!(output.contains("emphasis"));
    assert!(output.contains("50% cases"));

    // Markup noise must be gone.
    assert!(!output.contains("documentclass"));
    assert!(!output.contains("\\begin"));
    assert!(!output.contains("\\item"));
    assert!(!output.contains("$f(x)"));
    assert!(!output.contains("rudin76"));
}

#[test]
fn theorem_body_is_extracted_via_discovered_environment() {
    let flattener = Flattener::new(no_cache_config());
    let output = flattener.flatten(PAPER).unwrap();
    assert!(output.contains("Every bounded sequence has a convergent subsequence."));
}

#[test]
fn math_becomes_placeholder_tokens() {
    let flattener = Flattener::new(no_cache_config());
    let output = flattener.flatten(PAPER).unwrap();
    assert!(output.contains("XMATHX"), "math should be masked: {output}");
    assert!(!output.contains("e^{i\\pi}"));
}

#[test]
fn wrapped_sentences_are_joined() {
    let flattener = Flattener::new(no_cache_config());
    let output = flattener.flatten(PAPER).unwrap();
    assert!(output.contains("This paragraph is wrapped across several lines."));
}

#[test]
fn identical_runs_produce_identical_output() {
    let flattener = Flattener::new(no_cache_config());
    let first = flattener.flatten(PAPER).unwrap();
    let second = Flattener::new(no_cache_config()).flatten(PAPER).unwrap();
    assert_eq!(first, second);
}

#[test]
fn sequential_and_parallel_runs_agree() {
    let sequential = Flattener::new(Config {
        threads: 1,
        ..no_cache_config()
    });
    let parallel = Flattener::new(Config {
        threads: 8,
        ..no_cache_config()
    });
    assert_eq!(
        sequential.flatten(PAPER).unwrap(),
        parallel.flatten(PAPER).unwrap()
    );
}

#[test]
fn cached_run_records_a_complete_entry_and_still_recomputes() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        cache_dir: Some(dir.path().to_path_buf()),
        ..Config::default()
    };
    let key = cache_key(PAPER, &config, &rules::multi_arg_commands());

    let first = Flattener::new(config.clone()).flatten(PAPER).unwrap();
    let cache = RunCache::open(Some(dir.path().to_path_buf())).unwrap();
    let entry = cache.get(&key).expect("entry recorded");
    assert_eq!(entry.status, EntryStatus::Complete);
    assert_eq!(entry.text.as_deref(), Some(first.as_str()));

    // A hit is a signal only: the second run recomputes the same output.
    let second = Flattener::new(config).flatten(PAPER).unwrap();
    assert_eq!(first, second);
}

#[test]
fn oversized_line_yields_no_output() {
    let config = Config {
        char_limit: 40,
        ..no_cache_config()
    };
    let one_line = "tokens ".repeat(20);
    assert!(Flattener::new(config).flatten(&one_line).is_err());
}

#[test]
fn mask_restore_roundtrip_on_paper_source() {
    let masker = Masker::new();
    let (masked, tokens) = masker.mask(PAPER);
    assert_eq!(restore(&masked, &tokens), PAPER);
}
