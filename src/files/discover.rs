//! Main-file discovery: find the `.tex` file that carries
//! `\begin{document}` in an extracted source tree.

use std::fs;
use std::path::{Path, PathBuf};

use crate::latex::document::BEGIN_DOCUMENT;

/// Walk `base_dir` and return the first `.tex` file containing the
/// document-begin marker, if any.
pub fn find_main_file(base_dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let mut stack = vec![base_dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let mut entries: Vec<_> = fs::read_dir(&dir)?.filter_map(|e| e.ok()).collect();
        entries.sort_by_key(|e| e.path());
        for entry in entries {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|ext| ext == "tex") {
                if let Ok(content) = fs::read_to_string(&path) {
                    if content.contains(BEGIN_DOCUMENT) {
                        return Ok(Some(path));
                    }
                }
            }
        }
    }
    Ok(None)
}
