//! Cross-file include resolution.
//!
//! `\input{...}` and `\include{...}` lines are replaced by the referenced
//! file's recursively resolved content. A root file that cannot be read is a
//! [`FlattexError::Resource`]; a missing include becomes an inline warning
//! marker and the run continues. Cyclic references contribute nothing
//! (resolved once, silently truncated rather than recursing forever).

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::error::{FlattexError, Result};

static INCLUDE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\\(?:input|include)\{(.+?)\}").unwrap());

/// Resolve `path` relative to `base_dir`, inlining every include.
pub fn resolve(path: &Path, base_dir: &Path) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|_| FlattexError::Resource {
        path: path.to_path_buf(),
    })?;
    let mut visited = HashSet::new();
    visited.insert(canonicalized(path));
    Ok(resolve_lines(&content, base_dir, &mut visited))
}

fn canonicalized(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn resolve_lines(content: &str, base_dir: &Path, visited: &mut HashSet<PathBuf>) -> String {
    let mut resolved = String::with_capacity(content.len());
    for line in content.lines() {
        match INCLUDE_RE.captures(line.trim()) {
            Some(caps) => {
                let mut sub_path = caps[1].to_string();
                if Path::new(&sub_path).extension().is_none() {
                    sub_path.push_str(".tex");
                }
                let full = base_dir.join(&sub_path);
                let canonical = canonicalized(&full);
                if visited.contains(&canonical) {
                    // Cycle: this file is already being inlined above us.
                    continue;
                }
                match fs::read_to_string(&full) {
                    Ok(sub_content) => {
                        visited.insert(canonical);
                        resolved.push_str(&resolve_lines(&sub_content, base_dir, visited));
                    }
                    Err(err) => {
                        warn!(path = %full.display(), %err, "missing include");
                        resolved.push_str(&format!("% WARNING: missing file {}\n", sub_path));
                    }
                }
            }
            None => {
                resolved.push_str(line);
                resolved.push('\n');
            }
        }
    }
    resolved
}
