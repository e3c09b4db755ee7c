//! Environment- and command-aware scanning.
//!
//! A scan pass walks the whole document once per configured name, locating
//! `\begin{name}...\end{name}` bodies and `\name{...}` arguments, handing
//! the relevant inner content to the caller-supplied transform via the brace
//! engine, and substituting the result back in place.
//!
//! Names are explicit `{name, starred}` specifications enumerated ahead of a
//! pass; the starred and bare variants of a name are separate specs, never
//! inferred per occurrence.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::error::{FlattexError, Result};
use crate::latex::braces::{matching_close, Transform};

/// An environment to scan, e.g. `{itemize, starred: false}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSpec {
    pub name: String,
    pub starred: bool,
}

/// A single-argument command to scan, e.g. `{section, starred: true}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub starred: bool,
}

/// A command taking several brace arguments, only some of them text.
///
/// `translatable` holds zero-based argument positions, e.g. `textcolor`
/// takes two arguments of which only position 1 is natural language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultiArgCommand {
    pub name: String,
    pub argc: usize,
    pub translatable: Vec<usize>,
    pub starred: bool,
}

impl EnvSpec {
    pub fn new(name: &str, starred: bool) -> Self {
        Self {
            name: name.to_string(),
            starred,
        }
    }

    fn full_name(&self) -> String {
        if self.starred {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }
}

impl CommandSpec {
    pub fn new(name: &str, starred: bool) -> Self {
        Self {
            name: name.to_string(),
            starred,
        }
    }
}

/// Expand a name list into bare and starred variants, bare first.
pub fn env_variants(names: &[String]) -> Vec<EnvSpec> {
    names
        .iter()
        .flat_map(|n| [EnvSpec::new(n, false), EnvSpec::new(n, true)])
        .collect()
}

/// Expand a name list into bare and starred variants, bare first.
pub fn command_variants(names: &[&str]) -> Vec<CommandSpec> {
    names
        .iter()
        .flat_map(|n| [CommandSpec::new(n, false), CommandSpec::new(n, true)])
        .collect()
}

/// Transform the body of every `\begin{name}...\end{name}` occurrence.
///
/// Same-name nesting is counted, so the matching `\end` is found even when
/// an environment contains itself. An unmatched `\begin` leaves that
/// occurrence untouched rather than failing the run.
pub fn process_environment(text: &str, spec: &EnvSpec, transform: Transform) -> Result<String> {
    let begin_marker = format!("\\begin{{{}}}", spec.full_name());
    let end_marker = format!("\\end{{{}}}", spec.full_name());

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    while let Some(rel) = text[cursor..].find(&begin_marker) {
        let begin = cursor + rel;
        let body_start = begin + begin_marker.len();
        match find_env_end(&text[body_start..], &begin_marker, &end_marker) {
            Some(rel_end) => {
                let body_end = body_start + rel_end;
                out.push_str(&text[cursor..body_start]);
                out.push_str(&transform(&text[body_start..body_end])?);
                out.push_str(&end_marker);
                cursor = body_end + end_marker.len();
            }
            None => {
                let err =
                    FlattexError::Structural(format!("unmatched \\begin{{{}}}", spec.full_name()));
                warn!(%err, "leaving environment untouched");
                out.push_str(&text[cursor..body_start]);
                cursor = body_start;
            }
        }
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

/// Offset of the `\end` matching an already-consumed `\begin`, counting
/// same-name nesting. Relative to the start of `body`.
fn find_env_end(body: &str, begin_marker: &str, end_marker: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut pos = 0usize;
    loop {
        let next_begin = body[pos..].find(begin_marker).map(|r| pos + r);
        let next_end = body[pos..].find(end_marker).map(|r| pos + r)?;
        match next_begin {
            Some(b) if b < next_end => {
                depth += 1;
                pos = b + begin_marker.len();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some(next_end);
                }
                pos = next_end + end_marker.len();
            }
        }
    }
}

/// Transform the argument of every `\name{...}` occurrence.
///
/// The argument group is located with the brace engine; an argument whose
/// closing brace is missing leaves the occurrence untouched.
pub fn process_command(text: &str, spec: &CommandSpec, transform: Transform) -> Result<String> {
    let head = command_head(spec);
    let re = command_regex(&head);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    while let Some(m) = re.find(&text[cursor..]) {
        let open = cursor + m.end() - 1;
        out.push_str(&text[cursor..open]);
        match matching_close(text, open) {
            Some(close) => {
                out.push('{');
                out.push_str(&transform(&text[open + 1..close])?);
                out.push('}');
                cursor = close + 1;
            }
            None => {
                warn!(command = %head, "unclosed argument, leaving command untouched");
                out.push_str(&text[open..]);
                return Ok(out);
            }
        }
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

/// Transform the translatable arguments of a multi-argument command.
///
/// Occurrences with fewer than `argc` brace groups are left untouched.
pub fn process_multi_arg_command(
    text: &str,
    spec: &MultiArgCommand,
    transform: Transform,
) -> Result<String> {
    let head = format!(
        "\\{}{}",
        regex::escape(&spec.name),
        if spec.starred { r"\*" } else { "" }
    );
    let re = command_regex(&head);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    while let Some(m) = re.find(&text[cursor..]) {
        let mut open = cursor + m.end() - 1;
        let head_end = open;

        // Collect argc consecutive brace groups, whitespace allowed between.
        let mut args: Vec<(usize, usize)> = Vec::new();
        for _ in 0..spec.argc {
            if text.as_bytes().get(open) != Some(&b'{') {
                break;
            }
            match matching_close(text, open) {
                Some(close) => {
                    args.push((open, close));
                    open = close + 1;
                    while text.as_bytes().get(open) == Some(&b' ') {
                        open += 1;
                    }
                }
                None => break,
            }
        }

        if args.len() < spec.argc {
            warn!(command = %spec.name, "expected {} arguments, leaving occurrence untouched", spec.argc);
            out.push_str(&text[cursor..head_end]);
            cursor = head_end;
            // Skip past the head so the scan advances.
            out.push_str(&text[cursor..cursor + 1]);
            cursor += 1;
            continue;
        }

        out.push_str(&text[cursor..head_end]);
        let mut prev_end = head_end;
        for (i, &(arg_open, arg_close)) in args.iter().enumerate() {
            out.push_str(&text[prev_end..arg_open]);
            out.push('{');
            if spec.translatable.contains(&i) {
                out.push_str(&transform(&text[arg_open + 1..arg_close])?);
            } else {
                out.push_str(&text[arg_open + 1..arg_close]);
            }
            out.push('}');
            prev_end = arg_close + 1;
        }
        cursor = prev_end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

/// Strip a formatting wrapper, keeping its content: `\name{inner}` → `inner`.
///
/// Applied before masking so pure-formatting commands never hide text from
/// the extraction path.
pub fn strip_format_command(text: &str, spec: &CommandSpec) -> String {
    let head = command_head(spec);
    let re = command_regex(&head);

    let mut current = text.to_string();
    loop {
        let Some(m) = re.find(&current) else {
            return current;
        };
        let open = m.end() - 1;
        match matching_close(&current, open) {
            Some(close) => {
                let mut next = String::with_capacity(current.len());
                next.push_str(&current[..m.start()]);
                next.push_str(&current[open + 1..close]);
                next.push_str(&current[close + 1..]);
                current = next;
            }
            None => return current,
        }
    }
}

static SPLIT_COMMAND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(?:item|par)\b").unwrap());

/// Split text around structure-only commands that take no brace argument
/// (`\item`, `\par`). Returns (piece, following separator) pairs; the last
/// separator is empty. Each piece goes through the extraction transform on
/// its own.
pub fn split_by_command(text: &str) -> Vec<(&str, &str)> {
    let mut parts = Vec::new();
    let mut cursor = 0usize;
    for m in SPLIT_COMMAND_RE.find_iter(text) {
        parts.push((&text[cursor..m.start()], m.as_str()));
        cursor = m.end();
    }
    parts.push((&text[cursor..], ""));
    parts
}

fn command_head(spec: &CommandSpec) -> String {
    format!(
        "\\{}{}",
        regex::escape(&spec.name),
        if spec.starred { r"\*" } else { "" }
    )
}

/// Matches the command head directly followed (modulo spaces) by `{`.
/// The mandatory `{` doubles as the name boundary, so `\section` never
/// matches inside `\sectionmark{...}` and a bare spec never matches the
/// starred occurrence.
fn command_regex(escaped_head: &str) -> Regex {
    Regex::new(&format!(r"\\{} *\{{", &escaped_head[1..])).unwrap()
}
