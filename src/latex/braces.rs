//! Brace-depth recursive descent over `{...}` groups.
//!
//! This is the mechanism by which command arguments and environment bodies
//! get transformed regardless of how deeply they are nested inside other
//! commands: the engine hands each outermost group's inner content to a
//! transform, and the transform re-enters the engine for its own nesting.
//!
//! Unbalanced braces are never fatal. An open brace with no matching close
//! leaves the remaining text verbatim and the run completes with a
//! structurally degraded but non-crashing result.

use tracing::warn;

use crate::error::{FlattexError, Result};

/// A brace-delimited span of markup text.
///
/// `start` and `end` are byte offsets of the opening and closing brace.
/// `parent` is an index into the same arena, for lookup only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub start: usize,
    pub end: usize,
    pub depth: usize,
    pub parent: Option<usize>,
}

impl Group {
    /// The content between the braces, excluding the braces themselves.
    pub fn inner<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start + 1..self.end]
    }
}

/// Transform applied to the inner content of a group.
///
/// Passed explicitly so recursive descent needs no self-referential closure:
/// the transform may call [`process_outer_groups`] again on its input.
pub type Transform<'a> = &'a (dyn Fn(&str) -> Result<String> + Sync);

/// Scan `text` and collect every balanced brace group, ordered by opening
/// position. Escaped braces (`\{`, `\}`) are not group delimiters.
///
/// Groups left open at end of input are dropped (and logged); a stray `}`
/// at depth 0 is ignored.
pub fn find_groups(text: &str) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut escaped = false;

    for (pos, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '{' => {
                let parent = stack.last().copied();
                stack.push(groups.len());
                groups.push(Group {
                    start: pos,
                    end: usize::MAX,
                    depth: stack.len() - 1,
                    parent,
                });
            }
            '}' => {
                if let Some(idx) = stack.pop() {
                    groups[idx].end = pos;
                }
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        warn!(open = stack.len(), "unbalanced braces: dropping unclosed groups");
        groups.retain(|g| g.end != usize::MAX);
    }
    groups
}

/// Apply `transform` to the inner content of every outermost (depth-0
/// relative to this segment) brace group and reconstruct the segment with
/// braces intact. Text outside groups passes through verbatim.
pub fn process_outer_groups(text: &str, transform: Transform) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut group_start = 0usize;
    let mut escaped = false;

    for (pos, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            if depth == 0 {
                out.push(ch);
            }
            continue;
        }
        match ch {
            '\\' => {
                escaped = true;
                if depth == 0 {
                    out.push(ch);
                }
            }
            '{' => {
                if depth == 0 {
                    group_start = pos;
                }
                depth += 1;
            }
            '}' => {
                if depth > 1 {
                    depth -= 1;
                } else if depth == 1 {
                    depth = 0;
                    let inner = &text[group_start + 1..pos];
                    out.push('{');
                    out.push_str(&transform(inner)?);
                    out.push('}');
                } else {
                    // Stray close at depth 0: pass through.
                    out.push(ch);
                }
            }
            _ => {
                if depth == 0 {
                    out.push(ch);
                }
            }
        }
    }

    if depth > 0 {
        let err = FlattexError::Structural(format!("unclosed brace group at byte {group_start}"));
        warn!(%err, "recovered: preserving remainder verbatim");
        out.push_str(&text[group_start..]);
    }
    Ok(out)
}

/// Byte offset of the `}` matching the `{` at `open`, if balanced.
pub fn matching_close(text: &str, open: usize) -> Option<usize> {
    debug_assert_eq!(text.as_bytes()[open], b'{');
    let mut depth = 0usize;
    let mut escaped = false;
    for (pos, ch) in text[open..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + pos);
                }
            }
            _ => {}
        }
    }
    None
}
