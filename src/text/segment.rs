//! Paragraph segmentation and line joining.

use once_cell::sync::Lazy;
use regex::Regex;

/// An ordered unit of the flattened document. The index defines the total
/// order and is preserved across all downstream processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub index: usize,
    pub text: String,
}

static PARAGRAPH_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\n+").unwrap());

/// Split placeholder-masked text on runs of one-or-more blank lines.
/// Deterministic: the same input always yields the same sequence.
pub fn split_paragraphs(text: &str) -> Vec<Paragraph> {
    PARAGRAPH_BOUNDARY
        .split(text)
        .enumerate()
        .map(|(index, chunk)| Paragraph {
            index,
            text: chunk.to_string(),
        })
        .collect()
}

/// Ends a sentence, so the following line starts a new unit.
fn ends_sentence(line: &str) -> bool {
    line.trim_end()
        .ends_with(['.', '!', '?', ':', ';'])
}

/// Join hard-wrapped lines within a paragraph so each resulting line holds a
/// whole sentence run. A line that does not end with sentence-final
/// punctuation is glued to the next one with a single space.
pub fn join_wrapped_lines(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out = String::with_capacity(text.len());
    for (i, line) in lines.iter().enumerate() {
        out.push_str(line.trim_end());
        if i + 1 == lines.len() {
            break;
        }
        let next_empty = lines[i + 1].trim().is_empty();
        if ends_sentence(line) || line.trim().is_empty() || next_empty {
            out.push('\n');
        } else {
            out.push(' ');
        }
    }
    out
}

/// Fragment repair: sources without document markers often arrive with
/// paragraphs broken by a single newline mid-sentence. Join a line to the
/// next when it ends mid-sentence and the next line starts in lowercase.
pub fn connect_paragraphs(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out = String::with_capacity(text.len());
    for (i, line) in lines.iter().enumerate() {
        out.push_str(line);
        if i + 1 == lines.len() {
            break;
        }
        let next = lines[i + 1].trim_start();
        let continues = !ends_sentence(line)
            && !line.trim().is_empty()
            && next.chars().next().is_some_and(|c| c.is_lowercase());
        if continues {
            out.push(' ');
        } else {
            out.push('\n');
        }
    }
    out
}

/// Squeeze runs of spaces down to one.
pub fn squeeze_spaces(text: &str) -> String {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"  +").unwrap());
    RE.replace_all(text, " ").into_owned()
}
