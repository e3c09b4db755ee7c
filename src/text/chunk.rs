//! Length-bounded, line-preserving chunking.
//!
//! The downstream consumer has a hard character budget per unit. Whole
//! lines are grouped into chunks under that budget; a single line that
//! already meets or exceeds it is a fatal configuration error, never a
//! silent truncation.

use crate::error::{FlattexError, Result};

/// Safety margin subtracted from the budget when accumulating lines.
const CHUNK_MARGIN: usize = 10;

/// Group whole lines of `text` into chunks each under `budget - 10` chars.
/// Chunks are stripped of surrounding whitespace; lines are never split.
pub fn chunk_lines(text: &str, budget: usize) -> Result<Vec<String>> {
    let mut chunks = Vec::new();
    let mut part = String::new();
    for line in text.split('\n') {
        if line.chars().count() >= budget {
            return Err(FlattexError::Configuration {
                length: line.chars().count(),
                budget,
            });
        }
        if part.chars().count() + line.chars().count() < budget.saturating_sub(CHUNK_MARGIN) {
            if part.is_empty() {
                part.push_str(line);
            } else {
                part.push('\n');
                part.push_str(line);
            }
        } else {
            chunks.push(part);
            part = line.to_string();
        }
    }
    chunks.push(part);
    Ok(chunks.into_iter().map(|c| c.trim().to_string()).collect())
}

/// Bound a paragraph to the budget and rejoin with single separators.
/// Zero-width spaces are dropped; they confuse downstream tokenizers.
pub fn bound_paragraph(text: &str, budget: usize) -> Result<String> {
    let chunks = chunk_lines(text, budget)?;
    Ok(chunks.join("\n").replace('\u{200b}', ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_paragraph_is_one_chunk() {
        let chunks = chunk_lines("a\nb\nc", 100).unwrap();
        assert_eq!(chunks, vec!["a\nb\nc"]);
    }

    #[test]
    fn never_splits_a_line() {
        let text = "aaaa\nbbbb\ncccc\ndddd";
        let chunks = chunk_lines(text, 22).unwrap();
        for chunk in &chunks {
            for line in chunk.lines() {
                assert!(text.lines().any(|l| l == line), "line was split: {line}");
            }
        }
    }

    #[test]
    fn concatenation_reconstructs_content() {
        let text = "first line\nsecond line\nthird line";
        let chunks = chunk_lines(text, 25).unwrap();
        let rejoined = chunks.join("\n");
        let normalize = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(normalize(&rejoined), normalize(text));
    }

    #[test]
    fn line_at_budget_is_rejected() {
        let line = "x".repeat(20);
        let err = chunk_lines(&line, 20).unwrap_err();
        assert!(matches!(
            err,
            FlattexError::Configuration { length: 20, budget: 20 }
        ));
    }

    #[test]
    fn line_just_under_budget_is_accepted() {
        let line = "x".repeat(19);
        assert!(chunk_lines(&line, 20).is_ok());
    }

    #[test]
    fn chunks_stay_under_budget() {
        let text = (0..40).map(|i| format!("line number {i}")).collect::<Vec<_>>().join("\n");
        let budget = 60;
        let chunks = chunk_lines(&text, budget).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() < budget);
        }
    }

    #[test]
    fn bound_paragraph_strips_zero_width_spaces() {
        let bounded = bound_paragraph("a\u{200b}b", 100).unwrap();
        assert_eq!(bounded, "ab");
    }
}
