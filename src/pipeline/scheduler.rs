//! Concurrent per-paragraph scheduling.
//!
//! One task per paragraph on a bounded rayon pool. Results are assembled by
//! paragraph index, never by completion order. The first failure fails the
//! batch: tasks already running finish, their results are discarded, and no
//! partial output is emitted.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::debug;

use crate::error::FlattexError;
use crate::pipeline::worker::ParagraphWorker;
use crate::text::Paragraph;

/// Run `worker` over every paragraph. `threads == 0` selects the rayon
/// default pool size.
pub fn process_paragraphs(
    paragraphs: &[Paragraph],
    worker: &dyn ParagraphWorker,
    threads: usize,
) -> Result<Vec<String>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("Failed to build worker pool")?;

    let total = paragraphs.len();
    let progress = AtomicUsize::new(0);

    let results = pool.install(|| {
        paragraphs
            .par_iter()
            .map(|paragraph| {
                let result = worker.process(&paragraph.text).map_err(|err| {
                    FlattexError::Worker {
                        index: paragraph.index,
                        message: err.to_string(),
                        content: paragraph.text.clone(),
                    }
                });
                let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(done, total, "paragraph processed");
                result
            })
            .collect::<std::result::Result<Vec<_>, _>>()
    })?;

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraphs(texts: &[&str]) -> Vec<Paragraph> {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| Paragraph {
                index,
                text: text.to_string(),
            })
            .collect()
    }

    #[test]
    fn output_order_matches_input_order() {
        let input = paragraphs(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let worker = |text: &str| {
            // Stagger completion so later tasks tend to finish first.
            let delay = 8 - text.as_bytes()[0] as u64 % 8;
            std::thread::sleep(std::time::Duration::from_millis(delay));
            Ok(text.to_uppercase())
        };
        let results = process_paragraphs(&input, &worker, 4).unwrap();
        assert_eq!(results, vec!["A", "B", "C", "D", "E", "F", "G", "H"]);
    }

    #[test]
    fn parallel_equals_sequential() {
        let input = paragraphs(&["one", "two", "three", "four", "five"]);
        let worker = |text: &str| Ok(format!("[{}]", text));
        let sequential = process_paragraphs(&input, &worker, 1).unwrap();
        let parallel = process_paragraphs(&input, &worker, 4).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn failure_reports_index_and_content() {
        let input = paragraphs(&["fine", "broken paragraph", "also fine"]);
        let worker = |text: &str| {
            if text.starts_with("broken") {
                anyhow::bail!("worker exploded");
            }
            Ok(text.to_string())
        };
        let err = process_paragraphs(&input, &worker, 2).unwrap_err();
        let worker_err = err.downcast_ref::<FlattexError>().unwrap();
        match worker_err {
            FlattexError::Worker { index, content, .. } => {
                assert_eq!(*index, 1);
                assert_eq!(content, "broken paragraph");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_threads_uses_default_pool() {
        let input = paragraphs(&["x"]);
        let worker = |text: &str| Ok(text.to_string());
        assert_eq!(process_paragraphs(&input, &worker, 0).unwrap(), vec!["x"]);
    }
}
