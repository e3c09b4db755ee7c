//! The injected per-paragraph transform.

use crate::latex::Masker;
use crate::text::{join_wrapped_lines, squeeze_spaces};

/// Opaque per-paragraph capability: `text -> text`, may fail.
///
/// The scheduler treats implementations as black boxes; a translation
/// backend plugs in here without the pipeline knowing about it.
pub trait ParagraphWorker: Sync {
    fn process(&self, text: &str) -> anyhow::Result<String>;
}

impl<F> ParagraphWorker for F
where
    F: Fn(&str) -> anyhow::Result<String> + Sync,
{
    fn process(&self, text: &str) -> anyhow::Result<String> {
        self(text)
    }
}

/// Default worker: mask any remaining non-text spans, join hard-wrapped
/// lines, squeeze whitespace. Shares the run's masker so placeholder ids
/// stay unique across paragraphs.
pub struct FlattenWorker<'a> {
    pub masker: &'a Masker,
}

impl ParagraphWorker for FlattenWorker<'_> {
    fn process(&self, text: &str) -> anyhow::Result<String> {
        let (masked, _objects) = self.masker.mask(text);
        let joined = join_wrapped_lines(&masked);
        Ok(squeeze_spaces(&joined).trim().to_string())
    }
}
