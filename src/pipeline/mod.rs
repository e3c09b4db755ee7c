//! Extraction pipeline orchestration.
//!
//! Raw LaTeX goes through normalization, document parsing, a scan pass over
//! configured environments and commands (with the recursive extraction
//! transform), paragraph segmentation, concurrent per-paragraph processing,
//! chunk bounding, and reassembly in paragraph order.

pub mod scheduler;
pub mod worker;

use std::fmt::Write as _;
use std::fs;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::cache::{cache_key, RunCache};
use crate::config::Config;
use crate::latex::scanner::{self, CommandSpec};
use crate::latex::{braces, normalize, objects, Document, Masker, PlaceholderToken};
use crate::latex::rules;
use crate::text::{
    bound_paragraph, connect_paragraphs, join_wrapped_lines, split_paragraphs, squeeze_spaces,
    Paragraph,
};

pub use scheduler::process_paragraphs;
pub use worker::{FlattenWorker, ParagraphWorker};

/// Flattens LaTeX source into plain text.
pub struct Flattener {
    config: Config,
    masker: Masker,
    worker: Option<Box<dyn ParagraphWorker + Send + Sync>>,
}

impl Flattener {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            masker: Masker::new(),
            worker: None,
        }
    }

    /// Use an injected per-paragraph transform instead of the default
    /// flattening worker.
    pub fn with_worker(config: Config, worker: Box<dyn ParagraphWorker + Send + Sync>) -> Self {
        Self {
            config,
            masker: Masker::new(),
            worker: Some(worker),
        }
    }

    /// Run the full pipeline over `latex` and return the flattened text.
    pub fn flatten(&self, latex: &str) -> Result<String> {
        let multi_arg = rules::multi_arg_commands();

        let cache = if self.config.no_cache {
            None
        } else {
            Some(RunCache::open(self.config.cache_dir.clone())?)
        };
        let mut run_key = None;
        if let Some(cache) = &cache {
            cache.purge_stale()?;
            let key = cache_key(latex, &self.config, &multi_arg);
            cache.create(&key)?;
            run_key = Some(key);
        }

        let normalized = normalize::normalize(latex);
        let doc = Document::parse(&normalized, self.config.make_complete);
        info!(
            complete = doc.complete,
            theorems = doc.theorems.len(),
            "parsed document"
        );

        let body = if doc.complete {
            doc.body.clone()
        } else {
            connect_paragraphs(&doc.body)
        };

        let scanned = self.scan_all(&body, &doc.theorems)?;
        let prepared = if self.config.keep_command_wrappers {
            scanned
        } else {
            strip_markup(&scanned)
        };

        let (masked, _) = self.masker.mask(&prepared);
        let paragraphs = split_paragraphs(&masked);
        debug!(count = paragraphs.len(), "segmented paragraphs");

        let fallback;
        let worker: &dyn ParagraphWorker = match &self.worker {
            Some(worker) => worker.as_ref(),
            None => {
                fallback = FlattenWorker {
                    masker: &self.masker,
                };
                &fallback
            }
        };
        let results = scheduler::process_paragraphs(&paragraphs, worker, self.config.threads)?;

        let mut bounded = Vec::with_capacity(results.len());
        for result in &results {
            bounded.push(bound_paragraph(result, self.config.char_limit)?);
        }

        if self.config.debug {
            self.write_debug_files(&paragraphs, &bounded, &self.masker.objects())?;
        }

        let joined = bounded.join("\n\n");
        let output = objects::strip_residue(&joined);

        if let (Some(cache), Some(key)) = (&cache, &run_key) {
            cache.complete(key, &output)?;
        }
        Ok(output)
    }

    /// One scan pass over every configured environment (plus discovered
    /// theorem-like names), command and multi-argument command, bare and
    /// starred variants both, driving the recursive extraction transform.
    fn scan_all(&self, text: &str, theorems: &[String]) -> crate::error::Result<String> {
        let transform = |inner: &str| self.extract_transform(inner);

        let mut env_names: Vec<String> =
            rules::ENVIRONMENTS.iter().map(|s| s.to_string()).collect();
        env_names.extend(theorems.iter().cloned());

        let mut current = self.extract_transform(text)?;
        for spec in scanner::env_variants(&env_names) {
            current = scanner::process_environment(&current, &spec, &transform)?;
        }
        for spec in scanner::command_variants(rules::COMMANDS) {
            current = scanner::process_command(&current, &spec, &transform)?;
        }
        for spec in &rules::multi_arg_commands() {
            current = scanner::process_multi_arg_command(&current, spec, &transform)?;
        }
        Ok(current)
    }

    /// The recursive extraction transform: split around structure-only
    /// commands, extract each piece, then descend into leading-level brace
    /// groups with this same transform.
    fn extract_transform(&self, text: &str) -> crate::error::Result<String> {
        let mut cleaned = String::with_capacity(text.len());
        for (piece, sep) in scanner::split_by_command(text) {
            cleaned.push_str(&self.extract_piece(piece));
            if !sep.is_empty() {
                cleaned.push(' ');
                cleaned.push_str(sep);
                cleaned.push(' ');
            }
        }
        braces::process_outer_groups(&cleaned, &|inner| self.extract_transform(inner))
    }

    /// Piece-level extraction: drop pure-formatting wrappers, mask non-text
    /// objects, join hard-wrapped lines, squeeze whitespace.
    fn extract_piece(&self, text: &str) -> String {
        let mut stripped = text.to_string();
        for name in rules::FORMATS {
            for spec in [CommandSpec::new(name, false), CommandSpec::new(name, true)] {
                stripped = scanner::strip_format_command(&stripped, &spec);
            }
        }
        let (masked, _objects) = self.masker.mask(&stripped);
        squeeze_spaces(&join_wrapped_lines(&masked))
    }

    /// Side files for inspection: pre-transform paragraphs, post-transform
    /// paragraphs, and every object masked during the run (scan pass and
    /// worker passes included).
    fn write_debug_files(
        &self,
        paragraphs: &[Paragraph],
        results: &[String],
        objects: &[PlaceholderToken],
    ) -> Result<()> {
        let mut old = String::new();
        for paragraph in paragraphs {
            write!(old, "\n\nParagraph {}\n\n{}", paragraph.index, paragraph.text)?;
        }
        let mut new = String::new();
        for (index, result) in results.iter().enumerate() {
            write!(new, "\n\nParagraph {}\n\n{}", index, result)?;
        }
        fs::write("text_old", old)?;
        fs::write("text_new", new)?;
        fs::write("objs", serde_json::to_string_pretty(objects)?)?;
        Ok(())
    }
}

static ENV_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(?:begin|end)\{[^{}]*\}").unwrap());
static BARE_MACRO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\[a-zA-Z]+\*?").unwrap());

/// Flatten surviving markup after extraction: command wrappers lose their
/// braces (content kept), environment markers and bare macros disappear,
/// and leftover unescaped braces are dropped. Masked spans are already
/// tokens at this point, so none of this touches protected content.
fn strip_markup(text: &str) -> String {
    let mut stripped = text.to_string();
    for name in rules::COMMANDS {
        for spec in [CommandSpec::new(name, false), CommandSpec::new(name, true)] {
            stripped = scanner::strip_format_command(&stripped, &spec);
        }
    }
    let stripped = ENV_MARKER.replace_all(&stripped, "");
    let stripped = BARE_MACRO.replace_all(&stripped, "");

    let mut out = String::with_capacity(stripped.len());
    let mut escaped = false;
    for ch in stripped.chars() {
        if escaped {
            escaped = false;
            out.push(ch);
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '{' | '}' => {}
            _ => out.push(ch),
        }
    }
    out
}

/// Final cleanup applied to the flattened result before it is written:
/// blank-line runs collapse to single newlines, space runs squeeze, edges
/// trim.
pub fn finalize(text: &str) -> String {
    static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n+").unwrap());
    static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());
    let collapsed = BLANK_RUN.replace_all(text, "\n");
    SPACE_RUN.replace_all(&collapsed, " ").trim().to_string()
}
