//! flattex flattens LaTeX sources into translatable plain text.
//!
//! The pipeline inlines cross-file includes, normalizes markup noise, scans
//! configured environments and commands with a brace-depth recursive descent
//! engine, masks non-text objects behind restorable placeholder tokens,
//! segments the result into paragraphs, processes paragraphs concurrently
//! with an injectable worker, bounds each paragraph to a character budget,
//! and reassembles everything in paragraph order.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod files;
pub mod latex;
pub mod pipeline;
pub mod text;

pub use config::Config;
pub use error::FlattexError;
pub use pipeline::{Flattener, ParagraphWorker};
