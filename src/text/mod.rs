//! Plain-text shaping: paragraph segmentation, line joining, chunking.

pub mod chunk;
pub mod segment;

pub use chunk::{bound_paragraph, chunk_lines};
pub use segment::{
    connect_paragraphs, join_wrapped_lines, split_paragraphs, squeeze_spaces, Paragraph,
};
