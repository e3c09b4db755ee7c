//! LaTeX structural machinery: brace groups, object masking, environment
//! and command scanning, normalization, and the document model.

pub mod braces;
pub mod document;
pub mod normalize;
pub mod objects;
pub mod rules;
pub mod scanner;

pub use braces::{find_groups, process_outer_groups, Group, Transform};
pub use document::Document;
pub use objects::{restore, Masker, PlaceholderToken, TokenKind};
pub use scanner::{CommandSpec, EnvSpec, MultiArgCommand};
