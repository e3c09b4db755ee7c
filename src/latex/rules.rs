//! Default scan tables: which environments, commands and formatting
//! wrappers carry natural-language content.
//!
//! These are the built-in rule sets; theorem-like environment names
//! discovered per document are appended to the environment list at run time.

use crate::latex::scanner::MultiArgCommand;

/// Environments whose bodies are translatable text.
pub const ENVIRONMENTS: &[&str] = &[
    "abstract",
    "itemize",
    "enumerate",
    "description",
    "quote",
    "quotation",
    "center",
    "figure",
    "table",
    "proof",
];

/// Single-argument commands whose argument is translatable text.
pub const COMMANDS: &[&str] = &[
    "title",
    "section",
    "subsection",
    "subsubsection",
    "paragraph",
    "caption",
    "footnote",
    "textbf",
    "textit",
    "emph",
    "text",
    "mbox",
];

/// Pure-formatting wrappers deleted before masking, content kept.
pub const FORMATS: &[&str] = &["textup", "textnormal", "textsl", "textrm", "underline"];

/// Multi-argument commands with declared translatable positions.
pub fn multi_arg_commands() -> Vec<MultiArgCommand> {
    vec![MultiArgCommand {
        name: "textcolor".to_string(),
        argc: 2,
        translatable: vec![1],
        starred: false,
    }]
}
