//! Document model: complete document vs. fragment, preamble split, and
//! theorem-like environment discovery.

use once_cell::sync::Lazy;
use regex::Regex;

pub const BEGIN_DOCUMENT: &str = r"\begin{document}";
pub const END_DOCUMENT: &str = r"\end{document}";

/// Minimal shell wrapped around fragments when `make_complete` is set.
pub const DEFAULT_BEGIN: &str = "\\documentclass[UTF8]{article}\n\\usepackage{amsmath,amssymb}\n\\begin{document}\n";
pub const DEFAULT_END: &str = "\n\\end{document}\n";

static NEWTHEOREM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\newtheorem\*?\{([^{}]+)\}").unwrap());

/// A parsed source document. The raw text is read once and never mutated;
/// transforms downstream produce new text.
#[derive(Debug, Clone)]
pub struct Document {
    /// Text between the document markers (or the whole input for fragments).
    pub body: String,
    /// Whether the input carried explicit begin/end markers.
    pub complete: bool,
    /// Wrapper kept for re-composition: (everything up to and including
    /// `\begin{document}`, everything from `\end{document}` on).
    pub preamble: Option<(String, String)>,
    /// Theorem-like environment names declared via `\newtheorem`.
    pub theorems: Vec<String>,
}

impl Document {
    /// Split a source text into body and wrapper. Fragments are optionally
    /// wrapped in the minimal default shell.
    pub fn parse(text: &str, make_complete: bool) -> Self {
        let theorems = find_theorems(text);

        if let Some(begin_idx) = text.find(BEGIN_DOCUMENT) {
            let body_start = begin_idx + BEGIN_DOCUMENT.len();
            let (body, tail) = match text[body_start..].find(END_DOCUMENT) {
                Some(rel) => (
                    text[body_start..body_start + rel].to_string(),
                    text[body_start + rel..].to_string(),
                ),
                // Unmatched \begin{document}: best-effort, body runs to EOF.
                None => (text[body_start..].to_string(), String::new()),
            };
            return Self {
                body,
                complete: true,
                preamble: Some((text[..body_start].to_string(), tail)),
                theorems,
            };
        }

        let preamble = make_complete
            .then(|| (DEFAULT_BEGIN.to_string(), DEFAULT_END.to_string()));
        Self {
            body: text.to_string(),
            complete: false,
            preamble,
            theorems,
        }
    }

    /// Rebuild a full document around a replacement body, for downstream
    /// re-composition.
    pub fn recompose(&self, body: &str) -> String {
        match &self.preamble {
            Some((head, tail)) => format!("{}{}{}", head, body, tail),
            None => body.to_string(),
        }
    }
}

fn find_theorems(text: &str) -> Vec<String> {
    NEWTHEOREM_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_document_splits_at_markers() {
        let text = "\\documentclass{article}\n\\begin{document}\nbody text\n\\end{document}\n";
        let doc = Document::parse(text, true);
        assert!(doc.complete);
        assert_eq!(doc.body, "\nbody text\n");
        let (head, tail) = doc.preamble.unwrap();
        assert!(head.ends_with(BEGIN_DOCUMENT));
        assert!(tail.starts_with(END_DOCUMENT));
    }

    #[test]
    fn fragment_gets_default_shell_when_requested() {
        let doc = Document::parse("just a fragment", true);
        assert!(!doc.complete);
        assert_eq!(doc.body, "just a fragment");
        assert_eq!(doc.preamble.as_ref().unwrap().0, DEFAULT_BEGIN);
    }

    #[test]
    fn fragment_without_shell_when_not_requested() {
        let doc = Document::parse("just a fragment", false);
        assert!(doc.preamble.is_none());
        assert_eq!(doc.recompose("x"), "x");
    }

    #[test]
    fn unmatched_begin_document_runs_to_eof() {
        let doc = Document::parse("\\begin{document}\nno end marker", true);
        assert!(doc.complete);
        assert_eq!(doc.body, "\nno end marker");
    }

    #[test]
    fn discovers_theorem_environments() {
        let text = r"\newtheorem{theorem}{Theorem}\newtheorem{lemma}[theorem]{Lemma}";
        let doc = Document::parse(text, true);
        assert_eq!(doc.theorems, vec!["theorem", "lemma"]);
    }

    #[test]
    fn recompose_wraps_body() {
        let text = "pre\\begin{document}old\\end{document}post";
        let doc = Document::parse(text, true);
        assert_eq!(
            doc.recompose("new"),
            "pre\\begin{document}new\\end{document}post"
        );
    }
}
