//! Non-text object masking.
//!
//! Mathematical spans, references, graphics and similar non-translatable
//! constructs are replaced by opaque placeholder tokens so the rest of the
//! pipeline can treat the remaining text as natural language. Masking is
//! bijective: [`restore`] applied to the masked text with the returned token
//! list reproduces the original bytes exactly (assuming the input does not
//! itself contain the `XMATHX` marker prefix).
//!
//! Nested math is one opaque unit: a `$...$` inside an `equation` body is
//! covered by the environment's single token, never masked twice.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Marker prefix shared by all placeholder tokens.
pub const TOKEN_PREFIX: &str = "XMATHX";

/// What a masked span contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    /// Inline or display math, math environments, verbatim spans.
    Math,
    /// Other non-translatable constructs (citations, refs, graphics, urls).
    Object,
    /// Explicit line break (`\\`), stripped as residue after reassembly.
    LineBreak,
    /// Spacing and layout macros, stripped as residue after reassembly.
    Spacing,
}

/// A masked span: unique id, kind, and the exact original content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceholderToken {
    pub id: u64,
    pub kind: TokenKind,
    pub content: String,
}

impl PlaceholderToken {
    /// Surface form substituted into the masked text.
    ///
    /// The id is always followed by a non-digit marker (`X`, `BS` or `SP`),
    /// so a digit adjacent to the token in the surrounding text can never be
    /// read back as part of the id.
    pub fn render(&self) -> String {
        match self.kind {
            TokenKind::Math | TokenKind::Object => format!("{}{}X", TOKEN_PREFIX, self.id),
            TokenKind::LineBreak => format!("{}{}BS", TOKEN_PREFIX, self.id),
            TokenKind::Spacing => format!("{}{}SP", TOKEN_PREFIX, self.id),
        }
    }
}

/// Environments whose whole body is opaque (starred variants included).
const OPAQUE_ENVIRONMENTS: &[&str] = &[
    "equation", "align", "alignat", "gather", "multline", "eqnarray",
    "displaymath", "math", "verbatim", "lstlisting", "tikzpicture",
];

static BEGIN_OPAQUE_ENV: Lazy<Regex> = Lazy::new(|| {
    let names = OPAQUE_ENVIRONMENTS.join("|");
    Regex::new(&format!(r"\\begin\{{({})(\*?)\}}", names)).unwrap()
});

static OBJECT_COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\\(?:cite[pt]?|ref|eqref|autoref|cref|label|url|href|includegraphics|footnotemark)\b\*?(?:\[[^\]]*\])*(?:\{[^{}]*\})*",
    )
    .unwrap()
});

static VERB_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\verb\*?\|[^|\n]*\|").unwrap());

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\\\\*?(?:\[[^\]]*\])?").unwrap());

static SPACING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\\(?:quad|qquad|smallskip|medskip|bigskip|noindent|indent|centering|raggedright|raggedleft|clearpage|newpage|pagebreak|linebreak|hfill|vfill)\b|\\[,;!:]|\\[hv]space\*?\{[^{}]*\}",
    )
    .unwrap()
});

static BRACKET_MATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\\\[.*?\\\]|\\\(.*?\\\)").unwrap());

#[derive(Debug)]
struct Span {
    start: usize,
    end: usize,
    kind: TokenKind,
}

/// Collect `$...$` and `$$...$$` spans with escape awareness.
///
/// An opening delimiter with no closer is left unmasked; the structural
/// degradation is handled downstream.
fn dollar_spans(text: &str, spans: &mut Vec<Span>) {
    let bytes = text.as_bytes();
    let mut delims: Vec<usize> = Vec::new();
    let mut escaped = false;
    for (pos, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '$' => delims.push(pos),
            _ => {}
        }
    }

    let mut i = 0;
    while i < delims.len() {
        let start = delims[i];
        let display = delims.get(i + 1) == Some(&(start + 1));
        if display {
            // $$ ... $$ needs two adjacent closers.
            let mut j = i + 2;
            while j + 1 < delims.len() {
                if delims[j + 1] == delims[j] + 1 {
                    spans.push(Span {
                        start,
                        end: delims[j + 1] + 1,
                        kind: TokenKind::Math,
                    });
                    i = j + 2;
                    break;
                }
                j += 1;
            }
            if i <= j {
                // No closing $$ found.
                break;
            }
        } else if i + 1 < delims.len() {
            spans.push(Span {
                start,
                end: delims[i + 1] + 1,
                kind: TokenKind::Math,
            });
            i += 2;
        } else {
            break;
        }
    }
    debug_assert!(spans.iter().all(|s| s.end <= bytes.len()));
}

/// Collect opaque environment bodies, `\begin` through matching `\end`.
fn environment_spans(text: &str, spans: &mut Vec<Span>) {
    for caps in BEGIN_OPAQUE_ENV.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let name = caps.get(1).unwrap().as_str();
        let star = caps.get(2).unwrap().as_str();
        let closer = format!("\\end{{{}{}}}", name, star);
        if let Some(rel) = text[whole.end()..].find(&closer) {
            spans.push(Span {
                start: whole.start(),
                end: whole.end() + rel + closer.len(),
                kind: TokenKind::Math,
            });
        }
        // An unmatched \begin stays unmasked; the scanner leaves it alone too.
    }
}

fn regex_spans(text: &str, re: &Regex, kind: TokenKind, spans: &mut Vec<Span>) {
    for m in re.find_iter(text) {
        if !m.as_str().is_empty() {
            spans.push(Span {
                start: m.start(),
                end: m.end(),
                kind,
            });
        }
    }
}

/// Masks non-text spans, handing out ids from a counter shared across the
/// whole run so every token is unique even under concurrent masking. Every
/// minted token is also recorded, so the run's full object list can be
/// inspected after the per-call results are gone.
#[derive(Debug, Default)]
pub struct Masker {
    next_id: AtomicU64,
    minted: Mutex<Vec<PlaceholderToken>>,
}

impl Masker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every token minted by this masker so far, in id order.
    pub fn objects(&self) -> Vec<PlaceholderToken> {
        let mut all = self
            .minted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        all.sort_by_key(|token| token.id);
        all
    }

    /// Replace every non-text construct in `text` with a placeholder token.
    ///
    /// Returns the masked text and the extracted tokens in document order.
    pub fn mask(&self, text: &str) -> (String, Vec<PlaceholderToken>) {
        let mut spans = Vec::new();
        environment_spans(text, &mut spans);
        dollar_spans(text, &mut spans);
        regex_spans(text, &BRACKET_MATH, TokenKind::Math, &mut spans);
        regex_spans(text, &OBJECT_COMMAND, TokenKind::Object, &mut spans);
        regex_spans(text, &VERB_SPAN, TokenKind::Math, &mut spans);
        regex_spans(text, &LINE_BREAK, TokenKind::LineBreak, &mut spans);
        regex_spans(text, &SPACING, TokenKind::Spacing, &mut spans);

        // Document order; earlier-starting (and, on ties, longer) spans win.
        // Anything starting inside a kept span is covered by it.
        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut masked = String::with_capacity(text.len());
        let mut tokens = Vec::new();
        let mut cursor = 0usize;
        for span in spans {
            if span.start < cursor {
                continue;
            }
            masked.push_str(&text[cursor..span.start]);
            let token = PlaceholderToken {
                id: self.next_id.fetch_add(1, Ordering::Relaxed),
                kind: span.kind,
                content: text[span.start..span.end].to_string(),
            };
            masked.push_str(&token.render());
            tokens.push(token);
            cursor = span.end;
        }
        masked.push_str(&text[cursor..]);
        self.minted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend(tokens.iter().cloned());
        (masked, tokens)
    }
}

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"XMATHX(\d+)(?:BS|SP|X)").unwrap());

/// Exact inverse of [`Masker::mask`]: substitute every token occurrence with
/// its original content. Tokens whose id is not in `tokens` are left as-is.
pub fn restore(masked: &str, tokens: &[PlaceholderToken]) -> String {
    let by_id: HashMap<u64, &str> = tokens
        .iter()
        .map(|t| (t.id, t.content.as_str()))
        .collect();
    let mut out = String::with_capacity(masked.len());
    let mut cursor = 0usize;
    for caps in TOKEN_RE.captures_iter(masked) {
        let whole = caps.get(0).unwrap();
        let id: u64 = caps[1].parse().unwrap_or(u64::MAX);
        if let Some(content) = by_id.get(&id) {
            out.push_str(&masked[cursor..whole.start()]);
            out.push_str(content);
            cursor = whole.end();
        }
    }
    out.push_str(&masked[cursor..]);
    out
}

static RESIDUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\?XMATHX\d+(?:BS|SP)[\s.,;:!?(){}]*").unwrap());

/// Remove leftover line-break and spacing tokens (plus the punctuation that
/// trailed them) from reassembled output. Math and object tokens stay: they
/// stand in for content the downstream consumer re-composites later.
pub fn strip_residue(text: &str) -> String {
    RESIDUE_RE.replace_all(text, "").into_owned()
}
