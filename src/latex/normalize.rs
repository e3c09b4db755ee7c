//! Light normalization applied once, before scanning.
//!
//! Strips comments, drops macro definitions and bibliography notes, and
//! substitutes accent macros and special tokens so the extraction path sees
//! plain characters instead of markup.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::latex::braces::matching_close;

/// Accent and ligature macros mapped to their composed characters.
const ACCENTS: &[(&str, &str)] = &[
    (r"\'e", "é"),
    (r"\'E", "É"),
    (r"\`e", "è"),
    (r"\`a", "à"),
    (r"\^e", "ê"),
    (r"\^o", "ô"),
    (r#"\"a"#, "ä"),
    (r#"\"o"#, "ö"),
    (r#"\"u"#, "ü"),
    (r#"\"A"#, "Ä"),
    (r#"\"O"#, "Ö"),
    (r#"\"U"#, "Ü"),
    (r"\ss{}", "ß"),
    (r"\ae{}", "æ"),
    (r"\oe{}", "œ"),
    (r"\c{c}", "ç"),
    (r"\~n", "ñ"),
];

/// Escaped characters and spacing ties mapped to plain text.
const SPECIALS: &[(&str, &str)] = &[
    (r"\&", "&"),
    (r"\%", "%"),
    (r"\#", "#"),
    (r"\_", "_"),
    (r"\ldots", "..."),
    (r"\dots", "..."),
    ("~", " "),
    // After the tie substitution, so the produced tilde survives.
    (r"\textasciitilde{}", "~"),
    ("``", "\""),
    ("''", "\""),
];

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)(^|[^\\])%.*$").unwrap());

static MACRO_DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\(?:re)?newcommand\*?|\\providecommand\*?|\\def\\[a-zA-Z@]+|\\DeclareMathOperator\*?")
        .unwrap()
});

static BIBNOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\\bibnote\{.*?\}|\\bibitem\[[^\]]*\]").unwrap());

/// Strip `%` comments to end of line, keeping escaped `\%`.
pub fn remove_comments(text: &str) -> String {
    COMMENT_RE.replace_all(text, "$1").into_owned()
}

/// Remove `\newcommand`-style macro definitions together with their
/// brace-delimited bodies. Definitions that carry text never contribute to
/// the flattened output.
pub fn remove_macro_definitions(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    while let Some(m) = MACRO_DEF_RE.find(&text[cursor..]) {
        let start = cursor + m.start();
        out.push_str(&text[cursor..start]);
        let mut pos = cursor + m.end();

        // Consume the macro name group, optional [argc] specs, and the body.
        // Trailing text after the last group keeps its own spacing.
        let bytes = text.as_bytes();
        loop {
            let mut probe = pos;
            while bytes.get(probe) == Some(&b' ') {
                probe += 1;
            }
            match bytes.get(probe) {
                Some(&b'{') => match matching_close(text, probe) {
                    Some(close) => pos = close + 1,
                    None => break,
                },
                Some(&b'[') => match text[probe..].find(']') {
                    Some(rel) => pos = probe + rel + 1,
                    None => break,
                },
                _ => break,
            }
        }
        cursor = pos;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Remove bibliography annotations that would leak into the text.
pub fn remove_bibnotes(text: &str) -> String {
    BIBNOTE_RE.replace_all(text, "").into_owned()
}

/// Substitute accent macros with their composed characters.
pub fn replace_accents(text: &str) -> String {
    let mut result = text.to_string();
    for (macro_form, replacement) in ACCENTS {
        result = result.replace(macro_form, replacement);
        // Braced form: \'{e} etc.
        if let Some(rest) = macro_form.strip_prefix('\\') {
            if rest.len() == 2 && !rest.ends_with('}') {
                let braced = format!("\\{}{{{}}}", &rest[..1], &rest[1..]);
                result = result.replace(&braced, replacement);
            }
        }
    }
    result
}

/// Substitute escaped characters and quote ligatures with plain text.
pub fn replace_specials(text: &str) -> String {
    let mut result = text.to_string();
    for (token, replacement) in SPECIALS {
        result = result.replace(token, replacement);
    }
    result
}

/// Collapse runs of three or more newlines down to one blank line.
pub fn collapse_blank_lines(text: &str) -> String {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n+").unwrap());
    RE.replace_all(text, "\n\n").into_owned()
}

/// Full normalization pre-pass, in the order the pipeline applies it.
pub fn normalize(text: &str) -> String {
    let text = remove_comments(text);
    // \mathbf renders fine under \boldsymbol and avoids amsmath pitfalls
    // in the re-composited document.
    let text = text.replace(r"\mathbf", r"\boldsymbol");
    let text = remove_bibnotes(&text);
    let text = remove_macro_definitions(&text);
    let text = replace_accents(&text);
    let text = replace_specials(&text);
    collapse_blank_lines(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_comments_to_end_of_line() {
        assert_eq!(remove_comments("text % a comment\nnext"), "text \nnext");
    }

    #[test]
    fn keeps_escaped_percent() {
        assert_eq!(remove_comments(r"50\% of cases"), r"50\% of cases");
    }

    #[test]
    fn full_line_comment_is_removed() {
        assert_eq!(remove_comments("a\n% gone\nb"), "a\n\nb");
    }

    #[test]
    fn removes_newcommand_with_body() {
        let text = r"\newcommand{\foo}[1]{bar #1} kept";
        assert_eq!(remove_macro_definitions(text), " kept");
    }

    #[test]
    fn removes_def_with_nested_braces() {
        let text = r"\def\x{a {b} c}after";
        assert_eq!(remove_macro_definitions(text), "after");
    }

    #[test]
    fn accents_compose() {
        assert_eq!(replace_accents(r"caf\'e"), "café");
        assert_eq!(replace_accents(r"caf\'{e}"), "café");
    }

    #[test]
    fn specials_become_plain_text() {
        assert_eq!(replace_specials(r"A \& B"), "A & B");
        assert_eq!(replace_specials("Fig.~3"), "Fig. 3");
        assert_eq!(replace_specials(r"home\textasciitilde{}user"), "home~user");
        assert_eq!(replace_specials("``quoted''"), "\"quoted\"");
    }

    #[test]
    fn blank_line_runs_collapse() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn normalize_rewrites_mathbf() {
        assert!(normalize(r"$\mathbf{x}$").contains(r"\boldsymbol{x}"));
    }
}
