//! `{name}` token scanning shared by every format string in the crate.

/// One piece of a format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'a> {
    /// Literal text, copied through as-is.
    Literal(&'a str),
    /// A recognized token, by (trimmed) name.
    Token(&'a str),
}

/// Split `text` into literals and `{name}` tokens.
///
/// Only names listed in `names` are tokens; any other `{...}` stays literal.
/// Whitespace inside the braces is ignored, so `{ filter }` and `{filter}`
/// are the same token.
///
/// ```
/// # use image_url::template::{Piece, split_tokens};
/// let pieces = split_tokens("-f({ filter })", &["filter"]);
/// assert_eq!(pieces, vec![Piece::Literal("-f("), Piece::Token("filter"), Piece::Literal(")")]);
/// ```
pub fn split_tokens<'a>(text: &'a str, names: &[&str]) -> Vec<Piece<'a>> {
    let mut pieces = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find('{') {
        let open = cursor + offset;
        let Some(len) = text[open..].find('}') else {
            break;
        };
        let close = open + len;
        let name = text[open + 1..close].trim();
        if names.iter().any(|n| *n == name) {
            if literal_start < open {
                pieces.push(Piece::Literal(&text[literal_start..open]));
            }
            pieces.push(Piece::Token(name));
            literal_start = close + 1;
            cursor = close + 1;
        } else {
            cursor = open + 1;
        }
    }

    if literal_start < text.len() {
        pieces.push(Piece::Literal(&text[literal_start..]));
    }
    pieces
}

/// Number of times `name` occurs as a token in `text`.
pub fn count_tokens(text: &str, name: &str) -> usize {
    split_tokens(text, &[name])
        .iter()
        .filter(|p| matches!(p, Piece::Token(_)))
        .count()
}
