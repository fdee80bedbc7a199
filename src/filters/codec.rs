//! Filter Codec: [`FilterSet`] ⇄ the text of the `{filters}` placeholder.
//!
//! ## Encoding
//!
//! ```text
//! {width: 300, height: 300, rotate: 90, negative: true}
//!   → tokens   ["300x300", "rotate(90)", "negative"]
//!   → joined   "300x300-rotate(90)-negative"
//!   → wrapped  "-filters(300x300-rotate(90)-negative)"
//! ```
//!
//! Token rules, in order:
//!
//! 1. `width` / `height` become one leading `WxH` size token, `_` standing in
//!    for a missing (or null) side.
//! 2. Numeric keys are positional: the value itself is the token.
//! 3. `true` and null values are flags: the key alone is the token.
//! 4. `false` values are disabled filters and produce no token.
//! 5. Everything else goes through `filter_format` (`{key}({value})`), lists
//!    joined with `,`.
//!
//! An empty token list encodes to the empty string: the `filters_format`
//! wrapper is only applied when there is something to wrap.
//!
//! ## Decoding
//!
//! The inverse takes the *inner* text (what `{filter}` stood for), splits on
//! the separator and reads each token as a size token, a bare flag, or a
//! `filter_format` key/value pair. Keys registered as aliases expand to their
//! members. A token matching none of these shapes is a [`ParseError`].

use super::registry::{FilterDefinition, FilterLookup};
use super::value::{FilterSet, FilterValue, HEIGHT, WIDTH};
use crate::template::{Piece, split_tokens};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid filter pattern: {0:?}")]
    InvalidFilter(String),
}

/// `300x200`, `300x_`, `_x200`; the `x` is read case-insensitively like the
/// rest of the URL.
static SIZE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+|_)x(\d+|_)$").expect("size token regex"));

static FLAG_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+$").expect("flag token regex"));

/// Value fragment allowed inside a key/value token.
const VALUE_FRAGMENT: &str = r"[0-9A-Za-z,.]+";

/// Encoder/decoder for one `(filters_format, filter_format, separator)` triple.
#[derive(Debug, Clone)]
pub struct FilterCodec {
    filters_format: String,
    filter_format: String,
    separator: String,
    token_pattern: Regex,
}

impl FilterCodec {
    pub fn new(
        filters_format: &str,
        filter_format: &str,
        separator: &str,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            filters_format: filters_format.to_string(),
            filter_format: filter_format.to_string(),
            separator: separator.to_string(),
            token_pattern: key_value_pattern(filter_format)?,
        })
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Flat token list for `filters`, size token first.
    pub fn tokens(&self, filters: &FilterSet) -> Vec<String> {
        let mut tokens = Vec::with_capacity(filters.len());

        let width = filters.width();
        let height = filters.height();
        if width.is_some() || height.is_some() {
            tokens.push(format!("{}x{}", size_side(width), size_side(height)));
        }

        for (key, value) in filters {
            if key == WIDTH || key == HEIGHT {
                continue;
            }
            if is_positional(key) {
                tokens.push(value.to_string());
                continue;
            }
            match value {
                FilterValue::Bool(true) | FilterValue::Null => tokens.push(key.clone()),
                FilterValue::Bool(false) => {}
                other => tokens.push(self.format_token(key, other)),
            }
        }

        tokens
    }

    /// Joined, unwrapped token string (`300x300-rotate(90)`).
    pub fn join(&self, filters: &FilterSet) -> String {
        self.tokens(filters).join(&self.separator)
    }

    /// Full `{filters}` placeholder value, or `""` when there are no tokens.
    pub fn encode(&self, filters: &FilterSet) -> String {
        let joined = self.join(filters);
        if joined.is_empty() {
            String::new()
        } else {
            self.wrap(&joined)
        }
    }

    /// Apply `filters_format` around an already joined token string.
    pub fn wrap(&self, joined: &str) -> String {
        split_tokens(&self.filters_format, &["filter"])
            .into_iter()
            .map(|piece| match piece {
                Piece::Literal(text) => text,
                Piece::Token(_) => joined,
            })
            .collect()
    }

    /// Decode the inner filters text back into a [`FilterSet`].
    pub fn decode(&self, raw: &str, lookup: &dyn FilterLookup) -> Result<FilterSet, ParseError> {
        let mut filters = FilterSet::new();

        for token in raw.split(self.separator.as_str()) {
            if token.is_empty() {
                continue;
            }

            if let Some(caps) = SIZE_TOKEN.captures(token) {
                filters.insert(WIDTH, parse_size_side(&caps[1]));
                filters.insert(HEIGHT, parse_size_side(&caps[2]));
                continue;
            }

            let (key, value) = if FLAG_TOKEN.is_match(token) {
                (token, FilterValue::Bool(true))
            } else if let Some(caps) = self.token_pattern.captures(token) {
                let key = caps.name("key").map_or("", |m| m.as_str());
                let value = caps.name("value").map_or("", |m| m.as_str());
                (key, FilterValue::from_list_token(value))
            } else {
                return Err(ParseError::InvalidFilter(token.to_string()));
            };

            match lookup.get(key) {
                Some(FilterDefinition::Alias(members)) => filters.extend(members),
                _ => filters.insert(key, value),
            }
        }

        Ok(filters)
    }

    fn format_token(&self, key: &str, value: &FilterValue) -> String {
        let value = value.to_string();
        split_tokens(&self.filter_format, &["key", "value"])
            .into_iter()
            .map(|piece| match piece {
                Piece::Literal(text) => text,
                Piece::Token("key") => key,
                Piece::Token(_) => value.as_str(),
            })
            .collect()
    }
}

/// Anchored regex for one key/value token, derived from `filter_format`.
fn key_value_pattern(filter_format: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::from("^");
    let mut seen_key = false;
    let mut seen_value = false;
    for piece in split_tokens(filter_format, &["key", "value"]) {
        match piece {
            Piece::Literal(text) => pattern.push_str(&regex::escape(text)),
            Piece::Token("key") if !seen_key => {
                seen_key = true;
                pattern.push_str(r"(?P<key>\w+)");
            }
            Piece::Token("key") => pattern.push_str(r"\w+"),
            Piece::Token(_) if !seen_value => {
                seen_value = true;
                pattern.push_str(&format!("(?P<value>{VALUE_FRAGMENT})"));
            }
            Piece::Token(_) => pattern.push_str(VALUE_FRAGMENT),
        }
    }
    pattern.push('$');
    Regex::new(&pattern)
}

fn is_positional(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

fn size_side(value: Option<&FilterValue>) -> String {
    match value {
        None | Some(FilterValue::Null) => "_".to_string(),
        Some(v) => v.to_string(),
    }
}

fn parse_size_side(raw: &str) -> FilterValue {
    if raw == "_" {
        FilterValue::Null
    } else {
        FilterValue::from_token(raw)
    }
}
