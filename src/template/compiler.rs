//! Template Compiler.
//!
//! Turns a [`TemplateConfig`] into a [`CompiledTemplate`]: one anchored,
//! case-insensitive regex that recognizes URLs built from the format, plus a
//! placeholder → capture-group index map.
//!
//! ```text
//! format           {dirname}/{basename}{filters}.{extension}
//! filters_format   -filters({filter})
//!
//! pattern          ^(?:(?P<dirname>.*?)/)??(?P<basename>[^/.]+?)
//!                   (?P<filters_segment>\-filters\((?P<filters>.*?)\))?
//!                   \.(?P<extension>[^./]+)$
//! ```
//!
//! Every placeholder gets a named group, so placeholder fragments from the
//! configuration may carry capturing groups of their own without shifting
//! anyone's index. The index map is read back from the compiled regex rather
//! than computed by hand.
//!
//! Rules applied while compiling:
//!
//! - Literal text is escaped.
//! - `{filters}` is derived from `filters_format` (never from the configured
//!   placeholder patterns) and is optional as a whole: a URL may carry no
//!   filters at all. The `filters` group holds the inner, unwrapped text;
//!   `filters_segment` holds the whole wrapper and is used to strip it.
//! - `{dirname}` directly followed by `/` compiles as one lazily optional
//!   unit, so a path with no directory still matches and a leading segment
//!   is only taken as a directory when nothing else fits. The same goes for `{filters}`
//!   sitting between two slashes, mirroring how rendering collapses the
//!   doubled `/` left by an empty value.
//! - A placeholder repeated in the format captures on its first occurrence
//!   only; later occurrences match the same fragment without capturing.

use super::placeholder::Placeholder;
use super::tokens::{Piece, split_tokens};
use crate::config::{ConfigError, TemplateConfig};
use crate::filters::FilterCodec;
use regex::{Captures, Regex, RegexBuilder};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use thiserror::Error;

/// Group spanning the complete filters wrapper (`-filters(...)`).
pub const FILTERS_SEGMENT_GROUP: &str = "filters_segment";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("invalid template settings: {0}")]
    Settings(String),
    #[error("invalid URL pattern {pattern:?}: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// One parsed piece of a format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// A format string split into literals and placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(format: &str) -> Self {
        let segments = split_tokens(format, &Placeholder::NAMES)
            .into_iter()
            .map(|piece| match piece {
                Piece::Literal(text) => Segment::Literal(text.to_string()),
                Piece::Token(name) => match Placeholder::from_name(name) {
                    Some(p) => Segment::Placeholder(p),
                    None => Segment::Literal(format!("{{{name}}}")),
                },
            })
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn contains(&self, placeholder: Placeholder) -> bool {
        self.segments
            .iter()
            .any(|s| *s == Segment::Placeholder(placeholder))
    }

    /// Distinct placeholders, in order of first occurrence.
    pub fn placeholders(&self) -> Vec<Placeholder> {
        let mut seen = Vec::new();
        for segment in &self.segments {
            match segment {
                Segment::Placeholder(p) if !seen.contains(p) => seen.push(*p),
                _ => {}
            }
        }
        seen
    }

    /// Substitute placeholder values. Missing placeholders render empty.
    ///
    /// A `/` at the start of a piece is dropped when the output already ends
    /// with `/`, so empty values never leave `//` behind.
    pub fn render(&self, values: &BTreeMap<Placeholder, String>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            let piece = match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Placeholder(p) => values.get(p).map_or("", String::as_str),
            };
            match piece.strip_prefix('/') {
                Some(rest) if out.ends_with('/') => out.push_str(rest),
                _ => out.push_str(piece),
            }
        }
        out
    }
}

/// Immutable result of compiling a [`TemplateConfig`].
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    template: Template,
    pattern: String,
    regex: Regex,
    groups: Vec<(Placeholder, usize)>,
    filters_segment: Option<usize>,
    codec: FilterCodec,
}

impl CompiledTemplate {
    /// Compile `config`, rejecting settings that would generate URLs the
    /// compiled pattern cannot decode (see [`TemplateConfig::validate`]).
    pub fn compile(config: &TemplateConfig) -> Result<Self, TemplateError> {
        config.validate().map_err(|e| match e {
            ConfigError::Validation(msg) => TemplateError::Settings(msg),
            other => TemplateError::Settings(other.to_string()),
        })?;
        let template = Template::parse(&config.format);
        let pattern = format!("^{}$", pattern_body(&template, config));

        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| TemplateError::Regex {
                pattern: pattern.clone(),
                source,
            })?;

        let present = template.placeholders();
        let mut groups = Vec::new();
        let mut filters_segment = None;
        for (index, name) in regex.capture_names().enumerate() {
            let Some(name) = name else {
                continue;
            };
            if name == FILTERS_SEGMENT_GROUP && present.contains(&Placeholder::Filters) {
                filters_segment = Some(index);
                continue;
            }
            match Placeholder::from_name(name) {
                Some(p) if present.contains(&p) => groups.push((p, index)),
                _ => {}
            }
        }

        let codec = FilterCodec::new(
            &config.filters_format,
            &config.filter_format,
            &config.filter_separator,
        )
        .map_err(|source| TemplateError::Regex {
            pattern: config.filter_format.clone(),
            source,
        })?;

        tracing::debug!(format = %config.format, %pattern, "compiled URL template");

        Ok(Self {
            template,
            pattern,
            regex,
            groups,
            filters_segment,
            codec,
        })
    }

    /// The anchored pattern, without the case-insensitivity flag.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn codec(&self) -> &FilterCodec {
        &self.codec
    }

    /// Placeholder → 1-based capture index, in template order.
    pub fn groups(&self) -> &[(Placeholder, usize)] {
        &self.groups
    }

    pub fn group_index(&self, placeholder: Placeholder) -> Option<usize> {
        self.groups
            .iter()
            .find(|(p, _)| *p == placeholder)
            .map(|(_, index)| *index)
    }

    /// Match `path` against the compiled pattern.
    pub fn captures<'t, 'h>(&'t self, path: &'h str) -> Option<TemplateMatch<'t, 'h>> {
        self.regex.captures(path).map(|captures| TemplateMatch {
            compiled: self,
            captures,
        })
    }
}

/// A successful match, addressable by placeholder.
#[derive(Debug)]
pub struct TemplateMatch<'t, 'h> {
    compiled: &'t CompiledTemplate,
    captures: Captures<'h>,
}

impl<'h> TemplateMatch<'_, 'h> {
    /// Text captured for `placeholder`, if it took part in the match.
    pub fn get(&self, placeholder: Placeholder) -> Option<&'h str> {
        let index = self.compiled.group_index(placeholder)?;
        self.captures.get(index).map(|m| m.as_str())
    }

    /// Byte range of the whole filters wrapper within the matched text.
    pub fn filters_segment(&self) -> Option<Range<usize>> {
        let index = self.compiled.filters_segment?;
        self.captures.get(index).map(|m| m.range())
    }
}

fn pattern_body(template: &Template, config: &TemplateConfig) -> String {
    let mut body = String::new();
    let mut captured = BTreeSet::new();
    let mut skip_slash = false;
    let mut after_slash = false;
    let mut segments = template.segments().iter().peekable();

    while let Some(segment) = segments.next() {
        let slash_follows = matches!(
            segments.peek(),
            Some(Segment::Literal(next)) if next.starts_with('/')
        );
        match segment {
            Segment::Literal(text) => {
                let text = match text.strip_prefix('/') {
                    Some(rest) if skip_slash => rest,
                    _ => text.as_str(),
                };
                skip_slash = false;
                if !text.is_empty() {
                    after_slash = text.ends_with('/');
                }
                body.push_str(&regex::escape(text));
            }
            Segment::Placeholder(Placeholder::Filters) => {
                let capture = captured.insert(Placeholder::Filters);
                let fragment = filters_fragment(&config.filters_format, capture);
                if after_slash && slash_follows {
                    body.push_str(&format!("(?:{fragment}/)?"));
                    skip_slash = true;
                } else {
                    body.push_str(&format!("{fragment}?"));
                    after_slash = false;
                }
            }
            Segment::Placeholder(p) => {
                let fragment = config.placeholder_pattern(*p);
                let group = if captured.insert(*p) {
                    format!("(?P<{p}>{fragment})")
                } else {
                    format!("(?:{fragment})")
                };
                if *p == Placeholder::Dirname && slash_follows {
                    body.push_str(&format!("(?:{group}/)??"));
                    skip_slash = true;
                    after_slash = true;
                } else {
                    body.push_str(&group);
                    after_slash = false;
                }
            }
        }
    }
    body
}

/// Regex group for the `{filters}` placeholder, without the optional marker.
fn filters_fragment(filters_format: &str, capture: bool) -> String {
    let mut inner = String::new();
    let mut seen = false;
    for piece in split_tokens(filters_format, &["filter"]) {
        match piece {
            Piece::Literal(text) => inner.push_str(&regex::escape(text)),
            Piece::Token(_) if capture && !seen => {
                seen = true;
                inner.push_str("(?P<filters>.*?)");
            }
            Piece::Token(_) => inner.push_str(".*?"),
        }
    }
    if capture {
        format!("(?P<{FILTERS_SEGMENT_GROUP}>{inner})")
    } else {
        format!("(?:{inner})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::custom_template_config;

    fn values(pairs: &[(Placeholder, &str)]) -> BTreeMap<Placeholder, String> {
        pairs.iter().map(|(p, v)| (*p, v.to_string())).collect()
    }

    // =========================================================================
    // Template parsing and rendering
    // =========================================================================

    #[test]
    fn parse_default_format() {
        let t = Template::parse("{dirname}/{basename}{filters}.{extension}");
        assert_eq!(
            t.placeholders(),
            vec![
                Placeholder::Dirname,
                Placeholder::Basename,
                Placeholder::Filters,
                Placeholder::Extension,
            ]
        );
    }

    #[test]
    fn parse_keeps_unknown_tokens_literal() {
        let t = Template::parse("{size}/{basename}");
        assert_eq!(t.segments()[0], Segment::Literal("{size}/".into()));
    }

    #[test]
    fn render_substitutes_and_collapses_slashes() {
        let t = Template::parse("{dirname}/{filters}/{basename}.{extension}");
        let v = values(&[
            (Placeholder::Dirname, "uploads"),
            (Placeholder::Basename, "image"),
            (Placeholder::Extension, "jpg"),
        ]);
        assert_eq!(t.render(&v), "uploads/image.jpg");
    }

    #[test]
    fn render_missing_values_are_empty() {
        let t = Template::parse("{dirname}/{basename}.{extension}");
        let v = values(&[(Placeholder::Basename, "a"), (Placeholder::Extension, "png")]);
        assert_eq!(t.render(&v), "/a.png");
    }

    // =========================================================================
    // Compilation
    // =========================================================================

    #[test]
    fn default_pattern_shape() {
        let compiled = CompiledTemplate::compile(&TemplateConfig::default()).unwrap();
        assert_eq!(
            compiled.pattern(),
            r"^(?:(?P<dirname>.*?)/)??(?P<basename>[^/.]+?)(?P<filters_segment>\-filters\((?P<filters>.*?)\))?\.(?P<extension>[^./]+)$"
        );
    }

    #[test]
    fn group_indexes_follow_template_order() {
        let compiled = CompiledTemplate::compile(&TemplateConfig::default()).unwrap();
        assert_eq!(
            compiled.groups(),
            &[
                (Placeholder::Dirname, 1),
                (Placeholder::Basename, 2),
                (Placeholder::Filters, 4),
                (Placeholder::Extension, 5),
            ]
        );
    }

    #[test]
    fn placeholders_absent_from_format_have_no_group() {
        let compiled = CompiledTemplate::compile(&TemplateConfig::default()).unwrap();
        assert_eq!(compiled.group_index(Placeholder::Host), None);
        assert_eq!(compiled.group_index(Placeholder::Filename), None);
    }

    #[test]
    fn capturing_groups_in_fragments_do_not_shift_indexes() {
        let mut config = TemplateConfig::default();
        config
            .placeholders
            .insert(Placeholder::Extension, "(jpe?g|png)".into());
        config
            .placeholders
            .insert(Placeholder::Dirname, "(.*?)".into());
        let compiled = CompiledTemplate::compile(&config).unwrap();
        let m = compiled
            .captures("a/b/pic-filters(rotate(90)).png")
            .unwrap();
        assert_eq!(m.get(Placeholder::Dirname), Some("a/b"));
        assert_eq!(m.get(Placeholder::Basename), Some("pic"));
        assert_eq!(m.get(Placeholder::Filters), Some("rotate(90)"));
        assert_eq!(m.get(Placeholder::Extension), Some("png"));
    }

    #[test]
    fn whitespace_inside_tokens() {
        let mut config = TemplateConfig::default();
        config.format = "{ dirname }/{basename}{  filters }.{extension }".into();
        let compiled = CompiledTemplate::compile(&config).unwrap();
        let m = compiled.captures("x/y-filters(negative).jpg").unwrap();
        assert_eq!(m.get(Placeholder::Filters), Some("negative"));
        assert_eq!(m.get(Placeholder::Extension), Some("jpg"));
    }

    #[test]
    fn match_without_dirname() {
        let compiled = CompiledTemplate::compile(&TemplateConfig::default()).unwrap();
        let m = compiled.captures("image.jpg").unwrap();
        assert_eq!(m.get(Placeholder::Dirname), None);
        assert_eq!(m.get(Placeholder::Basename), Some("image"));
        assert!(m.filters_segment().is_none());
    }

    #[test]
    fn filters_segment_spans_wrapper() {
        let compiled = CompiledTemplate::compile(&TemplateConfig::default()).unwrap();
        let path = "a/image-filters(negative).jpg";
        let m = compiled.captures(path).unwrap();
        let range = m.filters_segment().unwrap();
        assert_eq!(&path[range], "-filters(negative)");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let compiled = CompiledTemplate::compile(&TemplateConfig::default()).unwrap();
        let m = compiled.captures("a/image-FILTERS(negative).JPG").unwrap();
        assert_eq!(m.get(Placeholder::Filters), Some("negative"));
    }

    #[test]
    fn custom_template_matches() {
        let compiled = CompiledTemplate::compile(&custom_template_config()).unwrap();
        let m = compiled
            .captures("uploads/image/300x300/rotate-90/negative/image.jpg")
            .unwrap();
        assert_eq!(m.get(Placeholder::Dirname), Some("uploads"));
        assert_eq!(
            m.get(Placeholder::Filters),
            Some("300x300/rotate-90/negative")
        );
        assert_eq!(m.get(Placeholder::Basename), Some("image"));
    }

    #[test]
    fn custom_template_matches_without_filters() {
        let compiled = CompiledTemplate::compile(&custom_template_config()).unwrap();
        let m = compiled.captures("uploads/image.jpg").unwrap();
        assert_eq!(m.get(Placeholder::Dirname), Some("uploads"));
        assert_eq!(m.get(Placeholder::Basename), Some("image"));
        assert!(m.filters_segment().is_none());
    }

    #[test]
    fn custom_template_root_file_with_filters() {
        let compiled = CompiledTemplate::compile(&custom_template_config()).unwrap();
        let m = compiled.captures("image/negative/cat.png").unwrap();
        assert_eq!(m.get(Placeholder::Dirname), None);
        assert_eq!(m.get(Placeholder::Filters), Some("negative"));
        assert_eq!(m.get(Placeholder::Basename), Some("cat"));
    }

    #[test]
    fn custom_template_pattern_shape() {
        let compiled = CompiledTemplate::compile(&custom_template_config()).unwrap();
        assert_eq!(
            compiled.pattern(),
            r"^(?:(?P<dirname>.*?)/)??(?:(?P<filters_segment>image/(?P<filters>.*?))/)?(?P<basename>[^/.]+?)\.(?P<extension>[^./]+)$"
        );
    }

    #[test]
    fn repeated_placeholder_captures_first_occurrence() {
        let mut config = TemplateConfig::default();
        config.format = "{dirname}/{basename}/{basename}{filters}.{extension}".into();
        let compiled = CompiledTemplate::compile(&config).unwrap();
        let m = compiled.captures("d/a/b.jpg").unwrap();
        assert_eq!(m.get(Placeholder::Basename), Some("a"));
    }

    #[test]
    fn format_without_filters_has_no_filters_group() {
        let mut config = TemplateConfig::default();
        config.format = "{dirname}/{basename}.{extension}".into();
        let compiled = CompiledTemplate::compile(&config).unwrap();
        assert_eq!(compiled.group_index(Placeholder::Filters), None);
        let m = compiled.captures("a/b.jpg").unwrap();
        assert!(m.filters_segment().is_none());
    }

    #[test]
    fn invalid_fragment_is_an_error() {
        let mut config = TemplateConfig::default();
        config
            .placeholders
            .insert(Placeholder::Basename, "([unclosed".into());
        let err = CompiledTemplate::compile(&config).unwrap_err();
        assert!(err.to_string().contains("invalid URL pattern"));
    }

    #[test]
    fn reserved_group_name_in_fragment_is_an_error() {
        let mut config = TemplateConfig::default();
        config
            .placeholders
            .insert(Placeholder::Dirname, "(?P<filters_segment>.*?)".into());
        assert!(CompiledTemplate::compile(&config).is_err());
    }

    #[test]
    fn empty_separator_is_rejected() {
        let mut config = TemplateConfig::default();
        config.filter_separator = String::new();
        let err = CompiledTemplate::compile(&config).unwrap_err();
        assert!(matches!(err, TemplateError::Settings(_)));
        assert!(err.to_string().contains("filter_separator"));
    }

    #[test]
    fn filters_format_without_filter_token_is_rejected() {
        let mut config = TemplateConfig::default();
        config.filters_format = "-filters".into();
        assert!(matches!(
            CompiledTemplate::compile(&config),
            Err(TemplateError::Settings(_))
        ));
    }

    #[test]
    fn compilation_is_deterministic() {
        let a = CompiledTemplate::compile(&custom_template_config()).unwrap();
        let b = CompiledTemplate::compile(&custom_template_config()).unwrap();
        assert_eq!(a.pattern(), b.pattern());
        assert_eq!(a.groups(), b.groups());
    }
}
