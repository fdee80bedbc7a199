//! CLI output formatting for all commands.
//!
//! # Output Format
//!
//! ## Make
//!
//! The generated URL alone on one line, so the output can be piped.
//!
//! ## Parse
//!
//! ```text
//! Path: path/to/image.jpg
//! Filters
//!     001 width: 300
//!     002 height: 300
//!     003 rotate: 90
//!     004 negative
//! ```
//!
//! ## Check
//!
//! ```text
//! Pattern
//!     {dirname}/{basename}{filters}.{extension}
//!     Regex: ^(?:(?P<dirname>.*?)/)??...
//!
//! Routes
//! 001 image → /media/{pattern} on https://img.example.com
//!     Regex: ^(?:(?P<dirname>.*?)/)??...
//!
//! Filters
//! 001 small → width=100, height=100, crop
//! 002 watermark → handler watermark
//!
//! Configuration is valid
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::config::UrlConfig;
use crate::filters::{FilterSet, FilterValue};
use crate::types::MatchedPath;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// One filter as `key: value`; flags show the key alone, unset sides `_`.
fn filter_entry(key: &str, value: &FilterValue) -> String {
    match value {
        FilterValue::Bool(true) => key.to_string(),
        FilterValue::Null => format!("{key}: _"),
        other => format!("{key}: {other}"),
    }
}

/// Filters inline, the way alias members are shown: `width=100, crop`.
fn inline_filters(filters: &FilterSet) -> String {
    filters
        .iter()
        .map(|(key, value)| match value {
            FilterValue::Bool(true) => key.clone(),
            FilterValue::Null => format!("{key}=_"),
            other => format!("{key}={other}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Parse
// ============================================================================

pub fn format_parse_output(matched: &MatchedPath) -> Vec<String> {
    let mut lines = vec![format!("Path: {}", matched.path)];
    if matched.filters.is_empty() {
        lines.push("Filters: none".to_string());
        return lines;
    }
    lines.push("Filters".to_string());
    for (i, (key, value)) in matched.filters.iter().enumerate() {
        lines.push(format!(
            "{}{} {}",
            indent(1),
            format_index(i + 1),
            filter_entry(key, value)
        ));
    }
    lines
}

pub fn print_parse_output(matched: &MatchedPath) {
    for line in format_parse_output(matched) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Summary of a validated configuration.
///
/// `default_pattern` is the compiled regex of `[pattern]`; `route_patterns`
/// holds the compiled regex of each route, in declaration order.
pub fn format_check_output(
    config: &UrlConfig,
    default_pattern: &str,
    route_patterns: &[(String, String)],
) -> Vec<String> {
    let mut lines = vec![
        "Pattern".to_string(),
        format!("{}{}", indent(1), config.pattern.format),
        format!("{}Regex: {}", indent(1), default_pattern),
    ];

    if !config.routes.is_empty() {
        lines.push(String::new());
        lines.push("Routes".to_string());
        for (i, (name, route)) in config.routes.iter().enumerate() {
            let target = match &route.domain {
                Some(domain) => format!("{} on {}://{}", route.uri, route.scheme, domain),
                None => route.uri.clone(),
            };
            lines.push(format!("{} {} → {}", format_index(i + 1), name, target));
            if let Some((_, pattern)) = route_patterns.iter().find(|(n, _)| n == name) {
                lines.push(format!("{}Regex: {}", indent(1), pattern));
            }
        }
    }

    let aliases = &config.filters.aliases;
    let handlers = &config.filters.handlers;
    if !aliases.is_empty() || !handlers.is_empty() {
        lines.push(String::new());
        lines.push("Filters".to_string());
        let entries = aliases
            .iter()
            .map(|(name, members)| format!("{} → {}", name, inline_filters(members)))
            .chain(handlers.iter().map(|name| format!("{name} → handler {name}")));
        for (i, entry) in entries.enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), entry));
        }
    }

    lines.push(String::new());
    lines.push("Configuration is valid".to_string());
    lines
}

pub fn print_check_output(
    config: &UrlConfig,
    default_pattern: &str,
    route_patterns: &[(String, String)],
) {
    for line in format_check_output(config, default_pattern, route_patterns) {
        println!("{}", line);
    }
}
