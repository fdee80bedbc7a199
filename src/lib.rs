//! # Image URL
//!
//! Encode image transformations into URLs, and decode them back.
//!
//! A caller asks for `path/to/image.jpg` resized to 300x300, rotated and
//! inverted; the generator answers with a URL that carries those filters:
//!
//! ```text
//! make   path/to/image.jpg + {width: 300, height: 300, rotate: 90, negative}
//!        → /path/to/image-filters(300x300-rotate(90)-negative).jpg
//!
//! parse  /path/to/image-filters(300x300-rotate(90)-negative).jpg
//!        → path/to/image.jpg + {width: 300, height: 300, rotate: 90, negative: true}
//! ```
//!
//! When that URL is later requested, the server parses it, applies the
//! filters to the original image, and answers with the result. Rendering
//! pixels is not part of this crate.
//!
//! # Architecture: Two Directions, One Template
//!
//! Both directions are driven by the same five settings: the URL `format`,
//! the `filters_format` wrapper, the per-filter `filter_format`, the
//! `filter_separator`, and a regex fragment per placeholder. Generation
//! substitutes values into the format; parsing compiles the format into a
//! single anchored regex. Keeping one source of truth is what makes every
//! generated URL parse back to the path and filters it was built from.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`generator`] | `UrlGenerator`: `make`, `parse`, `pattern`, settings |
//! | [`template`] | Format parsing, regex compilation, compiled-template cache |
//! | [`filters`] | Filter values, the encode/decode codec, alias registry |
//! | [`config`] | `image-url.toml` loading, validation, merging |
//! | [`routes`] | Named routes: URI, domain, per-route pattern overrides |
//! | [`naming`] | Source splitting (host/path) and path decomposition |
//! | [`types`] | `MatchedPath`, the result of parsing |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Named Groups Over Index Arithmetic
//!
//! Every placeholder compiles to a named capture group and the group map is
//! read back from the compiled regex. Configured fragments may contain groups
//! of their own without shifting any placeholder's position.
//!
//! ## Filters Wrapper Is Optional
//!
//! A URL without filters carries no wrapper at all: `/a/b.jpg`, never
//! `/a/b-filters().jpg`. The compiled pattern makes the wrapper optional, so
//! such paths still parse (to an empty filter set).
//!
//! ## Memoized Compilation
//!
//! Compiling is deterministic, so compiled templates are cached by the full
//! effective configuration. Changing a setting changes the key; nothing ever
//! needs invalidating.

pub mod config;
pub mod filters;
pub mod generator;
pub mod naming;
pub mod output;
pub mod routes;
pub mod template;
pub mod types;

pub use generator::{MakeOptions, UrlError, UrlGenerator};

#[cfg(test)]
pub(crate) mod test_helpers;
