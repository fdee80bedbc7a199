//! URL generator: the public entry point of the crate.
//!
//! [`UrlGenerator`] ties the pieces together:
//!
//! ```text
//! make:   src + filters ──► split host/path ──► encode filters ──► render format ──► URL
//! parse:  URL path ──► compiled regex ──► decode {filters} ──► original path + filters
//! ```
//!
//! Compiled templates are memoized in a [`TemplateCache`] keyed on the full
//! effective [`TemplateConfig`], so per-call and per-route overrides never
//! interfere with each other. Clones of a generator share the cache.
//!
//! Two filter keys are reserved and never encoded: `route` and `host` are
//! read as call options. `pattern` used to be the third reserved key; it is
//! dropped with a warning, pattern overrides travel in [`MakeOptions`].

use crate::config::{PatternOverrides, RouteConfig, TemplateConfig, UrlConfig};
use crate::filters::{FilterLookup, FilterManager, FilterSet, FilterValue, ParseError};
use crate::naming::{PathParts, SourceHost, split_source};
use crate::routes::{RouteResolver, RouteTable};
use crate::template::{CompiledTemplate, Placeholder, TemplateCache, TemplateError};
use crate::types::MatchedPath;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Filter key naming the route to generate for.
pub const ROUTE_KEY: &str = "route";
/// Filter key carrying an explicit host.
pub const HOST_KEY: &str = "host";
/// Filter key no longer honoured; see the module docs.
pub const PATTERN_KEY: &str = "pattern";

#[derive(Error, Debug)]
pub enum UrlError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl UrlError {
    /// Whether this error means "no such image": a URL whose filters cannot be
    /// decoded should be answered like a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, UrlError::Parse(_))
    }
}

/// Per-call options for [`UrlGenerator::make_with`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MakeOptions {
    /// Route to generate for. Unknown routes fall back to a plain path.
    pub route: Option<String>,
    /// Host for the URL; overrides the route domain and the source host.
    pub host: Option<String>,
    /// Pattern overrides for this call only.
    pub pattern: PatternOverrides,
}

impl MakeOptions {
    pub fn route(name: impl Into<String>) -> Self {
        Self {
            route: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn host(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Default::default()
        }
    }

    pub fn with_pattern(mut self, pattern: PatternOverrides) -> Self {
        self.pattern = pattern;
        self
    }
}

#[derive(Clone)]
pub struct UrlGenerator {
    defaults: TemplateConfig,
    filters: Arc<dyn FilterLookup>,
    routes: Arc<dyn RouteResolver>,
    cache: Arc<TemplateCache>,
}

impl fmt::Debug for UrlGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlGenerator")
            .field("defaults", &self.defaults)
            .field("cache", &self.cache.stats())
            .finish_non_exhaustive()
    }
}

impl Default for UrlGenerator {
    fn default() -> Self {
        Self::new(TemplateConfig::default())
    }
}

impl UrlGenerator {
    /// Generator with no aliases and no routes.
    pub fn new(defaults: TemplateConfig) -> Self {
        Self {
            defaults,
            filters: Arc::new(FilterManager::new()),
            routes: Arc::new(RouteTable::new()),
            cache: Arc::new(TemplateCache::new()),
        }
    }

    /// Generator wired to everything a loaded configuration declares.
    pub fn from_config(config: &UrlConfig) -> Self {
        Self::new(config.pattern.clone())
            .with_filters(config.filter_manager())
            .with_routes(RouteTable::from_config(config))
    }

    pub fn with_filters(mut self, filters: impl FilterLookup + 'static) -> Self {
        self.filters = Arc::new(filters);
        self
    }

    pub fn with_routes(mut self, routes: impl RouteResolver + 'static) -> Self {
        self.routes = Arc::new(routes);
        self
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    // =========================================================================
    // Generation
    // =========================================================================

    /// Build the URL for `src` with `filters` applied.
    ///
    /// Returns `Ok(None)` for an empty source.
    pub fn make(&self, src: &str, filters: &FilterSet) -> Result<Option<String>, UrlError> {
        self.make_with(src, filters, &MakeOptions::default())
    }

    /// Like [`make`](Self::make), with explicit dimensions merged into the
    /// filters. Explicit dimensions win over `width`/`height` filters.
    pub fn make_sized(
        &self,
        src: &str,
        width: Option<u32>,
        height: Option<u32>,
        filters: &FilterSet,
    ) -> Result<Option<String>, UrlError> {
        let filters = filters.clone().sized(width, height);
        self.make(src, &filters)
    }

    pub fn make_with(
        &self,
        src: &str,
        filters: &FilterSet,
        options: &MakeOptions,
    ) -> Result<Option<String>, UrlError> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut filters = filters.clone();
        let mut route_name = options.route.clone();
        let mut host = options.host.clone();
        take_reserved(&mut filters, ROUTE_KEY, &mut route_name);
        take_reserved(&mut filters, HOST_KEY, &mut host);
        if filters.remove(PATTERN_KEY).is_some() {
            warn!(
                "ignoring `{PATTERN_KEY}` filter; pass pattern overrides through MakeOptions"
            );
        }

        let route = route_name.as_deref().and_then(|name| self.lookup_route(name));
        let overrides = match route {
            Some((_, r)) => options.pattern.over(&r.pattern),
            None => options.pattern.clone(),
        };
        let compiled = self.compiled(&overrides)?;

        let source = split_source(src);
        let host = host
            .map(|h| SourceHost::parse(&h))
            .map(|mut h| {
                if h.scheme.is_none() {
                    h.scheme = source.host.as_ref().and_then(|s| s.scheme.clone());
                }
                h
            })
            .or_else(|| {
                route.and_then(|(_, r)| {
                    r.domain.as_ref().map(|domain| {
                        let mut h = SourceHost::parse(domain);
                        if h.scheme.is_none() {
                            h.scheme = Some(r.scheme.clone());
                        }
                        h
                    })
                })
            })
            .or(source.host);

        let parts = PathParts::parse(&source.path);
        let mut values = BTreeMap::new();
        values.insert(
            Placeholder::Host,
            host.as_ref().map(|h| h.authority.clone()).unwrap_or_default(),
        );
        values.insert(Placeholder::Filename, parts.filename());
        values.insert(Placeholder::Dirname, parts.dirname);
        values.insert(Placeholder::Basename, parts.basename);
        values.insert(Placeholder::Extension, parts.extension);
        values.insert(Placeholder::Filters, compiled.codec().encode(&filters));

        let rendered = compiled.template().render(&values);

        if let Some((name, _)) = route {
            if let Some(url) = self.routes.url(name, &rendered, host.as_ref()) {
                return Ok(Some(url));
            }
        }

        if compiled.template().contains(Placeholder::Host) {
            return Ok(Some(rendered));
        }

        let path = rendered.trim_start_matches('/');
        Ok(Some(match host {
            Some(h) => format!("{}/{path}", h.prefix()),
            None => format!("/{path}"),
        }))
    }

    fn lookup_route<'a>(&'a self, name: &'a str) -> Option<(&'a str, &'a RouteConfig)> {
        match self.routes.route(name) {
            Some(route) => Some((name, route)),
            None => {
                warn!(route = name, "unknown route; generating a plain path");
                None
            }
        }
    }

    // =========================================================================
    // Patterns
    // =========================================================================

    /// The regex source recognizing URLs of the default configuration.
    pub fn pattern(&self) -> Result<String, UrlError> {
        self.pattern_with(&PatternOverrides::default())
    }

    pub fn pattern_with(&self, overrides: &PatternOverrides) -> Result<String, UrlError> {
        Ok(self.compiled(overrides)?.pattern().to_string())
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    /// Recover the original path and the filters from a generated URL path.
    ///
    /// Paths that do not follow the format come back unchanged with no
    /// filters. A filters segment holding a malformed token is an error.
    pub fn parse(&self, path: &str) -> Result<MatchedPath, UrlError> {
        self.parse_with(path, &PatternOverrides::default())
    }

    pub fn parse_with(
        &self,
        path: &str,
        overrides: &PatternOverrides,
    ) -> Result<MatchedPath, UrlError> {
        let compiled = self.compiled(overrides)?;
        let trimmed = path.trim_start_matches('/');

        let Some(m) = compiled.captures(trimmed) else {
            debug!(path, "path does not follow the URL format");
            return Ok(MatchedPath::unfiltered(path));
        };
        let (Some(raw), Some(range)) = (m.get(Placeholder::Filters), m.filters_segment()) else {
            return Ok(MatchedPath::unfiltered(trimmed));
        };

        let filters = compiled.codec().decode(raw, self.filters.as_ref())?;

        let head = &trimmed[..range.start];
        let tail = &trimmed[range.end..];
        let tail = if head.is_empty() || head.ends_with('/') {
            tail.strip_prefix('/').unwrap_or(tail)
        } else {
            tail
        };

        Ok(MatchedPath {
            path: format!("{head}{tail}"),
            filters,
        })
    }

    fn compiled(&self, overrides: &PatternOverrides) -> Result<Arc<CompiledTemplate>, UrlError> {
        if overrides.is_empty() {
            return Ok(self.cache.get_or_compile(&self.defaults)?);
        }
        let config = self.defaults.with_overrides(overrides);
        Ok(self.cache.get_or_compile(&config)?)
    }

    // =========================================================================
    // Settings
    //
    // Setters store values as given; settings that fail
    // `TemplateConfig::validate` surface as `UrlError::Template` from the
    // next `make`, `pattern` or `parse`.
    // =========================================================================

    pub fn defaults(&self) -> &TemplateConfig {
        &self.defaults
    }

    pub fn format(&self) -> &str {
        &self.defaults.format
    }

    pub fn set_format(&mut self, format: impl Into<String>) {
        self.defaults.format = format.into();
    }

    pub fn filters_format(&self) -> &str {
        &self.defaults.filters_format
    }

    pub fn set_filters_format(&mut self, filters_format: impl Into<String>) {
        self.defaults.filters_format = filters_format.into();
    }

    pub fn filter_format(&self) -> &str {
        &self.defaults.filter_format
    }

    pub fn set_filter_format(&mut self, filter_format: impl Into<String>) {
        self.defaults.filter_format = filter_format.into();
    }

    pub fn filter_separator(&self) -> &str {
        &self.defaults.filter_separator
    }

    pub fn set_filter_separator(&mut self, separator: impl Into<String>) {
        self.defaults.filter_separator = separator.into();
    }

    pub fn placeholder_patterns(&self) -> &BTreeMap<Placeholder, String> {
        &self.defaults.placeholders
    }

    /// Replace the regex fragment of one placeholder.
    pub fn set_placeholder_pattern(&mut self, placeholder: Placeholder, pattern: impl Into<String>) {
        self.defaults.placeholders.insert(placeholder, pattern.into());
    }

    /// Replace all placeholder fragments.
    pub fn set_placeholder_patterns(&mut self, patterns: BTreeMap<Placeholder, String>) {
        self.defaults.placeholders = patterns;
    }
}

/// Move a reserved text filter into `slot` unless the caller already set it.
fn take_reserved(filters: &mut FilterSet, key: &str, slot: &mut Option<String>) {
    match filters.remove(key) {
        None => {}
        Some(FilterValue::Text(value)) => {
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        Some(other) => warn!(key, value = %other, "ignoring non-text reserved filter"),
    }
}
