//! URL configuration module.
//!
//! One optional `image-url.toml` is laid over the stock settings and
//! validated. Routes may override the URL pattern again, and a single call
//! may override it once more.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [pattern]
//! format = "{dirname}/{basename}{filters}.{extension}"
//! filters_format = "-filters({filter})"
//! filter_format = "{key}({value})"
//! filter_separator = "-"
//!
//! [pattern.placeholders]
//! host = ".*?"
//! dirname = ".*?"
//! basename = "[^/.]+?"
//! filename = "[^/]+?"
//! extension = "[^./]+"
//!
//! [filters]
//! handlers = []              # Filters run by custom handlers
//!
//! [filters.aliases.small]    # `small` expands to these filters
//! width = 100
//! height = 100
//! crop = true
//!
//! [routes.image]
//! uri = "/{pattern}"         # `{pattern}` receives the generated path
//! domain = "img.example.com" # Optional
//! scheme = "https"
//!
//! [routes.image.pattern]     # Sparse overrides for this route
//! filters_format = "-image({filter})"
//! ```
//!
//! ## Precedence
//!
//! ```text
//! stock defaults  <  image-url.toml  <  [routes.NAME.pattern]  <  per-call overrides
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::filters::{FilterManager, FilterSet};
use crate::template::{Placeholder, count_tokens};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the configuration file looked up in a config directory.
pub const CONFIG_FILENAME: &str = "image-url.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full configuration loaded from `image-url.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UrlConfig {
    /// Default URL pattern.
    pub pattern: TemplateConfig,
    /// Filter aliases and handler names.
    pub filters: FiltersConfig,
    /// Named routes, each with its own URI and pattern overrides.
    pub routes: IndexMap<String, RouteConfig>,
}

impl UrlConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pattern.validate()?;
        for (name, route) in &self.routes {
            if count_tokens(&route.uri, "pattern") == 0 {
                return Err(ConfigError::Validation(format!(
                    "routes.{name}.uri must contain {{pattern}}"
                )));
            }
            self.pattern
                .with_overrides(&route.pattern)
                .validate()
                .map_err(|e| match e {
                    ConfigError::Validation(msg) => {
                        ConfigError::Validation(format!("routes.{name}.pattern: {msg}"))
                    }
                    other => other,
                })?;
        }
        for (name, members) in &self.filters.aliases {
            if members.contains_key(name) {
                return Err(ConfigError::Validation(format!(
                    "filters.aliases.{name} must not contain itself"
                )));
            }
        }
        Ok(())
    }

    /// Build the alias registry described by `[filters]`.
    pub fn filter_manager(&self) -> FilterManager {
        let manager = self
            .filters
            .handlers
            .iter()
            .fold(FilterManager::new(), |m, name| m.handler(name, name));
        self.filters
            .aliases
            .iter()
            .fold(manager, |m, (name, members)| m.alias(name, members.clone()))
    }
}

/// The five template settings that shape URLs.
///
/// Used as the key of the compiled-template cache, hence `Hash` + `Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateConfig {
    /// Placeholder layout of the URL path.
    pub format: String,
    /// Wrapper around the joined filter tokens; must contain `{filter}`.
    pub filters_format: String,
    /// Layout of one key/value token; must contain `{key}` and `{value}`.
    pub filter_format: String,
    /// Separator between filter tokens.
    pub filter_separator: String,
    /// Regex fragment per placeholder. Missing entries use the built-in default.
    pub placeholders: BTreeMap<Placeholder, String>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            format: "{dirname}/{basename}{filters}.{extension}".to_string(),
            filters_format: "-filters({filter})".to_string(),
            filter_format: "{key}({value})".to_string(),
            filter_separator: "-".to_string(),
            placeholders: default_placeholders(),
        }
    }
}

fn default_placeholders() -> BTreeMap<Placeholder, String> {
    Placeholder::ALL
        .into_iter()
        .filter(|p| *p != Placeholder::Filters)
        .map(|p| (p, p.default_pattern().to_string()))
        .collect()
}

impl TemplateConfig {
    /// Regex fragment for `placeholder`.
    pub fn placeholder_pattern(&self, placeholder: Placeholder) -> &str {
        self.placeholders
            .get(&placeholder)
            .map_or(placeholder.default_pattern(), String::as_str)
    }

    /// A copy with `overrides` applied on top.
    pub fn with_overrides(&self, overrides: &PatternOverrides) -> TemplateConfig {
        let mut merged = self.clone();
        if let Some(format) = &overrides.format {
            merged.format = format.clone();
        }
        if let Some(filters_format) = &overrides.filters_format {
            merged.filters_format = filters_format.clone();
        }
        if let Some(filter_format) = &overrides.filter_format {
            merged.filter_format = filter_format.clone();
        }
        if let Some(separator) = &overrides.filter_separator {
            merged.filter_separator = separator.clone();
        }
        for (placeholder, fragment) in &overrides.placeholders {
            merged.placeholders.insert(*placeholder, fragment.clone());
        }
        merged
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if count_tokens(&self.format, "extension") == 0 {
            return Err(ConfigError::Validation(
                "format must contain {extension}".into(),
            ));
        }
        if count_tokens(&self.format, "basename") == 0
            && count_tokens(&self.format, "filename") == 0
        {
            return Err(ConfigError::Validation(
                "format must contain {basename} or {filename}".into(),
            ));
        }
        if count_tokens(&self.filters_format, "filter") != 1 {
            return Err(ConfigError::Validation(
                "filters_format must contain {filter} exactly once".into(),
            ));
        }
        if count_tokens(&self.filter_format, "key") == 0
            || count_tokens(&self.filter_format, "value") == 0
        {
            return Err(ConfigError::Validation(
                "filter_format must contain {key} and {value}".into(),
            ));
        }
        if self.filter_separator.is_empty() {
            return Err(ConfigError::Validation(
                "filter_separator must not be empty".into(),
            ));
        }
        if self.placeholders.contains_key(&Placeholder::Filters) {
            return Err(ConfigError::Validation(
                "placeholders.filters is derived from filters_format and cannot be set".into(),
            ));
        }
        Ok(())
    }
}

/// Sparse pattern settings layered over a [`TemplateConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_separator: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub placeholders: BTreeMap<Placeholder, String>,
}

impl PatternOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Combine with a lower-priority layer: values set in `self` win.
    pub fn over(&self, lower: &PatternOverrides) -> PatternOverrides {
        let mut placeholders = lower.placeholders.clone();
        placeholders.extend(
            self.placeholders
                .iter()
                .map(|(p, fragment)| (*p, fragment.clone())),
        );
        PatternOverrides {
            format: self.format.clone().or_else(|| lower.format.clone()),
            filters_format: self
                .filters_format
                .clone()
                .or_else(|| lower.filters_format.clone()),
            filter_format: self
                .filter_format
                .clone()
                .or_else(|| lower.filter_format.clone()),
            filter_separator: self
                .filter_separator
                .clone()
                .or_else(|| lower.filter_separator.clone()),
            placeholders,
        }
    }
}

/// Filter aliases and handler-backed filter names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FiltersConfig {
    /// Alias name → filters it expands to.
    pub aliases: IndexMap<String, FilterSet>,
    /// Filter names executed by custom handlers in the transformation engine.
    pub handlers: Vec<String>,
}

/// A named route the generator can build URLs for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    /// Route URI; `{pattern}` receives the generated image path.
    pub uri: String,
    /// Host the route is served from. Relative URLs when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Pattern overrides applied to URLs generated for this route.
    #[serde(default, skip_serializing_if = "PatternOverrides::is_empty")]
    pub pattern: PatternOverrides,
}

fn default_scheme() -> String {
    "https".to_string()
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Every setting at its stock value, as the TOML table `image-url.toml` is
/// laid over.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(UrlConfig::default()).expect("stock UrlConfig serializes to TOML")
}

/// Lay `overlay` over `base` in place.
///
/// Tables combine key by key, so a file that only sets
/// `[pattern.placeholders] extension` keeps the stock fragments of the other
/// placeholders. Keys already in `base` keep their position; new keys are
/// appended, which keeps routes and aliases in file order.
pub fn layer_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(slot) => layer_toml(slot, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Read `path` as raw TOML; `Ok(None)` when there is no such file.
pub fn read_config_file(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(toml::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl UrlConfig {
    /// Typed, validated configuration from a fully layered TOML value.
    pub fn from_toml(value: toml::Value) -> Result<Self, ConfigError> {
        let config: UrlConfig = value.try_into()?;
        config.validate()?;
        Ok(config)
    }
}

/// Stock settings with the file at `path` laid over them. A missing file
/// yields the stock configuration.
pub fn load_config(path: &Path) -> Result<UrlConfig, ConfigError> {
    let mut value = stock_defaults_value();
    if let Some(file) = read_config_file(path)? {
        layer_toml(&mut value, file);
    }
    UrlConfig::from_toml(value)
}

/// Returns a fully-commented stock `image-url.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Image URL Configuration
# =======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# URL pattern
# ---------------------------------------------------------------------------
[pattern]
# Layout of image URLs. Placeholders:
#   {host} {dirname} {basename} {filename} {extension} {filters}
# {extension} and one of {basename}/{filename} are required.
format = "{dirname}/{basename}{filters}.{extension}"

# Wrapper around the filter tokens. Must contain {filter} once.
# Not applied when there are no filters.
filters_format = "-filters({filter})"

# Layout of one key/value filter token.
filter_format = "{key}({value})"

# Separator between filter tokens.
filter_separator = "-"

# Regex fragment matched by each placeholder when parsing URLs.
# {filters} is always derived from filters_format.
[pattern.placeholders]
host = ".*?"
dirname = ".*?"
basename = "[^/.]+?"
filename = "[^/]+?"
extension = "[^./]+"

# ---------------------------------------------------------------------------
# Filters
# ---------------------------------------------------------------------------
[filters]
# Filter names run by custom handlers of the transformation engine.
handlers = []

# Aliases expand to a fixed set of filters when a URL is parsed:
# [filters.aliases.small]
# width = 100
# height = 100
# crop = true

# ---------------------------------------------------------------------------
# Routes
# ---------------------------------------------------------------------------
# [routes.image]
# uri = "/{pattern}"
# domain = "img.example.com"
# scheme = "https"
#
# [routes.image.pattern]
# filters_format = "-image({filter})"
"##
}
