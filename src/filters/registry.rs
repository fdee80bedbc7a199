//! Filter alias registry.
//!
//! Some filter names are not directives of their own but shortcuts: `small`
//! may stand for `width=100, height=100, crop`. Others name a custom handler
//! that the transformation engine runs later. The URL layer only needs to tell
//! the two apart, which is what the [`FilterLookup`] trait exposes.
//!
//! The registry is built once at startup and handed to the generator; it is
//! read-only afterwards.

use super::value::FilterSet;
use std::collections::HashMap;

/// What a registered filter name stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterDefinition {
    /// Expands to its members when decoded from a URL.
    Alias(FilterSet),
    /// Executed by the transformation engine under the given handler id.
    /// Decoding keeps the filter as-is.
    Handler(String),
}

/// Read-only lookup of registered filter names.
pub trait FilterLookup: Send + Sync {
    fn get(&self, name: &str) -> Option<&FilterDefinition>;
}

/// Registry of filter aliases and handler names.
#[derive(Debug, Clone, Default)]
pub struct FilterManager {
    definitions: HashMap<String, FilterDefinition>,
}

impl FilterManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an alias expanding to `members`.
    pub fn alias(mut self, name: impl Into<String>, members: FilterSet) -> Self {
        self.definitions
            .insert(name.into(), FilterDefinition::Alias(members));
        self
    }

    /// Register (or replace) a filter handled by the transformation engine.
    pub fn handler(mut self, name: impl Into<String>, handler_id: impl Into<String>) -> Self {
        self.definitions
            .insert(name.into(), FilterDefinition::Handler(handler_id.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl FilterLookup for FilterManager {
    fn get(&self, name: &str) -> Option<&FilterDefinition> {
        self.definitions.get(name)
    }
}
