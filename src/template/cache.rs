//! Memo cache for compiled templates.
//!
//! Compiling is pure: the same [`TemplateConfig`] always yields the same
//! pattern and group map. The cache therefore keys on the configuration value
//! itself and never needs invalidation. Changing a generator setting simply
//! produces a different key.
//!
//! Entries are shared as `Arc<CompiledTemplate>` so a lookup never holds the
//! lock while a caller matches against the regex.

use super::compiler::{CompiledTemplate, TemplateError};
use crate::config::TemplateConfig;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: Mutex<HashMap<TemplateConfig, Arc<CompiledTemplate>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the compiled template for `config`, compiling on first use.
    ///
    /// Compilation errors are not cached; a broken configuration fails again
    /// on every call.
    pub fn get_or_compile(
        &self,
        config: &TemplateConfig,
    ) -> Result<Arc<CompiledTemplate>, TemplateError> {
        if let Some(hit) = self.lock().get(config) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(hit));
        }

        let compiled = Arc::new(CompiledTemplate::compile(config)?);
        self.misses.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.lock();
        let entry = entries
            .entry(config.clone())
            .or_insert_with(|| Arc::clone(&compiled));
        Ok(Arc::clone(entry))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            compiled: self.misses.load(Ordering::Relaxed),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TemplateConfig, Arc<CompiledTemplate>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Lookup counters for a [`TemplateCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub compiled: u64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cached, {} compiled", self.hits, self.compiled)
    }
}
