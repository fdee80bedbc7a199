//! Result types shared between the library and the CLI.

use crate::filters::FilterSet;
use serde::{Deserialize, Serialize};

/// Outcome of parsing an image URL.
///
/// `path` is the original image path with the filters wrapper removed;
/// `filters` are the decoded filters, aliases already expanded. A path that
/// does not follow the URL format comes back unchanged with no filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPath {
    pub path: String,
    pub filters: FilterSet,
}

impl MatchedPath {
    /// A path carrying no filters.
    pub fn unfiltered(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            filters: FilterSet::new(),
        }
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }
}
