use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholders understood in a URL format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placeholder {
    Host,
    Dirname,
    Basename,
    Filename,
    Extension,
    Filters,
}

impl Placeholder {
    pub const ALL: [Placeholder; 6] = [
        Placeholder::Host,
        Placeholder::Dirname,
        Placeholder::Basename,
        Placeholder::Filename,
        Placeholder::Extension,
        Placeholder::Filters,
    ];

    pub const NAMES: [&'static str; 6] = [
        "host",
        "dirname",
        "basename",
        "filename",
        "extension",
        "filters",
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Dirname => "dirname",
            Self::Basename => "basename",
            Self::Filename => "filename",
            Self::Extension => "extension",
            Self::Filters => "filters",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }

    /// Regex fragment used when the configuration does not provide one.
    ///
    /// `Filters` has no configurable fragment: it is always derived from
    /// `filters_format`.
    pub fn default_pattern(self) -> &'static str {
        match self {
            Self::Host | Self::Dirname => ".*?",
            Self::Basename => "[^/.]+?",
            Self::Filename => "[^/]+?",
            Self::Extension => "[^./]+",
            Self::Filters => ".*?",
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
