//! Shared test utilities for the image-url test suite.
//!
//! Provides the second URL layout used throughout the tests alongside the
//! default one, plus ready-made generators.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let generator = custom_generator();
//! let url = generator.make("uploads/image.jpg", &FilterSet::new().flag("negative"));
//! // → "/uploads/image/negative/image.jpg"
//! ```

use crate::config::TemplateConfig;
use crate::filters::{FilterManager, FilterSet};
use crate::generator::UrlGenerator;

// =========================================================================
// Configurations
// =========================================================================

/// Filters as their own path segments: `uploads/image/300x300/rotate-90/image.jpg`.
pub fn custom_template_config() -> TemplateConfig {
    TemplateConfig {
        format: "{dirname}/{filters}/{basename}.{extension}".to_string(),
        filters_format: "image/{filter}".to_string(),
        filter_format: "{key}-{value}".to_string(),
        filter_separator: "/".to_string(),
        ..TemplateConfig::default()
    }
}

// =========================================================================
// Generators
// =========================================================================

pub fn custom_generator() -> UrlGenerator {
    UrlGenerator::new(custom_template_config())
}

/// Default layout with a `small` alias (100x100, cropped).
pub fn aliased_generator() -> UrlGenerator {
    let filters = FilterManager::new()
        .alias(
            "small",
            FilterSet::new()
                .with("width", 100)
                .with("height", 100)
                .flag("crop"),
        )
        .handler("watermark", "watermark");
    UrlGenerator::default().with_filters(filters)
}
