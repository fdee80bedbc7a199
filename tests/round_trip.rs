//! Round-trip properties: every generated URL parses back to the path and
//! filters it was built from.
//!
//! Run with: cargo test --test round_trip

use image_url::UrlGenerator;
use image_url::config::TemplateConfig;
use image_url::filters::{FilterManager, FilterSet, FilterValue};
use image_url::template::{CompiledTemplate, Placeholder};
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

fn custom_config() -> TemplateConfig {
    TemplateConfig {
        format: "{dirname}/{filters}/{basename}.{extension}".to_string(),
        filters_format: "image/{filter}".to_string(),
        filter_format: "{key}-{value}".to_string(),
        filter_separator: "/".to_string(),
        ..TemplateConfig::default()
    }
}

fn generators() -> Vec<(&'static str, UrlGenerator)> {
    vec![
        ("default", UrlGenerator::default()),
        ("custom", UrlGenerator::new(custom_config())),
    ]
}

// =========================================================================
// Strategies
// =========================================================================

/// Directory segments end in a digit so none of them reads as a filter
/// wrapper (`image/...`) or a basename.
fn dirname() -> impl Strategy<Value = String> {
    vec("[a-z]{1,6}[0-9]", 0..4).prop_map(|segments| segments.join("/"))
}

fn source_parts() -> impl Strategy<Value = (String, String, String)> {
    (
        dirname(),
        "[a-z][a-z0-9_]{0,10}",
        "(jpg|png|gif|webp)",
    )
}

fn join_source(dir: &str, base: &str, ext: &str) -> String {
    if dir.is_empty() {
        format!("{base}.{ext}")
    } else {
        format!("{dir}/{base}.{ext}")
    }
}

fn source() -> impl Strategy<Value = String> {
    source_parts().prop_map(|(dir, base, ext)| join_source(&dir, &base, &ext))
}

#[derive(Debug, Clone, Copy)]
enum Layout {
    /// `{basename}{filters}.{extension}`
    Inline,
    /// `{filters}/{basename}.{extension}`
    Segment,
}

/// Template configurations whose separators never clash with token contents.
fn template_config() -> impl Strategy<Value = TemplateConfig> {
    let codecs = prop_oneof![
        Just(("-filters({filter})", "{key}({value})", "-", Layout::Inline)),
        Just(("-f[{filter}]", "{ key }:{ value }", "~", Layout::Inline)),
        Just(("image/{filter}", "{key}-{value}", "/", Layout::Segment)),
        Just(("f/{filter}", "{key}={value}", ";", Layout::Segment)),
    ];
    let prefixes = prop_oneof![Just(""), Just("media/"), Just("static/img/")];
    (prefixes, codecs).prop_map(|(prefix, (filters_format, filter_format, separator, layout))| {
        let body = match layout {
            Layout::Inline => "{dirname}/{basename}{filters}.{extension}",
            Layout::Segment => "{dirname}/{filters}/{basename}.{extension}",
        };
        TemplateConfig {
            format: format!("{prefix}{body}"),
            filters_format: filters_format.to_string(),
            filter_format: filter_format.to_string(),
            filter_separator: separator.to_string(),
            ..TemplateConfig::default()
        }
    })
}

fn filter_value() -> impl Strategy<Value = FilterValue> {
    prop_oneof![
        Just(FilterValue::Bool(true)),
        (0i64..5000).prop_map(FilterValue::Int),
        vec(0i64..1000, 2..4)
            .prop_map(|items| FilterValue::List(items.into_iter().map(FilterValue::Int).collect())),
    ]
}

/// Filter names that can never collide with the size token or reserved keys.
fn filters() -> impl Strategy<Value = FilterSet> {
    (
        proptest::option::of(1u32..4000),
        proptest::option::of(1u32..4000),
        btree_map("[a-z]{3,8}", filter_value(), 0..5),
    )
        .prop_map(|(width, height, rest)| {
            let rest: FilterSet = rest
                .into_iter()
                .filter(|(key, _)| {
                    !matches!(key.as_str(), "width" | "height" | "route" | "host" | "pattern")
                })
                .collect();
            rest.sized(width, height)
        })
}

/// What parsing should yield: a size token always decodes to both sides.
fn expected(filters: &FilterSet) -> FilterSet {
    let mut expected = FilterSet::new();
    if filters.width().is_some() || filters.height().is_some() {
        expected.insert("width", filters.width().cloned().unwrap_or(FilterValue::Null));
        expected.insert("height", filters.height().cloned().unwrap_or(FilterValue::Null));
    }
    for (key, value) in filters {
        if key != "width" && key != "height" {
            expected.insert(key.clone(), value.clone());
        }
    }
    expected
}

proptest! {
    #[test]
    fn parse_inverts_make(src in source(), filters in filters()) {
        for (name, generator) in generators() {
            let url = generator.make(&src, &filters).unwrap().unwrap();
            let matched = generator.parse(&url).unwrap();
            prop_assert_eq!(&matched.path, &src, "layout {} url {}", name, url);
            prop_assert_eq!(
                matched.filters,
                expected(&filters),
                "layout {} url {}",
                name,
                url
            );
        }
    }

    #[test]
    fn captures_reconstitute_every_placeholder(
        config in template_config(),
        (dir, base, ext) in source_parts(),
        filters in filters(),
    ) {
        let generator = UrlGenerator::new(config.clone());
        let url = generator
            .make(&join_source(&dir, &base, &ext), &filters)
            .unwrap()
            .unwrap();

        let compiled = CompiledTemplate::compile(&config).unwrap();
        let m = compiled.captures(url.trim_start_matches('/'));
        prop_assert!(m.is_some(), "format {} url {}", config.format, url);
        let m = m.unwrap();

        prop_assert_eq!(m.get(Placeholder::Dirname).unwrap_or(""), dir.as_str());
        prop_assert_eq!(m.get(Placeholder::Basename), Some(base.as_str()));
        prop_assert_eq!(m.get(Placeholder::Extension), Some(ext.as_str()));
        match m.get(Placeholder::Filters) {
            Some(raw) => {
                let decoded = compiled.codec().decode(raw, &FilterManager::new()).unwrap();
                prop_assert_eq!(decoded, expected(&filters), "url {}", url);
            }
            None => prop_assert!(filters.is_empty(), "url {}", url),
        }
    }

    #[test]
    fn unfiltered_urls_carry_no_wrapper(src in source()) {
        for (name, generator) in generators() {
            let url = generator.make(&src, &FilterSet::new()).unwrap().unwrap();
            prop_assert!(!url.contains("filters("), "layout {} url {}", name, url);
            prop_assert!(!url.contains("//"), "layout {} url {}", name, url);
        }
    }
}

// =========================================================================
// Literal examples
// =========================================================================

#[test]
fn default_layout_example() {
    let generator = UrlGenerator::default();
    let filters = FilterSet::new()
        .with("width", 300)
        .with("height", 300)
        .with("rotate", 90)
        .with("negative", true);
    let url = generator.make("path/to/image.jpg", &filters).unwrap();
    assert_eq!(
        url.as_deref(),
        Some("/path/to/image-filters(300x300-rotate(90)-negative).jpg")
    );
    let matched = generator.parse(url.as_deref().unwrap()).unwrap();
    assert_eq!(matched.path, "path/to/image.jpg");
    assert_eq!(matched.filters, filters);
}

#[test]
fn custom_layout_example() {
    let generator = UrlGenerator::new(custom_config());
    let filters = FilterSet::new()
        .with("width", 300)
        .with("height", 300)
        .with("rotate", 90)
        .with("negative", true);
    let url = generator.make("uploads/image.jpg", &filters).unwrap();
    assert_eq!(
        url.as_deref(),
        Some("/uploads/image/300x300/rotate-90/negative/image.jpg")
    );
    let matched = generator.parse(url.as_deref().unwrap()).unwrap();
    assert_eq!(matched.path, "uploads/image.jpg");
    assert_eq!(matched.filters, filters);
}
