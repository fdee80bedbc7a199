//! Named routes.
//!
//! A route gives generated image paths a home in the host application's URL
//! space: `uri = "/media/{pattern}"` on `domain = "img.example.com"` turns the
//! relative path `a/b-filters(negative).jpg` into
//! `https://img.example.com/media/a/b-filters(negative).jpg`. Routes may also
//! carry their own pattern overrides, which the generator layers under the
//! call-site overrides.

use crate::config::{RouteConfig, UrlConfig};
use crate::naming::SourceHost;
use crate::template::{Piece, split_tokens};
use indexmap::IndexMap;

/// Route lookup and reverse URL generation.
pub trait RouteResolver: Send + Sync {
    /// Declared configuration of `name`, if such a route exists.
    fn route(&self, name: &str) -> Option<&RouteConfig>;

    /// Final URL of route `name` with `path` substituted for `{pattern}`.
    ///
    /// `host`, when given, is the host already resolved by the caller and
    /// takes the place of the route's own domain.
    fn url(&self, name: &str, path: &str, host: Option<&SourceHost>) -> Option<String>;
}

/// Routes declared in configuration.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: IndexMap<String, RouteConfig>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &UrlConfig) -> Self {
        Self {
            routes: config.routes.clone(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, route: RouteConfig) -> Self {
        self.routes.insert(name.into(), route);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl RouteResolver for RouteTable {
    fn route(&self, name: &str) -> Option<&RouteConfig> {
        self.routes.get(name)
    }

    fn url(&self, name: &str, path: &str, host: Option<&SourceHost>) -> Option<String> {
        let route = self.routes.get(name)?;
        let path = path.trim_start_matches('/');
        let uri: String = split_tokens(&route.uri, &["pattern"])
            .into_iter()
            .map(|piece| match piece {
                Piece::Literal(text) => text,
                Piece::Token(_) => path,
            })
            .collect();
        let uri = if uri.starts_with('/') {
            uri
        } else {
            format!("/{uri}")
        };
        Some(match (host, &route.domain) {
            (Some(host), _) => format!("{}{}", host.prefix(), uri),
            (None, Some(domain)) => format!("{}://{}{}", route.scheme, domain, uri),
            (None, None) => uri,
        })
    }
}
