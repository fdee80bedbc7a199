//! Source splitting and image path decomposition.
//!
//! A source handed to the generator is either a bare path
//! (`uploads/photo.jpg`) or an absolute URL
//! (`https://cdn.example.com:8080/uploads/photo.jpg`). This module separates
//! the host part from the path and then breaks the path into the pieces the
//! URL format can place:
//!
//! ```text
//! uploads/2024/photo.final.jpg
//! ├── dirname    uploads/2024
//! ├── basename   photo.final
//! ├── extension  jpg
//! └── filename   photo.final.jpg
//! ```

use url::Url;

/// Host part of a source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHost {
    /// `None` for protocol-relative hosts (`//cdn.example.com`).
    pub scheme: Option<String>,
    /// Host name, with `:port` appended when the port is not the default.
    pub authority: String,
}

impl SourceHost {
    /// Parse an explicitly configured host such as `cdn.example.com`,
    /// `https://cdn.example.com` or `//cdn.example.com`.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once("://") {
            Some((scheme, rest)) => Self {
                scheme: Some(scheme.to_string()),
                authority: rest.trim_end_matches('/').to_string(),
            },
            None => Self {
                scheme: None,
                authority: raw.trim_start_matches("//").trim_end_matches('/').to_string(),
            },
        }
    }

    /// URL prefix: `scheme://authority`, or `//authority` without a scheme.
    pub fn prefix(&self) -> String {
        match &self.scheme {
            Some(scheme) => format!("{scheme}://{}", self.authority),
            None => format!("//{}", self.authority),
        }
    }
}

/// A source split into optional host and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub host: Option<SourceHost>,
    pub path: String,
}

/// Split `src` into host and path.
///
/// Anything that does not parse as an absolute URL with a host is a path.
pub fn split_source(src: &str) -> Source {
    if let Some(rest) = src.strip_prefix("//") {
        if let Ok(url) = Url::parse(&format!("http://{rest}")) {
            if let Some(authority) = authority(&url) {
                return Source {
                    host: Some(SourceHost {
                        scheme: None,
                        authority,
                    }),
                    path: url.path().to_string(),
                };
            }
        }
    }

    match Url::parse(src) {
        Ok(url) => match authority(&url) {
            Some(authority) => Source {
                host: Some(SourceHost {
                    scheme: Some(url.scheme().to_string()),
                    authority,
                }),
                path: url.path().to_string(),
            },
            None => Source {
                host: None,
                path: src.to_string(),
            },
        },
        Err(_) => Source {
            host: None,
            path: src.to_string(),
        },
    }
}

fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// The pieces of an image path a URL format can refer to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathParts {
    /// Directory, without leading or trailing `/`. Empty at the root.
    pub dirname: String,
    /// File name without its extension.
    pub basename: String,
    /// Extension without the dot. Empty when the file has none.
    pub extension: String,
}

impl PathParts {
    /// Decompose a path.
    ///
    /// - `"path/to/image.jpg"` → dirname="path/to", basename="image", extension="jpg"
    /// - `"/image.jpg"` → dirname="", basename="image", extension="jpg"
    /// - `"a/archive.tar.gz"` → basename="archive.tar", extension="gz"
    /// - `"a/README"` → basename="README", extension=""
    pub fn parse(path: &str) -> Self {
        let (dirname, file) = match path.rsplit_once('/') {
            Some((dir, file)) => (dir.trim_matches('/'), file),
            None => ("", path),
        };
        let dirname = if dirname == "." { "" } else { dirname };

        let (basename, extension) = match file.rsplit_once('.') {
            Some((base, ext)) => (base, ext),
            None => (file, ""),
        };

        Self {
            dirname: dirname.to_string(),
            basename: basename.to_string(),
            extension: extension.to_string(),
        }
    }

    /// `basename.extension`, or just the basename when there is no extension.
    pub fn filename(&self) -> String {
        if self.extension.is_empty() {
            self.basename.clone()
        } else {
            format!("{}.{}", self.basename, self.extension)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // split_source
    // =========================================================================

    #[test]
    fn bare_path_has_no_host() {
        let s = split_source("path/to/image.jpg");
        assert_eq!(s.host, None);
        assert_eq!(s.path, "path/to/image.jpg");
    }

    #[test]
    fn absolute_url_splits_host() {
        let s = split_source("https://example.com/path/image.jpg");
        assert_eq!(
            s.host,
            Some(SourceHost {
                scheme: Some("https".into()),
                authority: "example.com".into(),
            })
        );
        assert_eq!(s.path, "/path/image.jpg");
    }

    #[test]
    fn non_default_port_is_kept() {
        let s = split_source("http://example.com:8080/image.jpg");
        assert_eq!(s.host.unwrap().authority, "example.com:8080");
    }

    #[test]
    fn default_port_is_dropped() {
        let s = split_source("http://example.com:80/image.jpg");
        assert_eq!(s.host.unwrap().authority, "example.com");
    }

    #[test]
    fn protocol_relative_source() {
        let s = split_source("//cdn.example.com/a/b.png");
        let host = s.host.unwrap();
        assert_eq!(host.scheme, None);
        assert_eq!(host.authority, "cdn.example.com");
        assert_eq!(s.path, "/a/b.png");
    }

    #[test]
    fn url_without_host_is_a_path() {
        let s = split_source("data:image/png;base64,AAAA");
        assert_eq!(s.host, None);
    }

    // =========================================================================
    // SourceHost
    // =========================================================================

    #[test]
    fn explicit_host_with_scheme() {
        let h = SourceHost::parse("https://cdn.example.com/");
        assert_eq!(h.prefix(), "https://cdn.example.com");
    }

    #[test]
    fn explicit_host_without_scheme() {
        let h = SourceHost::parse("cdn.example.com");
        assert_eq!(h.prefix(), "//cdn.example.com");
    }

    // =========================================================================
    // PathParts
    // =========================================================================

    #[test]
    fn nested_path() {
        let p = PathParts::parse("path/to/image.jpg");
        assert_eq!(p.dirname, "path/to");
        assert_eq!(p.basename, "image");
        assert_eq!(p.extension, "jpg");
        assert_eq!(p.filename(), "image.jpg");
    }

    #[test]
    fn leading_slash_is_trimmed_from_dirname() {
        let p = PathParts::parse("/uploads/image.jpg");
        assert_eq!(p.dirname, "uploads");
    }

    #[test]
    fn root_file_has_empty_dirname() {
        assert_eq!(PathParts::parse("image.jpg").dirname, "");
        assert_eq!(PathParts::parse("/image.jpg").dirname, "");
        assert_eq!(PathParts::parse("./image.jpg").dirname, "");
    }

    #[test]
    fn last_dot_splits_extension() {
        let p = PathParts::parse("a/archive.tar.gz");
        assert_eq!(p.basename, "archive.tar");
        assert_eq!(p.extension, "gz");
    }

    #[test]
    fn no_extension() {
        let p = PathParts::parse("a/README");
        assert_eq!(p.basename, "README");
        assert_eq!(p.extension, "");
        assert_eq!(p.filename(), "README");
    }
}
