//! Resource location resolution
//!
//! Schema locations are handled as absolute [`Url`]s throughout the crate.
//! Command-line style inputs (plain paths) are converted here, and `href`
//! attributes are resolved against the `xml:base` in scope.

use crate::error::{Error, Result};
use crate::tree::{NodeId, Tree};
use std::path::Path;
use url::Url;

/// Turn a URL or a filesystem path into an absolute URL
pub fn to_url(location: &str) -> Result<Url> {
    // Single letter schemes are Windows drive letters, not URLs
    if let Ok(url) = Url::parse(location) {
        if url.scheme().len() > 1 {
            return Ok(url);
        }
    }

    let path = Path::new(location);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Url::from_file_path(&absolute)
        .map_err(|_| Error::Xml(format!("Cannot turn '{}' into a file URL", absolute.display())))
}

/// Resolve the `href` attribute of `id` against its base URL
pub fn resolve_href(tree: &Tree, id: NodeId) -> Result<Url> {
    let href = tree.required_attribute(id, "href")?.trim();
    let resolved = match tree.base_uri(id) {
        Some(base) => Url::parse(base)?.join(href)?,
        None => Url::parse(href)?,
    };
    Ok(resolved)
}

/// Get the location as a short display string (file path for `file:` URLs)
pub fn display(url: &Url) -> String {
    if url.scheme() == "file" {
        if let Ok(path) = url.to_file_path() {
            return path.display().to_string();
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse_str;

    #[test]
    fn test_to_url_keeps_urls() {
        let url = to_url("http://example.com/schema.rng").unwrap();
        assert_eq!(url.scheme(), "http");
    }

    #[test]
    fn test_to_url_from_path() {
        let url = to_url("/tmp/schema.rng").unwrap();
        assert_eq!(url.scheme(), "file");
        assert_eq!(url.path(), "/tmp/schema.rng");
    }

    #[test]
    fn test_resolve_href() {
        let base = Url::parse("file:///schemas/main.rng").unwrap();
        let xml = r#"<grammar xmlns="http://relaxng.org/ns/structure/1.0">
            <include href=" common/types.rng "/>
        </grammar>"#;
        let tree = parse_str(xml, Some(&base)).unwrap();
        let include = tree.first_element_child(tree.root().unwrap()).unwrap();

        let url = resolve_href(&tree, include).unwrap();
        assert_eq!(url.as_str(), "file:///schemas/common/types.rng");
    }

    #[test]
    fn test_display() {
        let url = Url::parse("file:///tmp/a.rng").unwrap();
        assert_eq!(display(&url), "/tmp/a.rng");
        let url = Url::parse("http://example.com/a.rng").unwrap();
        assert_eq!(display(&url), "http://example.com/a.rng");
    }
}
