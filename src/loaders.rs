//! Resource loading utilities
//!
//! The simplifier reads schemas through the [`ResourceLoader`] capability.
//! [`FileLoader`] serves `file:` URLs itself and hands every other scheme to
//! the [`NetworkLoader`] it holds. [`NetworkLoader`] never touches the
//! filesystem and delegates the actual transfer to an injected [`Transport`].

use crate::error::{Error, LoadError, Result};
use crate::limits::Limits;
use indexmap::IndexMap;
use std::fmt;
use std::fs;
use url::Url;

/// A loaded resource
#[derive(Debug, Clone)]
pub struct Resource {
    url: Url,
    text: String,
}

impl Resource {
    /// Create a resource from its URL and contents
    pub fn new(url: Url, text: impl Into<String>) -> Self {
        Self {
            url,
            text: text.into(),
        }
    }

    /// URL the resource was loaded from
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Full text of the resource
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Capability to load schema resources
pub trait ResourceLoader {
    /// Load the resource at `url`
    fn load(&self, url: &Url) -> Result<Resource>;
}

/// Transfers remote resources for a [`NetworkLoader`]
pub trait Transport {
    /// Fetch the contents at `url`; errors are reported as strings
    fn fetch(&self, url: &Url) -> std::result::Result<String, String>;
}

/// Loader for non-`file:` URLs
pub struct NetworkLoader {
    transport: Option<Box<dyn Transport>>,
    limits: Limits,
}

impl NetworkLoader {
    /// Create a loader without a transport; every fetch fails
    pub fn new() -> Self {
        Self {
            transport: None,
            limits: Limits::default(),
        }
    }

    /// Set the transport used for fetching
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

impl ResourceLoader for NetworkLoader {
    fn load(&self, url: &Url) -> Result<Resource> {
        if url.scheme() == "file" {
            return Err(LoadError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
                url: url.to_string(),
            }
            .into());
        }

        let transport = self.transport.as_ref().ok_or_else(|| LoadError::Network {
            url: url.to_string(),
            reason: "no network transport configured".to_string(),
        })?;
        let text = transport.fetch(url).map_err(|reason| LoadError::Network {
            url: url.to_string(),
            reason,
        })?;

        self.limits.check_schema_size(text.len())?;
        Ok(Resource::new(url.clone(), text))
    }
}

impl Default for NetworkLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NetworkLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkLoader")
            .field("transport", &self.transport.is_some())
            .field("limits", &self.limits)
            .finish()
    }
}

/// Loader for `file:` URLs, delegating other schemes to a [`NetworkLoader`]
#[derive(Debug, Default)]
pub struct FileLoader {
    network: NetworkLoader,
    limits: Limits,
}

impl FileLoader {
    /// Create a file loader with a transport-less network delegate
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delegate used for non-`file:` URLs
    pub fn with_network(mut self, network: NetworkLoader) -> Self {
        self.network = network;
        self
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

impl ResourceLoader for FileLoader {
    fn load(&self, url: &Url) -> Result<Resource> {
        if url.scheme() != "file" {
            return self.network.load(url);
        }
        if url.fragment().is_some() {
            return Err(LoadError::Fragment(url.to_string()).into());
        }

        let path = url.to_file_path().map_err(|_| LoadError::UnsupportedScheme {
            scheme: url.scheme().to_string(),
            url: url.to_string(),
        })?;
        let text = fs::read_to_string(&path).map_err(|source| LoadError::File {
            url: url.to_string(),
            source,
        })?;

        // Check size limits
        self.limits.check_schema_size(text.len())?;

        Ok(Resource::new(url.clone(), text))
    }
}

/// Loader serving resources registered in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    resources: IndexMap<String, String>,
}

impl MemoryLoader {
    /// Create an empty memory loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `text` under `url`
    pub fn with_resource(mut self, url: &str, text: impl Into<String>) -> Self {
        self.insert(url, text);
        self
    }

    /// Register `text` under `url`
    pub fn insert(&mut self, url: &str, text: impl Into<String>) {
        self.resources.insert(url.to_string(), text.into());
    }
}

impl ResourceLoader for MemoryLoader {
    fn load(&self, url: &Url) -> Result<Resource> {
        self.resources
            .get(url.as_str())
            .map(|text| Resource::new(url.clone(), text.clone()))
            .ok_or_else(|| Error::Load(LoadError::NotFound(url.to_string())))
    }
}

impl<L: ResourceLoader + ?Sized> ResourceLoader for &L {
    fn load(&self, url: &Url) -> Result<Resource> {
        (**self).load(url)
    }
}

impl<L: ResourceLoader + ?Sized> ResourceLoader for Box<L> {
    fn load(&self, url: &Url) -> Result<Resource> {
        (**self).load(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct EchoTransport;

    impl Transport for EchoTransport {
        fn fetch(&self, url: &Url) -> std::result::Result<String, String> {
            Ok(format!("<!-- {} -->", url))
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "<empty xmlns=\"http://relaxng.org/ns/structure/1.0\"/>").unwrap();

        let url = Url::from_file_path(file.path()).unwrap();
        let resource = FileLoader::new().load(&url).unwrap();

        assert!(resource.text().contains("<empty"));
        assert_eq!(resource.url(), &url);
    }

    #[test]
    fn test_file_fragment_rejected() {
        let url = Url::parse("file:///tmp/schema.rng#frag").unwrap();
        let err = FileLoader::new().load(&url).unwrap_err();
        assert!(matches!(err, Error::Load(LoadError::Fragment(_))));
    }

    #[test]
    fn test_missing_file() {
        let url = Url::parse("file:///definitely/not/here.rng").unwrap();
        let err = FileLoader::new().load(&url).unwrap_err();
        assert!(matches!(err, Error::Load(LoadError::File { .. })));
    }

    #[test]
    fn test_network_rejects_file_scheme() {
        let loader = NetworkLoader::new().with_transport(EchoTransport);
        let url = Url::parse("file:///tmp/schema.rng").unwrap();
        let err = loader.load(&url).unwrap_err();
        assert!(matches!(err, Error::Load(LoadError::UnsupportedScheme { .. })));
        assert!(err.to_string().contains("file"));
    }

    #[test]
    fn test_file_loader_delegates_remote() {
        let loader = FileLoader::new().with_network(NetworkLoader::new().with_transport(EchoTransport));
        let url = Url::parse("http://example.com/a.rng").unwrap();
        let resource = loader.load(&url).unwrap();
        assert_eq!(resource.text(), "<!-- http://example.com/a.rng -->");
    }

    #[test]
    fn test_network_without_transport() {
        let url = Url::parse("http://example.com/a.rng").unwrap();
        let err = FileLoader::new().load(&url).unwrap_err();
        assert!(matches!(err, Error::Load(LoadError::Network { .. })));
    }

    #[test]
    fn test_size_limit() {
        let mut file = NamedTempFile::new().unwrap();
        let large_content = "x".repeat(11 * 1024 * 1024); // 11 MB
        write!(file, "{}", large_content).unwrap();

        let url = Url::from_file_path(file.path()).unwrap();
        let loader = FileLoader::new().with_limits(Limits::strict());

        // Strict limits (10 MB max) should reject 11MB file
        assert!(matches!(loader.load(&url), Err(Error::LimitExceeded(_))));
    }

    #[test]
    fn test_memory_loader() {
        let loader = MemoryLoader::new().with_resource("memory:/a.rng", "<empty/>");
        let url = Url::parse("memory:/a.rng").unwrap();
        assert_eq!(loader.load(&url).unwrap().text(), "<empty/>");

        let missing = Url::parse("memory:/b.rng").unwrap();
        assert!(matches!(
            loader.load(&missing),
            Err(Error::Load(LoadError::NotFound(_)))
        ));
    }
}
