//! Resource identifiers, handles and stores.
//!
//! A resource identifier is a `scheme:path` pair; a bare path defaults to
//! the `file` scheme. Stores are registered per scheme in a
//! [`ResourceStoreRegistry`] assembled at startup, mirroring how
//! configuration sources are registered per extension.

use std::collections::HashMap;
use std::fmt;
use std::io::{BufRead, Cursor};
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;

use crate::store::StoreError;

/// A parsed resource identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceUri {
    raw: String,
    scheme: String,
    path: String,
}

impl ResourceUri {
    /// Parse an identifier of the form `scheme:path`.
    ///
    /// A bare path (no scheme, or a single-letter prefix such as a Windows
    /// drive) is taken as a `file` resource. Schemes are lowercased; the
    /// path is kept verbatim.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(StoreError::InvalidUri {
                uri: raw.to_string(),
                detail: "empty identifier",
            });
        }
        match raw.split_once(':') {
            Some((scheme, path))
                if scheme.len() > 1
                    && scheme
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) =>
            {
                if path.is_empty() {
                    return Err(StoreError::InvalidUri {
                        uri: raw.to_string(),
                        detail: "empty path",
                    });
                }
                Ok(Self {
                    raw: raw.to_string(),
                    scheme: scheme.to_ascii_lowercase(),
                    path: path.to_string(),
                })
            }
            _ => Ok(Self {
                raw: raw.to_string(),
                scheme: "file".to_string(),
                path: raw.to_string(),
            }),
        }
    }

    /// The identifier exactly as given.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Content fetched from a resource store.
///
/// The handle owns the fetched bytes; dropping it releases them. Text
/// access fails on non-UTF-8 content with a distinguished error.
#[derive(Debug)]
pub struct ResourceHandle {
    uri: String,
    content: Vec<u8>,
}

impl ResourceHandle {
    pub fn new(uri: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            uri: uri.into(),
            content,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn bytes(&self) -> &[u8] {
        &self.content
    }

    /// Buffered reader over the fetched content.
    pub fn reader(&self) -> impl BufRead + '_ {
        Cursor::new(&self.content)
    }

    /// The content as text.
    pub fn text(&self) -> Result<&str, StoreError> {
        std::str::from_utf8(&self.content).map_err(|_| StoreError::NotUtf8 {
            uri: self.uri.clone(),
        })
    }
}

/// File/URI access abstraction consumed by resource bindings.
///
/// Implementations must be safe for concurrent use. `get` raises the
/// distinguished [`StoreError::NotFound`] when the resource is absent.
pub trait ResourceStore: Send + Sync {
    fn get(&self, uri: &ResourceUri) -> Result<ResourceHandle, StoreError>;

    fn put(&self, uri: &ResourceUri, content: &[u8]) -> Result<(), StoreError>;

    fn exists(&self, uri: &ResourceUri) -> Result<bool, StoreError>;
}

/// Filesystem-backed resource store for `file:` identifiers and bare paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileResourceStore;

impl ResourceStore for FileResourceStore {
    fn get(&self, uri: &ResourceUri) -> Result<ResourceHandle, StoreError> {
        let content =
            std::fs::read(Path::new(uri.path())).map_err(|e| StoreError::io(uri.raw(), e))?;
        Ok(ResourceHandle::new(uri.raw(), content))
    }

    fn put(&self, uri: &ResourceUri, content: &[u8]) -> Result<(), StoreError> {
        std::fs::write(Path::new(uri.path()), content).map_err(|e| StoreError::io(uri.raw(), e))
    }

    fn exists(&self, uri: &ResourceUri) -> Result<bool, StoreError> {
        Ok(Path::new(uri.path()).exists())
    }
}

/// In-process resource store for `memory:` identifiers.
///
/// An unseen path materializes as empty content on first access, so the
/// synthetic resources bound to non-file sources (environment, arguments)
/// always exist.
#[derive(Default)]
pub struct MemoryResourceStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResourceStore for MemoryResourceStore {
    fn get(&self, uri: &ResourceUri) -> Result<ResourceHandle, StoreError> {
        let content = self
            .entries
            .entry(uri.path().to_string())
            .or_default()
            .clone();
        Ok(ResourceHandle::new(uri.raw(), content))
    }

    fn put(&self, uri: &ResourceUri, content: &[u8]) -> Result<(), StoreError> {
        self.entries
            .insert(uri.path().to_string(), content.to_vec());
        Ok(())
    }

    fn exists(&self, _uri: &ResourceUri) -> Result<bool, StoreError> {
        Ok(true)
    }
}

/// Scheme → resource store table, populated by explicit registration.
pub struct ResourceStoreRegistry {
    stores: HashMap<String, Arc<dyn ResourceStore>>,
}

impl ResourceStoreRegistry {
    /// An empty registry with no schemes.
    pub fn empty() -> Self {
        Self {
            stores: HashMap::new(),
        }
    }

    /// A registry with the bundled `file` and `memory` stores.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("file", Arc::new(FileResourceStore));
        registry.register("memory", Arc::new(MemoryResourceStore::new()));
        registry
    }

    /// Register (or replace) the store serving one scheme.
    pub fn register(&mut self, scheme: &str, store: Arc<dyn ResourceStore>) {
        self.stores.insert(scheme.to_ascii_lowercase(), store);
    }

    /// The store serving the identifier's scheme.
    pub fn for_uri(&self, uri: &ResourceUri) -> Result<Arc<dyn ResourceStore>, StoreError> {
        self.stores
            .get(uri.scheme())
            .cloned()
            .ok_or_else(|| StoreError::UnsupportedScheme {
                scheme: uri.scheme().to_string(),
            })
    }
}

impl Default for ResourceStoreRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scheme_and_path() {
        let uri = ResourceUri::parse("memory:/internal/app.osenv").unwrap();
        assert_eq!(uri.scheme(), "memory");
        assert_eq!(uri.path(), "/internal/app.osenv");
        assert_eq!(uri.raw(), "memory:/internal/app.osenv");
    }

    #[test]
    fn test_parse_bare_path_defaults_to_file() {
        let uri = ResourceUri::parse("/etc/app.properties").unwrap();
        assert_eq!(uri.scheme(), "file");
        assert_eq!(uri.path(), "/etc/app.properties");
    }

    #[test]
    fn test_parse_file_scheme() {
        let uri = ResourceUri::parse("file:/etc/app.properties").unwrap();
        assert_eq!(uri.scheme(), "file");
        assert_eq!(uri.path(), "/etc/app.properties");
    }

    #[test]
    fn test_parse_scheme_is_lowercased() {
        let uri = ResourceUri::parse("MEMORY:/x.properties").unwrap();
        assert_eq!(uri.scheme(), "memory");
    }

    #[test]
    fn test_parse_empty_identifier_rejected() {
        assert!(matches!(
            ResourceUri::parse("  "),
            Err(StoreError::InvalidUri { .. })
        ));
    }

    #[test]
    fn test_parse_windows_drive_is_a_file_path() {
        let uri = ResourceUri::parse(r"C:\conf\app.properties").unwrap();
        assert_eq!(uri.scheme(), "file");
        assert_eq!(uri.path(), r"C:\conf\app.properties");
    }

    #[test]
    fn test_file_store_missing_resource_is_not_found() {
        let store = FileResourceStore;
        let uri = ResourceUri::parse("file:/definitely/not/here.properties").unwrap();
        let err = store.get(&uri).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("app.properties");
        let uri = ResourceUri::parse(path.to_str().unwrap()).unwrap();

        let store = FileResourceStore;
        assert!(!store.exists(&uri).unwrap());
        store.put(&uri, b"name=demo\n").unwrap();
        assert!(store.exists(&uri).unwrap());
        let handle = store.get(&uri).unwrap();
        assert_eq!(handle.text().unwrap(), "name=demo\n");
    }

    #[test]
    fn test_memory_store_materializes_empty_content() {
        let store = MemoryResourceStore::new();
        let uri = ResourceUri::parse("memory:/internal/app.osenv").unwrap();
        assert!(store.exists(&uri).unwrap());
        let handle = store.get(&uri).unwrap();
        assert!(handle.bytes().is_empty());
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryResourceStore::new();
        let uri = ResourceUri::parse("memory:/data.properties").unwrap();
        store.put(&uri, b"a=1").unwrap();
        assert_eq!(store.get(&uri).unwrap().text().unwrap(), "a=1");
    }

    #[test]
    fn test_registry_resolves_by_scheme() {
        let registry = ResourceStoreRegistry::with_defaults();
        let uri = ResourceUri::parse("memory:/x.properties").unwrap();
        assert!(registry.for_uri(&uri).is_ok());
    }

    #[test]
    fn test_registry_rejects_unknown_scheme() {
        let registry = ResourceStoreRegistry::with_defaults();
        let uri = ResourceUri::parse("ftp://host/x.properties").unwrap();
        assert!(matches!(
            registry.for_uri(&uri),
            Err(StoreError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn test_handle_reader() {
        let handle = ResourceHandle::new("memory:/x", b"a=1\nb=2\n".to_vec());
        let lines: Vec<String> = handle.reader().lines().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["a=1", "b=2"]);
    }
}
