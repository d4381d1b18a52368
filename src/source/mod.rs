//! Property sources: the pluggable loaders behind configuration instances.
//!
//! A source knows how to populate a property store from one resource kind
//! and, when the kind supports it, how to render the store back to
//! resource content. Sources are selected by [`SourceRegistry::resolve`],
//! which matches the resource identifier's suffix against a table of
//! descriptors assembled at process start by explicit registration.

mod mainargs;
mod osenv;
mod properties;

pub use mainargs::MainArgsSource;
pub use osenv::OsEnvSource;
pub use properties::PropertiesSource;

use std::collections::BTreeMap;

use crate::configuration::ConfigurationOptions;
use crate::error::{ConfigError, ConfigResult};
use crate::store::{PropertyStore, ResourceHandle, ResourceUri};
use crate::value::{PropertyValue, ValueCodec};

/// A concrete loader/saver for one resource kind.
pub trait PropertySource: Send + Sync + std::fmt::Debug {
    /// The extension suffix this source kind is registered under.
    fn kind(&self) -> &'static str;

    /// Parse the fetched resource content into the property store.
    fn load(&self, resource: &ResourceHandle, properties: &dyn PropertyStore) -> ConfigResult<()>;

    /// Render a store snapshot back to resource content.
    fn save(
        &self,
        snapshot: &BTreeMap<String, PropertyValue>,
        codec: &ValueCodec,
    ) -> ConfigResult<Vec<u8>>;

    /// Whether this source kind can be persisted at all. Sources over
    /// ambient process state (environment, arguments) are read-only.
    fn storage_allowed(&self) -> bool {
        true
    }
}

/// Constructor invoked when a descriptor's extension matches.
pub type SourceConstructor =
    fn(&str, &ResourceUri, &ConfigurationOptions) -> ConfigResult<Box<dyn PropertySource>>;

/// Maps a declared extension to a source constructor.
#[derive(Clone, Copy)]
pub struct PluginDescriptor {
    pub extension: &'static str,
    pub constructor: SourceConstructor,
}

/// Read-mostly table of registered source kinds.
///
/// Matching is first-match on a case-insensitive suffix of the resource
/// path; keep extensions mutually exclusive by suffix to make the order
/// irrelevant.
pub struct SourceRegistry {
    descriptors: Vec<PluginDescriptor>,
}

impl SourceRegistry {
    /// An empty registry with no source kinds.
    pub fn empty() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }

    /// A registry with the bundled source kinds.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(PropertiesSource::descriptor());
        registry.register(OsEnvSource::descriptor());
        registry.register(MainArgsSource::descriptor());
        registry
    }

    pub fn register(&mut self, descriptor: PluginDescriptor) {
        self.descriptors.push(descriptor);
    }

    /// Extensions currently registered, in registration order.
    pub fn extensions(&self) -> Vec<&'static str> {
        self.descriptors
            .iter()
            .map(|descriptor| descriptor.extension)
            .collect()
    }

    /// Select and construct the source for a resource identifier.
    pub fn resolve(
        &self,
        name: &str,
        uri: &ResourceUri,
        options: &ConfigurationOptions,
    ) -> ConfigResult<Box<dyn PropertySource>> {
        let path = uri.path().to_ascii_lowercase();
        for descriptor in &self.descriptors {
            if path.ends_with(&descriptor.extension.to_ascii_lowercase()) {
                return (descriptor.constructor)(name, uri, options);
            }
        }
        Err(ConfigError::UnmanagedResource {
            uri: uri.raw().to_string(),
        })
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(raw: &str) -> ResourceUri {
        ResourceUri::parse(raw).unwrap()
    }

    #[test]
    fn test_resolve_by_extension() {
        let registry = SourceRegistry::with_defaults();
        let options = ConfigurationOptions::default();
        let source = registry
            .resolve("app", &uri("file:/etc/app.properties"), &options)
            .unwrap();
        assert_eq!(source.kind(), PropertiesSource::EXTENSION);
    }

    #[test]
    fn test_resolve_is_case_insensitive_on_the_path() {
        let registry = SourceRegistry::with_defaults();
        let options = ConfigurationOptions::default();
        let source = registry
            .resolve("app", &uri("file:/etc/APP.PROPERTIES"), &options)
            .unwrap();
        assert_eq!(source.kind(), PropertiesSource::EXTENSION);
    }

    #[test]
    fn test_resolve_synthetic_kinds() {
        let registry = SourceRegistry::with_defaults();
        let options = ConfigurationOptions::default();
        assert_eq!(
            registry
                .resolve("env", &uri("memory:/internal/env.osenv"), &options)
                .unwrap()
                .kind(),
            OsEnvSource::EXTENSION
        );
        assert_eq!(
            registry
                .resolve("args", &uri("memory:/internal/args.mainargs"), &options)
                .unwrap()
                .kind(),
            MainArgsSource::EXTENSION
        );
    }

    #[test]
    fn test_unmatched_suffix_is_unmanaged() {
        let registry = SourceRegistry::with_defaults();
        let options = ConfigurationOptions::default();
        let err = registry
            .resolve("app", &uri("file:/etc/app.yaml"), &options)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnmanagedResource { .. }));
    }

    #[test]
    fn test_empty_registry_manages_nothing() {
        let registry = SourceRegistry::empty();
        let options = ConfigurationOptions::default();
        assert!(registry
            .resolve("app", &uri("file:/etc/app.properties"), &options)
            .is_err());
        assert!(registry.extensions().is_empty());
    }
}
