//! Registry of live configuration instances and the provider that builds
//! them.
//!
//! The provider is a plain owned value: construct one per process (or one
//! per test) and share it. Nothing here is a global; isolation between
//! providers is complete.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::configuration::{Configuration, ConfigurationOptions};
use crate::error::{ConfigError, ConfigResult};
use crate::source::SourceRegistry;
use crate::store::{ResourceBinding, ResourceStoreRegistry, ResourceUri};

/// Environment variable the provider bootstraps from:
/// `CONFKIT_CONFIGURATIONS="name=uri,name2=uri2"`. An item without `=` is
/// an anonymous declaration whose name is the identifier itself.
pub const CONFIGURATIONS_ENV: &str = "CONFKIT_CONFIGURATIONS";

const CONFIGURATIONS_ITEM_SEPARATOR: char = ',';
const CONFIGURATIONS_VALUE_SEPARATOR: char = '=';

/// Map from configuration name to its one live instance.
///
/// Entries are inserted by [`ConfigurationProvider::provide`] and removed
/// only by explicit unregistration.
#[derive(Default)]
pub struct ConfigurationRegistry {
    entries: DashMap<String, Arc<Configuration>>,
}

impl ConfigurationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Configuration>> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds, loads, registers and serves configuration instances.
pub struct ConfigurationProvider {
    registry: ConfigurationRegistry,
    sources: SourceRegistry,
    resources: ResourceStoreRegistry,
    default_options: ConfigurationOptions,
}

impl ConfigurationProvider {
    /// A provider with the bundled source kinds and resource stores.
    pub fn new() -> Self {
        Self::with_options(ConfigurationOptions::default())
    }

    /// A provider whose instances default to the given options.
    pub fn with_options(default_options: ConfigurationOptions) -> Self {
        Self {
            registry: ConfigurationRegistry::new(),
            sources: SourceRegistry::with_defaults(),
            resources: ResourceStoreRegistry::with_defaults(),
            default_options,
        }
    }

    pub fn registry(&self) -> &ConfigurationRegistry {
        &self.registry
    }

    /// Mutable access to the source table, for registering custom kinds
    /// before the provider is shared.
    pub fn sources_mut(&mut self) -> &mut SourceRegistry {
        &mut self.sources
    }

    /// Mutable access to the resource store table.
    pub fn resources_mut(&mut self) -> &mut ResourceStoreRegistry {
        &mut self.resources
    }

    /// The one live instance for `name`, created and loaded on first use.
    ///
    /// Create-if-absent is serialized per name: under concurrent callers
    /// exactly one instance is constructed and loaded, and every caller
    /// gets that instance. An already-registered but unloaded instance is
    /// loaded before being returned.
    pub fn provide(&self, name: &str, uri: &str) -> ConfigResult<Arc<Configuration>> {
        self.provide_with(name, uri, self.default_options.clone())
    }

    /// Like [`ConfigurationProvider::provide`] with explicit options for
    /// the case where the instance does not exist yet.
    pub fn provide_with(
        &self,
        name: &str,
        uri: &str,
        options: ConfigurationOptions,
    ) -> ConfigResult<Arc<Configuration>> {
        match self.registry.entries.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                let existing = entry.get().clone();
                drop(entry);
                if !existing.is_loaded() {
                    existing.load()?;
                }
                Ok(existing)
            }
            Entry::Vacant(entry) => {
                let configuration = Arc::new(self.build(name, uri, options)?);
                configuration.load()?;
                entry.insert(configuration.clone());
                tracing::info!(
                    configuration = name,
                    resource = uri,
                    "configuration registered"
                );
                Ok(configuration)
            }
        }
    }

    fn build(
        &self,
        name: &str,
        uri: &str,
        options: ConfigurationOptions,
    ) -> ConfigResult<Configuration> {
        let uri = ResourceUri::parse(uri)?;
        let source = self.sources.resolve(name, &uri, &options)?;
        let store = self.resources.for_uri(&uri)?;
        Ok(Configuration::new(
            name,
            source,
            ResourceBinding::new(uri, store),
            options,
        ))
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Unload (when loaded) and remove one configuration.
    pub fn unregister(&self, name: &str) -> ConfigResult<()> {
        let configuration = self
            .registry
            .get(name)
            .ok_or_else(|| ConfigError::NotFound {
                name: name.to_string(),
            })?;
        if configuration.is_loaded() {
            configuration.unload()?;
        }
        self.registry.entries.remove(name);
        tracing::info!(configuration = name, "configuration unregistered");
        Ok(())
    }

    /// Unload and remove every registered configuration.
    pub fn unregister_all(&self) -> ConfigResult<()> {
        for entry in self.registry.entries.iter() {
            if entry.value().is_loaded() {
                entry.value().unload()?;
            }
        }
        self.registry.entries.clear();
        Ok(())
    }

    /// Provide every configuration declared in [`CONFIGURATIONS_ENV`].
    ///
    /// Returns the provided instances; an unset variable provides nothing.
    /// Safe to call repeatedly: already-registered names are served from
    /// the registry.
    pub fn init_from_env(&self) -> ConfigResult<Vec<Arc<Configuration>>> {
        let Ok(declarations) = std::env::var(CONFIGURATIONS_ENV) else {
            return Ok(Vec::new());
        };
        let mut provided = Vec::new();
        for item in declarations.split(CONFIGURATIONS_ITEM_SEPARATOR) {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            let (name, uri) = match item.split_once(CONFIGURATIONS_VALUE_SEPARATOR) {
                Some((name, uri)) => (name.trim(), uri.trim()),
                None => (item, item),
            };
            provided.push(self.provide(name, uri)?);
        }
        Ok(provided)
    }
}

impl Default for ConfigurationProvider {
    fn default() -> Self {
        Self::new()
    }
}
