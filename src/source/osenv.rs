//! Operating-system environment variable source (read-only).

use std::collections::BTreeMap;

use crate::error::{ConfigError, ConfigResult};
use crate::key::normalize_key;
use crate::source::{PluginDescriptor, PropertySource};
use crate::store::{PropertyStore, ResourceHandle};
use crate::value::{PropertyValue, ValueCodec};

/// Exposes every process environment variable as a property.
///
/// The resource identifier is synthetic (`memory:/internal/<name>.osenv`);
/// its content is ignored, the environment is read at load time.
#[derive(Debug)]
pub struct OsEnvSource {
    name: String,
}

impl OsEnvSource {
    pub const EXTENSION: &'static str = ".osenv";

    pub fn descriptor() -> PluginDescriptor {
        PluginDescriptor {
            extension: Self::EXTENSION,
            constructor: |name, _uri, _options| {
                Ok(Box::new(OsEnvSource {
                    name: name.to_string(),
                }))
            },
        }
    }
}

impl PropertySource for OsEnvSource {
    fn kind(&self) -> &'static str {
        Self::EXTENSION
    }

    fn load(&self, _resource: &ResourceHandle, properties: &dyn PropertyStore) -> ConfigResult<()> {
        for (key, value) in std::env::vars() {
            properties.put(&normalize_key(&key), PropertyValue::Str(value));
        }
        tracing::debug!(
            configuration = %self.name,
            count = properties.len(),
            "environment variables loaded"
        );
        Ok(())
    }

    fn save(
        &self,
        _snapshot: &BTreeMap<String, PropertyValue>,
        _codec: &ValueCodec,
    ) -> ConfigResult<Vec<u8>> {
        Err(ConfigError::illegal_state(
            &self.name,
            "store",
            "environment source is read-only",
        ))
    }

    fn storage_allowed(&self) -> bool {
        false
    }
}
