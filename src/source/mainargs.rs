//! Command-line argument source (read-only).

use std::collections::BTreeMap;

use crate::error::{ConfigError, ConfigResult};
use crate::key::normalize_key;
use crate::source::{PluginDescriptor, PropertySource};
use crate::store::{PropertyStore, ResourceHandle};
use crate::value::{PropertyValue, ValueCodec};

/// Exposes `key=value` arguments as properties.
///
/// The argument vector comes from
/// [`main_args`](crate::configuration::ConfigurationOptions::main_args);
/// the resource identifier is synthetic and its content is ignored.
/// Arguments may be written `key=value` or `--key=value`; tokens without
/// `=` are skipped. A `|` inside a value stands for the configured
/// multi-value separator, so list values can be passed without shell
/// quoting (`libs=a.jar|b.jar`).
#[derive(Debug)]
pub struct MainArgsSource {
    name: String,
    args: Vec<String>,
    separator: String,
}

impl MainArgsSource {
    pub const EXTENSION: &'static str = ".mainargs";

    pub fn descriptor() -> PluginDescriptor {
        PluginDescriptor {
            extension: Self::EXTENSION,
            constructor: |name, _uri, options| {
                Ok(Box::new(MainArgsSource {
                    name: name.to_string(),
                    args: options.main_args.clone(),
                    separator: options.multi_values_separator.clone(),
                }))
            },
        }
    }
}

impl PropertySource for MainArgsSource {
    fn kind(&self) -> &'static str {
        Self::EXTENSION
    }

    fn load(&self, _resource: &ResourceHandle, properties: &dyn PropertyStore) -> ConfigResult<()> {
        for arg in &self.args {
            let arg = arg.strip_prefix("--").unwrap_or(arg);
            let Some((key, value)) = arg.split_once('=') else {
                continue;
            };
            let value = value.replace('|', &self.separator);
            properties.put(&normalize_key(key.trim()), PropertyValue::Str(value));
        }
        tracing::debug!(
            configuration = %self.name,
            count = properties.len(),
            "main arguments loaded"
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
            "argument source is read-only",
        ))
    }

    fn storage_allowed(&self) -> bool {
        false
    }
}
