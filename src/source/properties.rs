//! Flat `key=value` properties text source.

use std::collections::BTreeMap;

use crate::error::{ConfigError, ConfigResult};
use crate::key::{flatten_key, normalize_key};
use crate::source::{PluginDescriptor, PropertySource};
use crate::store::{PropertyStore, ResourceHandle};
use crate::value::{PropertyValue, ValueCodec};

/// Properties-format source: one `key=value` per line, `#` or `!` comment
/// lines, keys in flat dotted syntax.
#[derive(Debug)]
pub struct PropertiesSource {
    name: String,
    uri: String,
}

impl PropertiesSource {
    pub const EXTENSION: &'static str = ".properties";

    pub fn descriptor() -> PluginDescriptor {
        PluginDescriptor {
            extension: Self::EXTENSION,
            constructor: |name, uri, _options| {
                Ok(Box::new(PropertiesSource {
                    name: name.to_string(),
                    uri: uri.raw().to_string(),
                }))
            },
        }
    }
}

impl PropertySource for PropertiesSource {
    fn kind(&self) -> &'static str {
        Self::EXTENSION
    }

    fn load(&self, resource: &ResourceHandle, properties: &dyn PropertyStore) -> ConfigResult<()> {
        let text = resource
            .text()
            .map_err(|_| ConfigError::malformed(&self.name, &self.uri, "not valid utf-8"))?;

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::malformed(
                    &self.name,
                    &self.uri,
                    format!("line {}: missing '='", index + 1),
                ));
            };
            properties.put(
                &normalize_key(key.trim()),
                PropertyValue::Str(value.trim().to_string()),
            );
        }
        tracing::debug!(
            configuration = %self.name,
            resource = %self.uri,
            count = properties.len(),
            "properties resource loaded"
        );
        Ok(())
    }

    fn save(
        &self,
        snapshot: &BTreeMap<String, PropertyValue>,
        codec: &ValueCodec,
    ) -> ConfigResult<Vec<u8>> {
        let mut out = String::new();
        for (key, value) in snapshot {
            let raw = codec
                .to_raw(value)
                .map_err(|e| ConfigError::conversion(&self.name, key, e))?;
            out.push_str(&flatten_key(key));
            out.push('=');
            out.push_str(&raw);
            out.push('\n');
        }
        Ok(out.into_bytes())
    }
}
