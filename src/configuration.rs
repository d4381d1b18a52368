//! The configuration instance: property access, typed getters, lifecycle.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use jiff::civil::DateTime;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::events::{
    ChangeEvent, ChangeTracker, ConfigurationListener, FireReport, diff_snapshots,
};
use crate::key::{KEY_ROOT, KEY_SEPARATOR, flatten_key, normalize_key};
use crate::source::PropertySource;
use crate::store::{MemoryPropertyStore, PropertyStore, ResourceBinding};
use crate::value::{
    DEFAULT_DATE_FORMAT, DEFAULT_MULTI_VALUES_SEPARATOR, PropertyKind, PropertyValue, ValueCodec,
};

/// Tunables of one configuration instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationOptions {
    /// Whether `store` may persist the instance back to its resource.
    pub storage_allowed: bool,
    /// Whether `set_property`/`remove_property` are permitted.
    pub update_allowed: bool,
    /// Separator between the items of a multi-value property.
    pub multi_values_separator: String,
    /// strftime-style pattern date properties parse and format with.
    pub date_format: String,
    /// Argument vector consumed by the main-args source.
    pub main_args: Vec<String>,
}

impl Default for ConfigurationOptions {
    fn default() -> Self {
        Self {
            storage_allowed: true,
            update_allowed: true,
            multi_values_separator: DEFAULT_MULTI_VALUES_SEPARATOR.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            main_args: Vec::new(),
        }
    }
}

/// One named configuration over a property store and a resource binding.
///
/// Property reads and writes go straight to the concurrent store; the
/// lifecycle transitions (`load`/`store`/`unload`/`reload`) serialize on an
/// instance-level mutex so two concurrent reloads cannot interleave.
pub struct Configuration {
    name: String,
    options: ConfigurationOptions,
    codec: ValueCodec,
    source: Box<dyn PropertySource>,
    properties: Arc<dyn PropertyStore>,
    binding: ResourceBinding,
    tracker: ChangeTracker,
    lifecycle: Mutex<()>,
}

impl Configuration {
    /// Build an instance over its own in-memory property store.
    pub fn new(
        name: impl Into<String>,
        source: Box<dyn PropertySource>,
        binding: ResourceBinding,
        options: ConfigurationOptions,
    ) -> Self {
        Self::with_store(
            name,
            source,
            binding,
            options,
            Arc::new(MemoryPropertyStore::new()),
        )
    }

    /// Build an instance over an externally supplied property store.
    pub fn with_store(
        name: impl Into<String>,
        source: Box<dyn PropertySource>,
        binding: ResourceBinding,
        options: ConfigurationOptions,
        properties: Arc<dyn PropertyStore>,
    ) -> Self {
        let codec = ValueCodec::new(
            options.multi_values_separator.clone(),
            options.date_format.clone(),
        );
        Self {
            name: name.into(),
            options,
            codec,
            source,
            properties,
            binding,
            tracker: ChangeTracker::new(),
            lifecycle: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource_uri(&self) -> &str {
        self.binding.uri().raw()
    }

    pub fn options(&self) -> &ConfigurationOptions {
        &self.options
    }

    pub fn codec(&self) -> &ValueCodec {
        &self.codec
    }

    pub fn is_loaded(&self) -> bool {
        self.binding.is_loaded()
    }

    /// Whether `store` is permitted: the instance option and the source
    /// kind must both allow it.
    pub fn is_storable(&self) -> bool {
        self.options.storage_allowed && self.source.storage_allowed()
    }

    pub fn is_updatable(&self) -> bool {
        self.options.update_allowed
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Fetch the resource and populate the property store.
    ///
    /// Only valid while unloaded; loading twice without an intervening
    /// `unload` is an illegal state, not a no-op.
    pub fn load(&self) -> ConfigResult<()> {
        let _guard = self.lifecycle.lock();
        self.load_locked()
    }

    fn load_locked(&self) -> ConfigResult<()> {
        if self.binding.is_loaded() {
            return Err(ConfigError::illegal_state(
                &self.name,
                "load",
                "already loaded",
            ));
        }
        let handle = self
            .binding
            .fetch()
            .map_err(|e| ConfigError::unavailable(&self.name, self.resource_uri(), e))?;
        match self.source.load(&handle, self.properties.as_ref()) {
            Ok(()) => {
                tracing::info!(
                    configuration = %self.name,
                    resource = %self.resource_uri(),
                    count = self.properties.len(),
                    "configuration loaded"
                );
                Ok(())
            }
            Err(e) => {
                // a half-parsed store must not look loaded
                self.properties.remove_all();
                self.binding.release();
                Err(e)
            }
        }
    }

    /// Persist current store contents back through the binding.
    pub fn store(&self) -> ConfigResult<()> {
        let _guard = self.lifecycle.lock();
        if !self.binding.is_loaded() {
            return Err(ConfigError::illegal_state(&self.name, "store", "not loaded"));
        }
        if !self.is_storable() {
            return Err(ConfigError::illegal_state(
                &self.name,
                "store",
                "storage is not allowed",
            ));
        }
        let content = self
            .source
            .save(&self.properties.snapshot(), &self.codec)?;
        self.binding
            .persist(&content)
            .map_err(|e| ConfigError::unavailable(&self.name, self.resource_uri(), e))?;
        tracing::info!(
            configuration = %self.name,
            resource = %self.resource_uri(),
            "configuration stored"
        );
        Ok(())
    }

    /// Clear all properties, release the binding and notify listeners.
    pub fn unload(&self) -> ConfigResult<()> {
        let _guard = self.lifecycle.lock();
        if !self.binding.is_loaded() {
            return Err(ConfigError::illegal_state(
                &self.name,
                "unload",
                "not loaded",
            ));
        }
        self.properties.remove_all();
        self.binding.release();
        self.tracker.fire_unload(&self.name);
        tracing::info!(configuration = %self.name, "configuration unloaded");
        Ok(())
    }

    /// Unload and load again, recording a change event for every observed
    /// difference.
    ///
    /// The internal unload bypasses the unload notification; listeners see
    /// the reload purely as the diff events. The instance is loaded again
    /// when this returns successfully.
    pub fn reload(&self) -> ConfigResult<()> {
        let _guard = self.lifecycle.lock();
        if !self.binding.is_loaded() {
            return Err(ConfigError::illegal_state(
                &self.name,
                "reload",
                "not loaded",
            ));
        }
        let before = self.properties.snapshot();
        self.properties.remove_all();
        self.binding.release();
        self.load_locked()?;

        let after = self.properties.snapshot();
        let events = diff_snapshots(&self.name, &before, &after);
        tracing::info!(
            configuration = %self.name,
            resource = %self.resource_uri(),
            changes = events.len(),
            "configuration reloaded"
        );
        for event in events {
            self.tracker.record(event);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Property access
    // ------------------------------------------------------------------

    /// The raw stored value under a key, if any.
    pub fn get_property(&self, key: &str) -> Option<PropertyValue> {
        self.properties.get(&normalize_key(key))
    }

    /// Store a value, recording a Create or Update event.
    pub fn set_property(
        &self,
        key: &str,
        value: impl Into<PropertyValue>,
    ) -> ConfigResult<()> {
        if !self.is_updatable() {
            return Err(ConfigError::illegal_state(
                &self.name,
                "set_property",
                "updates are not allowed",
            ));
        }
        let key = normalize_key(key);
        let value = value.into();
        match self.properties.put(&key, value.clone()) {
            None => self
                .tracker
                .record(ChangeEvent::created(&self.name, &key, value)),
            Some(old) => self
                .tracker
                .record(ChangeEvent::updated(&self.name, &key, old, value)),
        }
        Ok(())
    }

    /// Remove a key, recording a Remove event when a value was present.
    /// Returns whether a value was removed.
    pub fn remove_property(&self, key: &str) -> ConfigResult<bool> {
        if !self.is_updatable() {
            return Err(ConfigError::illegal_state(
                &self.name,
                "remove_property",
                "updates are not allowed",
            ));
        }
        let key = normalize_key(key);
        match self.properties.remove(&key) {
            Some(old) => {
                self.tracker
                    .record(ChangeEvent::removed(&self.name, &key, old));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.properties.get(&normalize_key(key)).is_some()
    }

    // ------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------

    /// Typed value under a key. `Ok(None)` when absent; a stored value the
    /// requested type cannot parse is an error, never a silent default.
    pub fn get<T: PropertyKind>(&self, key: &str) -> ConfigResult<Option<T>> {
        let key = normalize_key(key);
        match self.properties.get(&key) {
            None => Ok(None),
            Some(value) => self
                .codec
                .value_of(&value)
                .map(Some)
                .map_err(|e| ConfigError::conversion(&self.name, &key, e)),
        }
    }

    /// Typed value with a default for the absent case only; conversion
    /// failures still propagate.
    pub fn get_or<T: PropertyKind>(&self, key: &str, default: T) -> ConfigResult<T> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Typed value under a key that must exist.
    pub fn require<T: PropertyKind>(&self, key: &str) -> ConfigResult<T> {
        self.get(key)?.ok_or_else(|| ConfigError::PropertyNotFound {
            name: self.name.clone(),
            key: normalize_key(key),
        })
    }

    /// Ordered multi-value reading of a key. `Ok(None)` when absent.
    pub fn get_list<T: PropertyKind>(&self, key: &str) -> ConfigResult<Option<Vec<T>>> {
        let key = normalize_key(key);
        match self.properties.get(&key) {
            None => Ok(None),
            Some(value) => self
                .codec
                .values_of(&value)
                .map(Some)
                .map_err(|e| ConfigError::conversion(&self.name, &key, e)),
        }
    }

    pub fn get_string(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get(key)
    }

    pub fn get_string_or(&self, key: &str, default: &str) -> ConfigResult<String> {
        self.get_or(key, default.to_string())
    }

    pub fn get_string_list(&self, key: &str) -> ConfigResult<Option<Vec<String>>> {
        self.get_list(key)
    }

    pub fn get_boolean(&self, key: &str) -> ConfigResult<Option<bool>> {
        self.get(key)
    }

    pub fn get_boolean_or(&self, key: &str, default: bool) -> ConfigResult<bool> {
        self.get_or(key, default)
    }

    pub fn get_boolean_list(&self, key: &str) -> ConfigResult<Option<Vec<bool>>> {
        self.get_list(key)
    }

    pub fn get_integer(&self, key: &str) -> ConfigResult<Option<i64>> {
        self.get(key)
    }

    pub fn get_integer_or(&self, key: &str, default: i64) -> ConfigResult<i64> {
        self.get_or(key, default)
    }

    pub fn get_integer_list(&self, key: &str) -> ConfigResult<Option<Vec<i64>>> {
        self.get_list(key)
    }

    pub fn get_float(&self, key: &str) -> ConfigResult<Option<f64>> {
        self.get(key)
    }

    pub fn get_float_or(&self, key: &str, default: f64) -> ConfigResult<f64> {
        self.get_or(key, default)
    }

    pub fn get_float_list(&self, key: &str) -> ConfigResult<Option<Vec<f64>>> {
        self.get_list(key)
    }

    pub fn get_decimal(&self, key: &str) -> ConfigResult<Option<BigDecimal>> {
        self.get(key)
    }

    pub fn get_decimal_or(&self, key: &str, default: BigDecimal) -> ConfigResult<BigDecimal> {
        self.get_or(key, default)
    }

    pub fn get_decimal_list(&self, key: &str) -> ConfigResult<Option<Vec<BigDecimal>>> {
        self.get_list(key)
    }

    pub fn get_date(&self, key: &str) -> ConfigResult<Option<DateTime>> {
        self.get(key)
    }

    pub fn get_date_or(&self, key: &str, default: DateTime) -> ConfigResult<DateTime> {
        self.get_or(key, default)
    }

    pub fn get_date_list(&self, key: &str) -> ConfigResult<Option<Vec<DateTime>>> {
        self.get_list(key)
    }

    // ------------------------------------------------------------------
    // Keys and roots
    // ------------------------------------------------------------------

    /// Every stored key, sorted.
    pub fn key_set(&self) -> BTreeSet<String> {
        self.key_set_under(KEY_ROOT)
    }

    /// Every stored key under a prefix, sorted.
    pub fn key_set_under(&self, prefix: &str) -> BTreeSet<String> {
        let prefix = normalize_key(prefix);
        self.properties
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(&prefix))
            .collect()
    }

    /// First-level segment names under the root.
    pub fn roots(&self) -> BTreeSet<String> {
        self.roots_under(KEY_ROOT)
    }

    /// First-level segment names under a prefix.
    pub fn roots_under(&self, prefix: &str) -> BTreeSet<String> {
        let prefix = normalize_key(prefix);
        let mut roots = BTreeSet::new();
        for key in self.properties.keys() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                if let Some(root) = rest.split(KEY_SEPARATOR).find(|segment| !segment.is_empty())
                {
                    roots.insert(root.to_string());
                }
            }
        }
        roots
    }

    pub fn contains_root(&self, root: &str, prefix: &str) -> bool {
        self.roots_under(prefix).contains(root)
    }

    // ------------------------------------------------------------------
    // Listeners and change events
    // ------------------------------------------------------------------

    pub fn add_listener(&self, listener: Arc<dyn ConfigurationListener>) {
        self.tracker.add_listener(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn ConfigurationListener>) -> bool {
        self.tracker.remove_listener(listener)
    }

    /// Replay all queued change events to every listener and clear the
    /// queue.
    pub fn fire_changes(&self) -> FireReport {
        self.tracker.fire_all(&self.name, self.resource_uri())
    }

    /// Number of change events queued and not yet fired.
    pub fn pending_changes(&self) -> usize {
        self.tracker.pending()
    }

    // ------------------------------------------------------------------
    // Export, merge, extract
    // ------------------------------------------------------------------

    /// Render the whole store to flat dotted `key=value` form.
    pub fn to_flat_map(&self) -> ConfigResult<BTreeMap<String, String>> {
        let mut out = BTreeMap::new();
        for (key, value) in self.properties.snapshot() {
            let raw = self
                .codec
                .to_raw(&value)
                .map_err(|e| ConfigError::conversion(&self.name, &key, e))?;
            out.insert(flatten_key(&key), raw);
        }
        Ok(out)
    }

    /// Copy every property of another configuration into this one,
    /// recording change events as usual.
    pub fn merge_from(&self, other: &Configuration) -> ConfigResult<()> {
        for key in other.key_set() {
            if let Some(value) = other.properties.get(&key) {
                self.set_property(&key, value)?;
            }
        }
        Ok(())
    }

    /// Copy the subtree under `prefix` into another configuration with the
    /// prefix stripped.
    pub fn extract_into(&self, prefix: &str, out: &Configuration) -> ConfigResult<()> {
        let prefix = normalize_key(prefix);
        for key in self.key_set() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                let rest = rest.trim_start_matches(KEY_SEPARATOR);
                if rest.is_empty() {
                    continue;
                }
                if let Some(value) = self.properties.get(&key) {
                    out.set_property(rest, value)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("name", &self.name)
            .field("resource_uri", &self.resource_uri())
            .field("loaded", &self.is_loaded())
            .field("properties", &self.properties.len())
            .finish()
    }
}
