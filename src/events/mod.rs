//! Configuration change events and listener notification.

mod tracker;

pub use tracker::{ChangeTracker, diff_snapshots};

use serde::{Deserialize, Serialize};

use crate::value::PropertyValue;

/// Kind of a configuration property change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Create,
    Update,
    Remove,
}

/// One recorded mutation of a configuration property.
///
/// `source` is the name of the configuration the change happened on. A
/// Create carries no old value; a Remove carries no new value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub source: String,
    pub key: String,
    pub old_value: Option<PropertyValue>,
    pub new_value: Option<PropertyValue>,
}

impl ChangeEvent {
    pub fn created(source: &str, key: &str, new_value: PropertyValue) -> Self {
        Self {
            kind: ChangeKind::Create,
            source: source.to_string(),
            key: key.to_string(),
            old_value: None,
            new_value: Some(new_value),
        }
    }

    pub fn updated(
        source: &str,
        key: &str,
        old_value: PropertyValue,
        new_value: PropertyValue,
    ) -> Self {
        Self {
            kind: ChangeKind::Update,
            source: source.to_string(),
            key: key.to_string(),
            old_value: Some(old_value),
            new_value: Some(new_value),
        }
    }

    pub fn removed(source: &str, key: &str, old_value: PropertyValue) -> Self {
        Self {
            kind: ChangeKind::Remove,
            source: source.to_string(),
            key: key.to_string(),
            old_value: Some(old_value),
            new_value: None,
        }
    }
}

/// Callbacks a configuration invokes on property changes and unload.
///
/// All callbacks default to no-ops so a listener only implements the ones
/// it cares about.
pub trait ConfigurationListener: Send + Sync {
    fn on_create(&self, _event: &ChangeEvent) {}

    fn on_update(&self, _event: &ChangeEvent) {}

    fn on_remove(&self, _event: &ChangeEvent) {}

    fn on_unload(&self, _source: &str) {}
}

/// Summary of one [`ChangeTracker::fire_all`] drain.
///
/// `deliveries` counts event-to-listener callback invocations, so it is
/// the number of drained events times the number of listeners.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FireReport {
    pub configuration: String,
    pub resource_uri: String,
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub deliveries: usize,
}

impl FireReport {
    /// Total number of events drained.
    pub fn total(&self) -> usize {
        self.created + self.updated + self.removed
    }
}
