//! Binding between a configuration instance and its backing resource.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::store::{ResourceHandle, ResourceStore, ResourceUri, StoreError};

/// Pairs a resource identifier with its loaded state and store handle.
///
/// Owned exclusively by one configuration instance, which serializes the
/// lifecycle transitions around it; the loaded flag itself is atomic so
/// `is_loaded` stays cheap for concurrent readers.
pub struct ResourceBinding {
    uri: ResourceUri,
    store: Arc<dyn ResourceStore>,
    loaded: AtomicBool,
}

impl ResourceBinding {
    pub fn new(uri: ResourceUri, store: Arc<dyn ResourceStore>) -> Self {
        Self {
            uri,
            store,
            loaded: AtomicBool::new(false),
        }
    }

    pub fn uri(&self) -> &ResourceUri {
        &self.uri
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Fetch the resource content and mark the binding loaded.
    pub fn fetch(&self) -> Result<ResourceHandle, StoreError> {
        let handle = self.store.get(&self.uri)?;
        self.loaded.store(true, Ordering::Release);
        Ok(handle)
    }

    /// Persist content back to the resource.
    pub fn persist(&self, content: &[u8]) -> Result<(), StoreError> {
        self.store.put(&self.uri, content)
    }

    /// Release the resource and mark the binding unloaded.
    pub fn release(&self) {
        self.loaded.store(false, Ordering::Release);
    }

    pub fn exists(&self) -> Result<bool, StoreError> {
        self.store.exists(&self.uri)
    }
}
