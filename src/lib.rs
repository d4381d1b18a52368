//! confkit — hierarchical, typed configuration over heterogeneous flat
//! property sources.
//!
//! The engine gives every property source (files, OS environment,
//! command-line arguments) one canonical view: keys normalize to a rooted
//! hierarchical form, values convert through typed accessors, every
//! mutation is tracked as an ordered change event, and named configuration
//! instances are managed as singletons by a provider.
//!
//! # Example
//!
//! ```no_run
//! use confkit::{ConfigResult, ConfigurationProvider};
//!
//! fn main() -> ConfigResult<()> {
//!     let provider = ConfigurationProvider::new();
//!     let app = provider.provide("app", "file:/etc/demo/app.properties")?;
//!
//!     // flat and rooted key syntaxes are equivalent
//!     let name = app.get_string_or("app.name", "unnamed")?;
//!     let workers = app.get_integer_or("//app/workers", 4)?;
//!     let libs = app.get_string_list("//app/libs")?.unwrap_or_default();
//!
//!     println!("{name}: {workers} workers, {} libs", libs.len());
//!
//!     // mutations queue change events; fire_changes replays and drains
//!     app.set_property("app.workers", workers + 1)?;
//!     let report = app.fire_changes();
//!     assert_eq!(report.total(), 1);
//!     Ok(())
//! }
//! ```

pub mod configuration;
pub mod error;
pub mod events;
pub mod key;
pub mod provider;
pub mod source;
pub mod store;
pub mod value;

pub use configuration::{Configuration, ConfigurationOptions};
pub use error::{ConfigError, ConfigResult};
pub use events::{ChangeEvent, ChangeKind, ChangeTracker, ConfigurationListener, FireReport};
pub use key::normalize_key;
pub use provider::{CONFIGURATIONS_ENV, ConfigurationProvider, ConfigurationRegistry};
pub use source::{PluginDescriptor, PropertySource, SourceRegistry};
pub use store::{
    MemoryPropertyStore, PropertyStore, ResourceBinding, ResourceHandle, ResourceStore,
    ResourceStoreRegistry, ResourceUri, StoreError,
};
pub use value::{ConversionError, PropertyKind, PropertyValue, ValueCodec};
