//! Error taxonomy of the configuration engine.
//!
//! Every error carries enough context (configuration name, key, resource
//! identifier) to diagnose without a stack trace. Nothing is retried
//! internally: illegal-state and unmanaged-resource errors are programmer
//! errors surfaced immediately, resource and parse failures are
//! environment errors the caller may fix and retry at a higher level.

use thiserror::Error;

use crate::store::StoreError;
use crate::value::ConversionError;

/// Errors surfaced by the configuration engine.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Named configuration absent from the registry.
    #[error("configuration not found: {name}")]
    NotFound { name: String },

    /// A required property is absent.
    #[error("property {key} not found in configuration {name}")]
    PropertyNotFound { name: String, key: String },

    /// Backing resource missing or unreachable.
    #[error("resource {uri} unavailable for configuration {name}")]
    ResourceUnavailable {
        name: String,
        uri: String,
        #[source]
        source: StoreError,
    },

    /// The resource content could not be parsed by its source.
    #[error("malformed resource {uri} for configuration {name}: {detail}")]
    MalformedResource {
        name: String,
        uri: String,
        detail: String,
    },

    /// Operation invoked in a lifecycle state that forbids it.
    #[error("illegal state in configuration {name}: cannot {operation} ({detail})")]
    IllegalState {
        name: String,
        operation: &'static str,
        detail: &'static str,
    },

    /// A typed accessor could not parse the stored raw value.
    #[error("cannot convert property {key} of configuration {name}")]
    Conversion {
        name: String,
        key: String,
        #[source]
        source: ConversionError,
    },

    /// No registered source matches the resource identifier's suffix.
    #[error("no configuration source manages resource {uri}")]
    UnmanagedResource { uri: String },

    /// Resource store failure outside the scope of one named configuration.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ConfigError {
    pub(crate) fn illegal_state(name: &str, operation: &'static str, detail: &'static str) -> Self {
        ConfigError::IllegalState {
            name: name.to_string(),
            operation,
            detail,
        }
    }

    pub(crate) fn conversion(name: &str, key: &str, source: ConversionError) -> Self {
        ConfigError::Conversion {
            name: name.to_string(),
            key: key.to_string(),
            source,
        }
    }

    pub(crate) fn malformed(name: &str, uri: &str, detail: impl ToString) -> Self {
        ConfigError::MalformedResource {
            name: name.to_string(),
            uri: uri.to_string(),
            detail: detail.to_string(),
        }
    }

    pub(crate) fn unavailable(name: &str, uri: &str, source: StoreError) -> Self {
        ConfigError::ResourceUnavailable {
            name: name.to_string(),
            uri: uri.to_string(),
            source,
        }
    }
}

/// Result alias used across the crate.
pub type ConfigResult<T> = Result<T, ConfigError>;
