//! Resource store error types.

use thiserror::Error;

/// Errors raised by resource stores and resource bindings.
///
/// `NotFound` is a distinguished condition: callers such as the provider
/// treat a missing resource differently from other I/O failures.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The resource does not exist.
    #[error("resource not found: {uri}")]
    NotFound { uri: String },

    /// Any other I/O failure while reading or writing the resource.
    #[error("i/o failure on resource {uri}")]
    Io {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    /// The identifier could not be parsed into a scheme and path.
    #[error("invalid resource uri {uri:?}: {detail}")]
    InvalidUri { uri: String, detail: &'static str },

    /// No resource store is registered for the identifier's scheme.
    #[error("no resource store registered for scheme {scheme:?}")]
    UnsupportedScheme { scheme: String },

    /// The resource content is not valid UTF-8 text.
    #[error("resource {uri} is not valid utf-8")]
    NotUtf8 { uri: String },
}

impl StoreError {
    /// Whether this is the distinguished not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub(crate) fn io(uri: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound {
                uri: uri.to_string(),
            }
        } else {
            StoreError::Io {
                uri: uri.to_string(),
                source,
            }
        }
    }
}
