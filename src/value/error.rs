//! Typed conversion error.

use thiserror::Error;

/// Failure to convert between a stored property value and a requested type.
///
/// Conversion is fail-fast: a malformed raw value is an error, never a
/// silent default. "Missing" is represented by `None` one level up, in the
/// typed getters.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// A raw string could not be parsed as the requested kind.
    #[error("cannot parse {raw:?} as {kind}: {detail}")]
    Parse {
        raw: String,
        kind: &'static str,
        detail: String,
    },

    /// The stored variant cannot represent the requested kind.
    #[error("cannot convert a {found} value to {kind}")]
    TypeMismatch {
        found: &'static str,
        kind: &'static str,
    },

    /// A value could not be rendered back to its raw text form.
    #[error("cannot format {kind} value as text: {detail}")]
    Format { kind: &'static str, detail: String },
}

impl ConversionError {
    pub(crate) fn parse(raw: &str, kind: &'static str, detail: impl ToString) -> Self {
        ConversionError::Parse {
            raw: raw.to_string(),
            kind,
            detail: detail.to_string(),
        }
    }

    pub(crate) fn mismatch(found: &'static str, kind: &'static str) -> Self {
        ConversionError::TypeMismatch { found, kind }
    }
}
