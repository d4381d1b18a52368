//! Storable property values and typed conversion.
//!
//! A property is stored as a [`PropertyValue`], a closed set of variants
//! covering strings, numbers, booleans, dates and ordered lists of those.
//! The [`ValueCodec`] converts between stored values and concrete Rust
//! types in both directions; which types are supported is expressed by the
//! [`PropertyKind`] trait.

mod codec;
mod error;

pub use codec::{DEFAULT_DATE_FORMAT, DEFAULT_MULTI_VALUES_SEPARATOR, ValueCodec};
pub use error::ConversionError;

use std::fmt;

use bigdecimal::BigDecimal;
use jiff::civil::DateTime;
use serde::{Deserialize, Serialize};

/// A value storable under a normalized key.
///
/// Closed variant set; conversion pattern-matches on the variant instead of
/// relying on runtime type checks. Flat text sources load everything as
/// `Str` and the typed accessors parse on demand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Str(String),
    Int(i64),
    Float(f64),
    Decimal(BigDecimal),
    Bool(bool),
    Date(DateTime),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Human-readable name of the variant, used in conversion errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertyValue::Str(_) => "string",
            PropertyValue::Int(_) => "integer",
            PropertyValue::Float(_) => "float",
            PropertyValue::Decimal(_) => "decimal",
            PropertyValue::Bool(_) => "boolean",
            PropertyValue::Date(_) => "date",
            PropertyValue::List(_) => "list",
        }
    }

    /// Whether this value is an ordered multi-value list.
    pub fn is_list(&self) -> bool {
        matches!(self, PropertyValue::List(_))
    }
}

impl fmt::Display for PropertyValue {
    /// Diagnostic rendering. The authoritative raw form, which honors the
    /// configured date pattern and multi-value separator, is
    /// [`ValueCodec::to_raw`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Str(s) => f.write_str(s),
            PropertyValue::Int(i) => write!(f, "{i}"),
            PropertyValue::Float(x) => write!(f, "{x}"),
            PropertyValue::Decimal(d) => write!(f, "{d}"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Date(d) => write!(f, "{d}"),
            PropertyValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Str(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Str(value.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<BigDecimal> for PropertyValue {
    fn from(value: BigDecimal) -> Self {
        PropertyValue::Decimal(value)
    }
}

impl From<DateTime> for PropertyValue {
    fn from(value: DateTime) -> Self {
        PropertyValue::Date(value)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(values: Vec<PropertyValue>) -> Self {
        PropertyValue::List(values)
    }
}

/// Types a property value can be converted to and from.
///
/// Implemented for the supported Rust types; the codec dispatches parsing
/// and formatting through this trait. `from_value` receives the codec so
/// that date parsing can honor the configured pattern.
pub trait PropertyKind: Sized {
    /// Name used in conversion error reports.
    const KIND: &'static str;

    /// Convert a stored value into this type.
    fn from_value(value: &PropertyValue, codec: &ValueCodec) -> Result<Self, ConversionError>;

    /// Wrap this type back into a stored value.
    fn into_value(self) -> PropertyValue;
}
