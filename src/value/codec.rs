//! Bidirectional conversion between stored values and typed accessors.

use bigdecimal::BigDecimal;
use jiff::civil::DateTime;
use jiff::fmt::strtime;

use crate::value::{ConversionError, PropertyKind, PropertyValue};

/// Default separator between the items of a multi-value property.
pub const DEFAULT_MULTI_VALUES_SEPARATOR: &str = " ";

/// Default date pattern, ISO-8601 without an offset.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Converts between [`PropertyValue`]s and concrete Rust types.
///
/// The codec owns the two conversion parameters that vary per
/// configuration: the multi-value separator used to split and join list
/// properties, and the date pattern used to parse and format date values.
/// `to_raw` is the left inverse of `value_of` for every supported type.
#[derive(Clone, Debug)]
pub struct ValueCodec {
    multi_values_separator: String,
    date_format: String,
}

impl ValueCodec {
    pub fn new(
        multi_values_separator: impl Into<String>,
        date_format: impl Into<String>,
    ) -> Self {
        Self {
            multi_values_separator: multi_values_separator.into(),
            date_format: date_format.into(),
        }
    }

    pub fn multi_values_separator(&self) -> &str {
        &self.multi_values_separator
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Convert a stored value to the requested type.
    ///
    /// Identity when the stored variant already matches, a parse when the
    /// stored value is a raw string, an error otherwise. Malformed raw
    /// values are an error, never a silent default.
    pub fn value_of<T: PropertyKind>(&self, value: &PropertyValue) -> Result<T, ConversionError> {
        T::from_value(value, self)
    }

    /// Convert a stored value to an ordered sequence of the requested type.
    ///
    /// A raw string splits on the configured separator with one conversion
    /// per token; a stored list converts element-wise; any other variant
    /// yields a single-element sequence.
    pub fn values_of<T: PropertyKind>(
        &self,
        value: &PropertyValue,
    ) -> Result<Vec<T>, ConversionError> {
        match value {
            PropertyValue::List(items) => {
                items.iter().map(|item| T::from_value(item, self)).collect()
            }
            PropertyValue::Str(raw) => raw
                .split(self.multi_values_separator.as_str())
                .filter(|token| !token.is_empty())
                .map(|token| {
                    T::from_value(&PropertyValue::Str(token.to_string()), self)
                })
                .collect(),
            other => Ok(vec![T::from_value(other, self)?]),
        }
    }

    /// Render a stored value back to its raw text form.
    ///
    /// Lists join with the configured separator; dates format with the
    /// configured pattern; numbers and booleans use their canonical form.
    pub fn to_raw(&self, value: &PropertyValue) -> Result<String, ConversionError> {
        match value {
            PropertyValue::Str(s) => Ok(s.clone()),
            PropertyValue::Int(i) => Ok(i.to_string()),
            PropertyValue::Float(x) => Ok(x.to_string()),
            PropertyValue::Decimal(d) => Ok(d.to_string()),
            PropertyValue::Bool(b) => Ok(b.to_string()),
            PropertyValue::Date(date) => self.format_date(date),
            PropertyValue::List(items) => {
                let rendered = items
                    .iter()
                    .map(|item| self.to_raw(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rendered.join(self.multi_values_separator.as_str()))
            }
        }
    }

    /// Join already-raw tokens with the configured separator.
    pub fn join_raw(&self, tokens: &[String]) -> String {
        tokens.join(self.multi_values_separator.as_str())
    }

    /// Parse a raw string against the configured date pattern.
    pub fn parse_date(&self, raw: &str) -> Result<DateTime, ConversionError> {
        DateTime::strptime(&self.date_format, raw)
            .map_err(|e| ConversionError::parse(raw, DateTime::KIND, e))
    }

    /// Format a date with the configured pattern.
    pub fn format_date(&self, date: &DateTime) -> Result<String, ConversionError> {
        strtime::format(&self.date_format, *date).map_err(|e| ConversionError::Format {
            kind: DateTime::KIND,
            detail: e.to_string(),
        })
    }
}

impl Default for ValueCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MULTI_VALUES_SEPARATOR, DEFAULT_DATE_FORMAT)
    }
}

impl PropertyKind for String {
    const KIND: &'static str = "string";

    /// Any stored value serializes to a string, lists included.
    fn from_value(value: &PropertyValue, codec: &ValueCodec) -> Result<Self, ConversionError> {
        codec.to_raw(value)
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Str(self)
    }
}

impl PropertyKind for bool {
    const KIND: &'static str = "boolean";

    fn from_value(value: &PropertyValue, _codec: &ValueCodec) -> Result<Self, ConversionError> {
        match value {
            PropertyValue::Bool(b) => Ok(*b),
            PropertyValue::Str(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(ConversionError::parse(
                    raw,
                    Self::KIND,
                    "expected true or false",
                )),
            },
            other => Err(ConversionError::mismatch(other.kind_name(), Self::KIND)),
        }
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Bool(self)
    }
}

impl PropertyKind for i64 {
    const KIND: &'static str = "integer";

    fn from_value(value: &PropertyValue, _codec: &ValueCodec) -> Result<Self, ConversionError> {
        match value {
            PropertyValue::Int(i) => Ok(*i),
            PropertyValue::Str(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|e| ConversionError::parse(raw, Self::KIND, e)),
            other => Err(ConversionError::mismatch(other.kind_name(), Self::KIND)),
        }
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Int(self)
    }
}

impl PropertyKind for f64 {
    const KIND: &'static str = "float";

    fn from_value(value: &PropertyValue, _codec: &ValueCodec) -> Result<Self, ConversionError> {
        match value {
            PropertyValue::Float(x) => Ok(*x),
            PropertyValue::Int(i) => Ok(*i as f64),
            PropertyValue::Decimal(d) => d
                .to_string()
                .parse::<f64>()
                .map_err(|e| ConversionError::parse(&d.to_string(), Self::KIND, e)),
            PropertyValue::Str(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|e| ConversionError::parse(raw, Self::KIND, e)),
            other => Err(ConversionError::mismatch(other.kind_name(), Self::KIND)),
        }
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Float(self)
    }
}

impl PropertyKind for BigDecimal {
    const KIND: &'static str = "decimal";

    fn from_value(value: &PropertyValue, _codec: &ValueCodec) -> Result<Self, ConversionError> {
        match value {
            PropertyValue::Decimal(d) => Ok(d.clone()),
            PropertyValue::Int(i) => Ok(BigDecimal::from(*i)),
            PropertyValue::Float(x) => BigDecimal::try_from(*x)
                .map_err(|e| ConversionError::parse(&x.to_string(), Self::KIND, e)),
            PropertyValue::Str(raw) => raw
                .trim()
                .parse::<BigDecimal>()
                .map_err(|e| ConversionError::parse(raw, Self::KIND, e)),
            other => Err(ConversionError::mismatch(other.kind_name(), Self::KIND)),
        }
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Decimal(self)
    }
}

impl PropertyKind for DateTime {
    const KIND: &'static str = "date";

    fn from_value(value: &PropertyValue, codec: &ValueCodec) -> Result<Self, ConversionError> {
        match value {
            PropertyValue::Date(d) => Ok(*d),
            PropertyValue::Str(raw) => codec.parse_date(raw),
            other => Err(ConversionError::mismatch(other.kind_name(), Self::KIND)),
        }
    }

    fn into_value(self) -> PropertyValue {
        PropertyValue::Date(self)
    }
}
