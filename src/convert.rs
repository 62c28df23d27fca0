//! Field text to typed value conversion.
//!
//! Default conversion is the [`FromField`] trait, implemented for the
//! primitive/basic types eligible for automatic mapping. A per-mapping
//! [`CustomConvert`] implementation can override the default for a single
//! field, e.g. [`DateTimeConverter`] with an explicit format string.
//!
//! Conversion failures are surfaced, never suppressed: malformed number or
//! date text propagates as a [`ConvertError`]. Defaults apply only to
//! missing/empty text during backfill, never here.

use std::any::Any;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

/// Datetime formats tried in order by the default datetime conversions
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// A single field's conversion failure
#[derive(Debug, Clone, Error)]
#[error("cannot convert '{value}' to {target}: {message}")]
pub struct ConvertError {
    /// The raw field text, or `<null>` for a missing/null cell
    pub value: String,
    /// The target type name
    pub target: &'static str,
    pub message: String,
}

impl ConvertError {
    /// Create a conversion error for target type `T`
    pub fn new<T>(raw: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            value: raw.unwrap_or("<null>").to_string(),
            target: std::any::type_name::<T>(),
            message: message.into(),
        }
    }
}

/// Default conversion from raw field text to a typed value
///
/// `raw` is `None` when the cell is null (missing in the source row and
/// backfilled without a configured default). All implementations except
/// `String` and `Option<V>` treat a null or empty cell as a conversion
/// failure.
pub trait FromField: Sized + 'static {
    fn from_field(raw: Option<&str>) -> Result<Self, ConvertError>;
}

fn required<T>(raw: Option<&str>) -> Result<&str, ConvertError> {
    match raw {
        Some(text) if !text.trim().is_empty() => Ok(text.trim()),
        _ => Err(ConvertError::new::<T>(raw, "value is missing or empty")),
    }
}

impl FromField for String {
    fn from_field(raw: Option<&str>) -> Result<Self, ConvertError> {
        Ok(raw.unwrap_or_default().to_string())
    }
}

impl FromField for bool {
    fn from_field(raw: Option<&str>) -> Result<Self, ConvertError> {
        let text = required::<bool>(raw)?;
        if text.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if text.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(ConvertError::new::<bool>(raw, "expected 'true' or 'false'"))
        }
    }
}

impl FromField for char {
    fn from_field(raw: Option<&str>) -> Result<Self, ConvertError> {
        let text = required::<char>(raw)?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(ch),
            _ => Err(ConvertError::new::<char>(raw, "expected a single character")),
        }
    }
}

macro_rules! from_field_via_parse {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromField for $ty {
                fn from_field(raw: Option<&str>) -> Result<Self, ConvertError> {
                    required::<$ty>(raw)?
                        .parse::<$ty>()
                        .map_err(|e| ConvertError::new::<$ty>(raw, e.to_string()))
                }
            }
        )*
    };
}

from_field_via_parse!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl FromField for NaiveDateTime {
    fn from_field(raw: Option<&str>) -> Result<Self, ConvertError> {
        let text = required::<NaiveDateTime>(raw)?;
        parse_datetime(text)
            .ok_or_else(|| ConvertError::new::<NaiveDateTime>(raw, "unrecognized datetime format"))
    }
}

impl FromField for NaiveDate {
    fn from_field(raw: Option<&str>) -> Result<Self, ConvertError> {
        let text = required::<NaiveDate>(raw)?;
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|e| ConvertError::new::<NaiveDate>(raw, e.to_string()))
    }
}

impl FromField for DateTime<Utc> {
    fn from_field(raw: Option<&str>) -> Result<Self, ConvertError> {
        let text = required::<DateTime<Utc>>(raw)?;

        // Try with an explicit offset first, then fall back to naive UTC.
        if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S %z") {
            return Ok(dt.with_timezone(&Utc));
        }
        parse_datetime(text)
            .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
            .ok_or_else(|| ConvertError::new::<DateTime<Utc>>(raw, "unrecognized datetime format"))
    }
}

impl<V: FromField> FromField for Option<V> {
    fn from_field(raw: Option<&str>) -> Result<Self, ConvertError> {
        match raw {
            Some(text) if !text.trim().is_empty() => V::from_field(Some(text)).map(Some),
            _ => Ok(None),
        }
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Conversion override attached to a single field mapping
///
/// Implementations produce a boxed value that is downcast to the target
/// field's declared type at assignment time; producing any other type is a
/// conversion error. This is the pluggable custom-converter slot: one
/// implementation per mapping, consulted instead of [`FromField`].
pub trait CustomConvert: std::fmt::Debug {
    fn convert(&self, raw: Option<&str>) -> Result<Box<dyn Any>, ConvertError>;
}

/// Datetime converter with an optional explicit format string
///
/// Without a format, the default format list is tried in order. Produces a
/// [`NaiveDateTime`].
#[derive(Debug, Clone, Default)]
pub struct DateTimeConverter {
    format: Option<String>,
}

impl DateTimeConverter {
    /// Converter using the default format list
    pub fn new() -> Self {
        Self::default()
    }

    /// Converter using an explicit `chrono` format string, e.g. `%Y%m%d`
    pub fn with_format(format: impl Into<String>) -> Self {
        Self {
            format: Some(format.into()),
        }
    }
}

impl CustomConvert for DateTimeConverter {
    fn convert(&self, raw: Option<&str>) -> Result<Box<dyn Any>, ConvertError> {
        let text = required::<NaiveDateTime>(raw)?;

        let parsed = match &self.format {
            Some(format) => NaiveDateTime::parse_from_str(text, format)
                .ok()
                .or_else(|| {
                    // Date-only formats lack time components; retry as a date.
                    NaiveDate::parse_from_str(text, format)
                        .ok()
                        .and_then(|date| date.and_hms_opt(0, 0, 0))
                })
                .ok_or_else(|| {
                    ConvertError::new::<NaiveDateTime>(
                        raw,
                        format!("text does not match format '{format}'"),
                    )
                })?,
            None => parse_datetime(text).ok_or_else(|| {
                ConvertError::new::<NaiveDateTime>(raw, "unrecognized datetime format")
            })?,
        };

        Ok(Box::new(parsed))
    }
}
