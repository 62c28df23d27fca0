//! Delimited Text Library
//!
//! A Rust library for parsing delimited (CSV-like) text and exposing it as
//! typed records.
//!
//! This library provides tools for:
//! - Tokenizing physical lines into fields under quoting/escaping rules
//! - Pulling records from any line source with comment skipping
//! - Resolving headers, synthetic columns, and positional default values
//! - Mapping rows onto typed record structs by index, name, or auto-matching
//! - Converting field text to typed values with pluggable custom converters
//! - Exposing mapped rows through a generic forward-only tabular cursor

pub mod config;
pub mod convert;
pub mod data_reader;
pub mod mapping;
pub mod parser;
pub mod reader;
pub mod row;
pub mod tokenizer;

// Re-export commonly used types
pub use config::ReaderConfig;
pub use convert::{ConvertError, CustomConvert, DateTimeConverter, FromField};
pub use data_reader::{ColumnSchema, DelimitedTextDataReader};
pub use mapping::{DelimitedRecord, FieldMapping, FieldSpec, FieldView};
pub use parser::DelimitedTextParser;
pub use reader::{DelimitedTextReader, Records};
pub use row::Row;

/// Result type alias for delimited text operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for delimited text operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed while pulling lines from the source
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Record or field data accessed before a successful read
    #[error("read must be invoked before data can be accessed")]
    ReadRequired,

    /// An explicit name-based mapping could not be resolved against the header
    #[error("the field '{field}' could not be mapped to column '{column}'")]
    Mapping { field: String, column: String },

    /// Field text could not be converted to the target field's type
    #[error("conversion failed for field '{field}'")]
    Conversion {
        field: String,
        #[source]
        source: convert::ConvertError,
    },

    /// A mapping was registered for a field the target record does not declare
    #[error("record type '{record}' has no field named '{field}'")]
    UnknownField { record: &'static str, field: String },

    /// Configuration error
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a mapping error for an unresolved column name
    pub fn mapping(field: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Mapping {
            field: field.into(),
            column: column.into(),
        }
    }

    /// Create a conversion error for a named target field
    pub fn conversion(field: impl Into<String>, source: convert::ConvertError) -> Self {
        Self::Conversion {
            field: field.into(),
            source,
        }
    }

    /// Create an unknown-field error
    pub fn unknown_field(record: &'static str, field: impl Into<String>) -> Self {
        Self::UnknownField {
            record,
            field: field.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}
