//! Reader configuration.
//!
//! Provides the configuration surface for the delimited text reader:
//! delimiter selection, comment skipping, header handling, and
//! mapping-failure tolerance.

use serde::{Deserialize, Serialize};

/// Configuration for [`DelimitedTextReader`](crate::DelimitedTextReader)
///
/// The skip-record predicate is injected on the reader itself via
/// [`set_skip_record`](crate::DelimitedTextReader::set_skip_record) since a
/// closure cannot be part of a serializable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Field delimiter character
    pub delimiter: char,

    /// Discard physical lines starting with `#` instead of parsing them
    pub skip_comments: bool,

    /// Consume the first non-skipped row as the header record
    pub first_row_is_header: bool,

    /// Match header names case-sensitively during mapping resolution
    pub case_sensitive_headers: bool,

    /// Fall back to the mapping's positional index when an explicit
    /// name-based mapping cannot be resolved, instead of failing
    pub ignore_mapping_failures: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            skip_comments: false,
            first_row_is_header: true,
            case_sensitive_headers: false,
            ignore_mapping_failures: false,
        }
    }
}

impl ReaderConfig {
    /// Create configuration with a custom delimiter
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Enable comment skipping (`#` at line start)
    pub fn with_skip_comments(mut self) -> Self {
        self.skip_comments = true;
        self
    }

    /// Set whether the first row is consumed as the header
    pub fn with_first_row_is_header(mut self, first_row_is_header: bool) -> Self {
        self.first_row_is_header = first_row_is_header;
        self
    }

    /// Enable case-sensitive header matching
    pub fn with_case_sensitive_headers(mut self) -> Self {
        self.case_sensitive_headers = true;
        self
    }

    /// Tolerate unresolved name-based mappings by falling back to the
    /// mapping's positional index
    pub fn with_ignore_mapping_failures(mut self) -> Self {
        self.ignore_mapping_failures = true;
        self
    }
}
