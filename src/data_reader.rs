//! Tabular cursor adapter over [`DelimitedTextReader`].
//!
//! [`DelimitedTextDataReader`] presents a delimited stream as a flat,
//! forward-only table: ordinal- and name-addressed cells, per-column null
//! checks, and a column schema derived from the header. Useful when feeding
//! the stream into tabular sinks that expect a cursor rather than typed
//! records.

use std::io::BufRead;

use crate::convert::FromField;
use crate::reader::DelimitedTextReader;
use crate::row::Row;
use crate::{Error, Result};

/// One column's schema entry, derived from the header record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    /// Header name of the column
    pub name: String,
    /// 0-based column position
    pub ordinal: usize,
    /// Whether cells in this column may be null; always true for
    /// delimited text
    pub nullable: bool,
}

/// Forward-only tabular cursor over a delimited stream
///
/// Wraps a configured [`DelimitedTextReader`] and exposes its rows through
/// ordinal and column-name access instead of typed record mapping. The
/// cursor is exhausted once [`read`](Self::read) returns `Ok(false)`.
#[derive(Debug)]
pub struct DelimitedTextDataReader<R> {
    reader: DelimitedTextReader<R>,
    exhausted: bool,
}

impl<R: BufRead> DelimitedTextDataReader<R> {
    /// Wrap an existing reader; its configuration, synthetic columns, and
    /// skip predicate all apply
    pub fn new(reader: DelimitedTextReader<R>) -> Self {
        Self {
            reader,
            exhausted: false,
        }
    }

    /// Advance the cursor to the next row
    pub fn read(&mut self) -> Result<bool> {
        let advanced = self.reader.read()?;
        self.exhausted = !advanced;
        Ok(advanced)
    }

    /// True once the underlying stream has ended
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Number of columns, per the header record; reads the header from the
    /// source when it has not been consumed yet
    pub fn field_count(&mut self) -> Result<usize> {
        Ok(self.reader.field_headers()?.map_or(0, <[String]>::len))
    }

    /// The header name at `ordinal`
    pub fn column_name(&mut self, ordinal: usize) -> Result<Option<&str>> {
        Ok(self
            .reader
            .field_headers()?
            .and_then(|header| header.get(ordinal))
            .map(String::as_str))
    }

    /// The 0-based position of the named column; exact match
    pub fn ordinal(&mut self, name: &str) -> Result<Option<usize>> {
        Ok(self
            .reader
            .field_headers()?
            .and_then(|header| header.iter().position(|h| h == name)))
    }

    /// Convert the current row's cell at `ordinal` to `V`
    ///
    /// Returns `Ok(None)` when the ordinal is beyond the row.
    pub fn get<V: FromField>(&self, ordinal: usize) -> Result<Option<V>> {
        self.reader.get_field(ordinal)
    }

    /// Convert the current row's cell in the named column to `V`
    ///
    /// Returns `Ok(None)` when the column name is not in the header.
    pub fn get_by_name<V: FromField>(&mut self, name: &str) -> Result<Option<V>> {
        match self.ordinal(name)? {
            Some(ordinal) => self.get(ordinal),
            None => Ok(None),
        }
    }

    /// True when the current row's cell at `ordinal` is null, empty, or the
    /// literal text `null`
    pub fn is_null(&self, ordinal: usize) -> Result<bool> {
        let row = self.current_row()?.ok_or(Error::ReadRequired)?;
        Ok(row.is_null(ordinal))
    }

    /// The current row, if the cursor is positioned on one
    pub fn current_row(&self) -> Result<Option<&Row>> {
        self.reader.current_record()
    }

    /// Column schema derived from the header record; available before the
    /// first [`read`](Self::read), and empty when the stream has no header
    pub fn schema(&mut self) -> Result<Vec<ColumnSchema>> {
        let Some(header) = self.reader.field_headers()? else {
            return Ok(Vec::new());
        };
        Ok(header
            .iter()
            .enumerate()
            .map(|(ordinal, name)| ColumnSchema {
                name: name.clone(),
                ordinal,
                nullable: true,
            })
            .collect())
    }

    /// Release the cursor and return the wrapped reader
    pub fn into_inner(self) -> DelimitedTextReader<R> {
        self.reader
    }
}
