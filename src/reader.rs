//! Delimited text reader: record stream, header resolution, and typed
//! record mapping.
//!
//! [`DelimitedTextReader`] owns the line parser, the header record (real or
//! synthetic), the positional default values, the injectable skip
//! predicate, the current-record state, and the per-shape mapping cache.
//! It is single-threaded and pull-based: every [`read`](DelimitedTextReader::read)
//! replaces the current record in place, so a reader is not safe for
//! concurrent use without external synchronization.

use std::io::BufRead;
use std::marker::PhantomData;

use tracing::{debug, warn};

use crate::config::ReaderConfig;
use crate::convert::FromField;
use crate::mapping::{
    DelimitedRecord, FieldMapping, FieldView, MappingCache, MappingTable, find_header_index,
};
use crate::parser::DelimitedTextParser;
use crate::row::Row;
use crate::{Error, Result};

type SkipPredicate = Box<dyn Fn(&Row) -> bool>;

/// Pull-based reader exposing delimited text as rows and typed records
pub struct DelimitedTextReader<R> {
    parser: DelimitedTextParser<R>,
    config: ReaderConfig,
    skip_record: Option<SkipPredicate>,
    header: Option<Vec<String>>,
    default_values: Vec<Option<String>>,
    current: Option<Row>,
    has_been_read: bool,
    done: bool,
    mappings: MappingCache,
}

impl<R: BufRead> DelimitedTextReader<R> {
    /// Create a reader with the default configuration (comma delimiter,
    /// first row is header)
    pub fn new(source: R) -> Self {
        Self::with_config(source, ReaderConfig::default())
    }

    /// Create a reader with a custom delimiter
    pub fn with_delimiter(source: R, delimiter: char) -> Self {
        Self::with_config(source, ReaderConfig::default().with_delimiter(delimiter))
    }

    /// Create a reader with full configuration
    pub fn with_config(source: R, config: ReaderConfig) -> Self {
        Self {
            parser: DelimitedTextParser::with_config(source, &config),
            config,
            skip_record: None,
            header: None,
            default_values: Vec::new(),
            current: None,
            has_been_read: false,
            done: false,
            mappings: MappingCache::default(),
        }
    }

    /// The reader's configuration
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// The underlying parser's logical line counter
    pub fn line_number(&self) -> u64 {
        self.parser.line_number()
    }

    /// Install a predicate that discards matching rows; applied uniformly
    /// to the header row and data rows, before backfill
    pub fn set_skip_record(&mut self, predicate: impl Fn(&Row) -> bool + 'static) {
        self.skip_record = Some(Box::new(predicate));
    }

    /// Append a synthetic header column with no default value
    pub fn add_column(&mut self, name: impl Into<String>) {
        self.add_column_inner(name.into(), None);
    }

    /// Append a synthetic header column with a default value used to
    /// backfill missing or empty cells at its position
    pub fn add_column_with_default(&mut self, name: impl Into<String>, default: impl Into<String>) {
        self.add_column_inner(name.into(), Some(default.into()));
    }

    fn add_column_inner(&mut self, name: String, default: Option<String>) {
        let header = self.header.get_or_insert_with(Vec::new);
        // Keep defaults positionally aligned when widening a real header.
        while self.default_values.len() < header.len() {
            self.default_values.push(None);
        }
        header.push(name);
        self.default_values.push(default);
    }

    /// The header record, reading it from the source on first access when
    /// configured; `None` in no-header mode with no synthetic columns
    pub fn field_headers(&mut self) -> Result<Option<&[String]>> {
        if self.header.is_none() && self.config.first_row_is_header && !self.has_been_read {
            self.read_header_record()?;
        }
        Ok(self.header.as_deref())
    }

    /// Advance to the next record
    ///
    /// Returns `Ok(true)` when a record is available via
    /// [`current_record`](Self::current_record). Returns `Ok(false)` at
    /// end-of-stream, permanently: further calls are no-ops.
    pub fn read(&mut self) -> Result<bool> {
        if self.done {
            return Ok(false);
        }

        if self.config.first_row_is_header && self.header.is_none() {
            self.read_header_record()?;
        }

        let mut row = self.next_unskipped_row()?;

        if let (Some(row), Some(header)) = (row.as_mut(), self.header.as_deref()) {
            backfill(row, header, &self.default_values);
        }

        self.has_been_read = true;
        if row.is_none() {
            self.done = true;
        }
        self.current = row;
        Ok(self.current.is_some())
    }

    /// The most recently read record
    ///
    /// Fails with [`Error::ReadRequired`] before the first [`read`](Self::read);
    /// returns `Ok(None)` after end-of-stream.
    pub fn current_record(&self) -> Result<Option<&Row>> {
        if !self.has_been_read {
            return Err(Error::ReadRequired);
        }
        Ok(self.current.as_ref())
    }

    /// Convert the current record's cell at `index` to `V`
    ///
    /// Returns `Ok(None)` when the index is out of range or no record is
    /// current.
    pub fn get_field<V: FromField>(&self, index: usize) -> Result<Option<V>> {
        let Some(row) = self.current_record()? else {
            return Ok(None);
        };
        if index >= row.len() {
            return Ok(None);
        }
        V::from_field(row.get(index))
            .map(Some)
            .map_err(|e| Error::conversion(format!("column {index}"), e))
    }

    /// Register an explicit mapping for one of `T`'s declared fields
    ///
    /// The mapping starts with the next positional column index after all
    /// previously mapped indices; chain
    /// [`column_index`](FieldMapping::column_index),
    /// [`column_name`](FieldMapping::column_name), or
    /// [`converter`](FieldMapping::converter) to refine it. Field-name
    /// lookup is case-insensitive. Fails once records of `T` have been
    /// mapped: the per-shape mapping table is frozen for the reader's
    /// lifetime.
    pub fn map_field<T: DelimitedRecord>(&mut self, field: &str) -> Result<&mut FieldMapping> {
        let specs = T::fields();
        let spec_index = specs
            .iter()
            .position(|s| s.name().eq_ignore_ascii_case(field))
            .ok_or_else(|| Error::unknown_field(T::record_name(), field))?;

        let table = self.mappings.table_mut::<T>();
        if table.is_frozen() {
            return Err(Error::configuration(format!(
                "mappings for '{}' are frozen once a record has been mapped",
                T::record_name()
            )));
        }
        Ok(table.register(specs[spec_index].name(), spec_index))
    }

    /// The resolved mapping table for `T`, if any mappings exist yet
    pub fn mapping_table<T: DelimitedRecord>(&self) -> Option<&MappingTable> {
        self.mappings.table::<T>()
    }

    /// Map the current record onto a `T`
    ///
    /// Requires a prior successful [`read`](Self::read). Mapping resolution
    /// runs once per shape and is cached for the reader's lifetime; only
    /// explicit name-based mappings re-resolve against the header on every
    /// call.
    pub fn get_record<T: DelimitedRecord>(&mut self) -> Result<T> {
        if !self.has_been_read || self.current.is_none() {
            return Err(Error::ReadRequired);
        }

        let specs = T::fields();
        let header_mode = self.config.first_row_is_header;
        let case_sensitive = self.config.case_sensitive_headers;
        let row_len = self.current.as_ref().map_or(0, Row::len);

        let table = self.mappings.table_mut::<T>();
        if !table.is_frozen() {
            table.auto_generate(&specs, self.header.as_deref(), header_mode, case_sensitive, row_len);
            table.freeze();
        }

        let Some(table) = self.mappings.table::<T>() else {
            return Err(Error::configuration("mapping table not initialized"));
        };
        let Some(row) = self.current.as_ref() else {
            return Err(Error::ReadRequired);
        };
        let header = self.header.as_deref();

        let mut record = T::default();
        for mapping in table.entries() {
            let index = if mapping.uses_column_name() && self.config.first_row_is_header {
                let column = mapping.mapped_column_name().unwrap_or_default();
                match header.and_then(|h| find_header_index(h, column, case_sensitive)) {
                    Some(index) => index,
                    None if self.config.ignore_mapping_failures => {
                        warn!(
                            field = mapping.field(),
                            column,
                            fallback = mapping.mapped_column_index(),
                            "unresolved column name, falling back to positional index"
                        );
                        mapping.mapped_column_index()
                    }
                    None => return Err(Error::mapping(mapping.field(), column)),
                }
            } else {
                mapping.mapped_column_index()
            };

            let spec = &specs[mapping.spec_index()];
            let view = FieldView::new(spec.name(), row.get(index), mapping.custom_converter());
            spec.assign(&mut record, &view)?;
        }

        Ok(record)
    }

    /// Iterate the remaining records as mapped `T` values
    ///
    /// The iterator is finite and not restartable: it consumes the
    /// underlying stream.
    pub fn records<T: DelimitedRecord>(&mut self) -> Records<'_, R, T> {
        Records {
            reader: self,
            _shape: PhantomData,
        }
    }

    fn read_header_record(&mut self) -> Result<()> {
        let row = self.next_unskipped_row()?;
        self.header = row.map(|r| {
            r.iter()
                .map(|cell| cell.unwrap_or_default().to_string())
                .collect()
        });
        if let Some(header) = &self.header {
            debug!(columns = header.len(), "resolved header record");
        }
        Ok(())
    }

    fn next_unskipped_row(&mut self) -> Result<Option<Row>> {
        loop {
            let Some(fields) = self.parser.read()? else {
                return Ok(None);
            };
            let row = Row::from_fields(fields);
            if let Some(predicate) = &self.skip_record {
                if predicate(&row) {
                    continue;
                }
            }
            return Ok(Some(row));
        }
    }
}

impl<R> std::fmt::Debug for DelimitedTextReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelimitedTextReader")
            .field("config", &self.config)
            .field("header", &self.header)
            .field("current", &self.current)
            .field("has_been_read", &self.has_been_read)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

/// Pull iterator over mapped records; each step yields `Result<T>`
pub struct Records<'r, R, T> {
    reader: &'r mut DelimitedTextReader<R>,
    _shape: PhantomData<T>,
}

impl<R: BufRead, T: DelimitedRecord> Iterator for Records<'_, R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read() {
            Err(e) => Some(Err(e)),
            Ok(false) => None,
            Ok(true) => Some(self.reader.get_record::<T>()),
        }
    }
}

/// Extend or repair a row against the header using positional defaults:
/// short rows grow by one cell per uncovered header position, and empty
/// cells are replaced by their position's default (which may be absent,
/// leaving the cell null)
fn backfill(row: &mut Row, header: &[String], defaults: &[Option<String>]) {
    for position in 0..header.len() {
        let default = defaults.get(position).cloned().flatten();
        if position >= row.len() {
            row.push(default);
        } else if row.is_empty_at(position) {
            row.set(position, default);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::DateTimeConverter;
    use crate::delimited_record;
    use chrono::{NaiveDate, NaiveDateTime};

    #[derive(Debug, Default)]
    struct TestRecord {
        field1: String,
        field2: i32,
        field3: bool,
        field4: NaiveDateTime,
        field5: f64,
    }

    delimited_record!(TestRecord {
        field1, field2, field3, field4, field5
    });

    #[derive(Debug, Default)]
    struct WideRecord {
        field1: String,
        field2: i32,
        field3: bool,
        field4: NaiveDateTime,
        field5: f64,
        field6: String,
        field7: String,
    }

    delimited_record!(WideRecord {
        field1, field2, field3, field4, field5, field6, field7
    });

    #[derive(Debug, Default)]
    struct NamePair {
        name: String,
        other: String,
    }

    delimited_record!(NamePair { name, other });

    fn reader(input: &str) -> DelimitedTextReader<&[u8]> {
        DelimitedTextReader::new(input.as_bytes())
    }

    fn reader_with(input: &str, config: ReaderConfig) -> DelimitedTextReader<&[u8]> {
        DelimitedTextReader::with_config(input.as_bytes(), config)
    }

    fn dec_31_2016() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn get_record_auto_maps_by_header_name() {
        let mut reader = reader(
            "Field1,Field2,Field3,Field4,Field5\nvalue1,100,true,\"2016-12-31\", 25.76\n",
        );
        assert!(reader.read().unwrap());

        let record: TestRecord = reader.get_record().unwrap();
        assert_eq!(record.field1, "value1");
        assert_eq!(record.field2, 100);
        assert!(record.field3);
        assert_eq!(record.field4, dec_31_2016());
        assert_eq!(record.field5, 25.76);
    }

    #[test]
    fn auto_mapping_is_case_insensitive() {
        let mut reader = reader(
            "field1,FIELD2,Field3,Field4,Field5\nvalue1,100,true,2016-12-31, 25.76\n",
        );
        assert!(reader.read().unwrap());

        let record: TestRecord = reader.get_record().unwrap();
        assert_eq!(record.field1, "value1");
        assert_eq!(record.field2, 100);
    }

    #[test]
    fn unmatched_fields_pair_with_unclaimed_columns() {
        // Only field2 and field4 match by name; the rest pair positionally
        // with the unclaimed columns.
        let mut reader =
            reader("F1,Field2,F3,Field4,F5\nvalue1,100,true,2016-12-31, 25.76\n");
        assert!(reader.read().unwrap());

        let record: TestRecord = reader.get_record().unwrap();
        assert_eq!(record.field1, "value1");
        assert_eq!(record.field2, 100);
        assert!(record.field3);
        assert_eq!(record.field4, dec_31_2016());
        assert_eq!(record.field5, 25.76);
    }

    #[test]
    fn fields_beyond_the_header_keep_their_defaults() {
        let mut reader = reader("Field1,Field2\nvalue1,100\n");
        assert!(reader.read().unwrap());

        let record: TestRecord = reader.get_record().unwrap();
        assert_eq!(record.field1, "value1");
        assert_eq!(record.field2, 100);
        assert!(!record.field3);
        assert_eq!(record.field5, 0.0);
    }

    #[test]
    fn records_iterator_maps_every_row_then_ends() {
        let mut reader = reader(
            "Field1,Field2,Field3,Field4,Field5\n\
             value1,100,true,2016-12-31, 25.76\n\
             value2,200,false,2016-01-01, 67.52\n",
        );

        let records: Vec<TestRecord> = reader
            .records()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].field1, "value1");
        assert_eq!(records[1].field2, 200);

        assert!(!reader.read().unwrap());
    }

    #[test]
    fn synthetic_columns_with_defaults_backfill_short_rows() {
        let config = ReaderConfig::default().with_first_row_is_header(false);
        let mut reader = reader_with(
            "Field1,Field2,Field3,Field4,Field5\nvalue1,100,true,\"2016-12-31\", 25.76\n",
            config,
        );
        reader.set_skip_record(|row| row.get(0) == Some("Field1"));
        for name in ["F1", "F2", "F3", "F4", "F5", "F6"] {
            reader.add_column(name);
        }
        reader.add_column_with_default("F7", "defaultVal");

        assert!(reader.read().unwrap());
        let record: WideRecord = reader.get_record().unwrap();
        assert_eq!(record.field1, "value1");
        assert_eq!(record.field2, 100);
        assert!(record.field3);
        assert_eq!(record.field4, dec_31_2016());
        assert_eq!(record.field5, 25.76);
        assert_eq!(record.field6, "");
        assert_eq!(record.field7, "defaultVal");

        assert_eq!(reader.field_headers().unwrap().unwrap()[0], "F1");
    }

    #[test]
    fn backfill_extends_short_rows_with_positional_defaults() {
        let config = ReaderConfig::default().with_first_row_is_header(false);
        let mut reader = reader_with("a,b\n", config);
        reader.add_column("F1");
        reader.add_column("F2");
        reader.add_column_with_default("F3", "X");

        assert!(reader.read().unwrap());
        let row = reader.current_record().unwrap().unwrap();
        assert_eq!(row.get(0), Some("a"));
        assert_eq!(row.get(1), Some("b"));
        assert_eq!(row.get(2), Some("X"));
    }

    #[test]
    fn backfill_replaces_empty_cells_and_nulls_undefaulted_ones() {
        let config = ReaderConfig::default().with_first_row_is_header(false);
        let mut reader = reader_with("a,,\n", config);
        reader.add_column("F1");
        reader.add_column("F2");
        reader.add_column_with_default("F3", "X");

        assert!(reader.read().unwrap());
        let row = reader.current_record().unwrap().unwrap();
        assert_eq!(row.get(0), Some("a"));
        // Empty cell with no configured default becomes null.
        assert_eq!(row.get(1), None);
        assert!(row.is_null(1));
        assert_eq!(row.get(2), Some("X"));
    }

    #[test]
    fn widening_a_real_header_keeps_defaults_aligned() {
        let mut reader = reader("A,B\n1,2\n");
        assert_eq!(
            reader.field_headers().unwrap().unwrap(),
            &["A".to_string(), "B".to_string()]
        );
        reader.add_column_with_default("C", "z");

        assert!(reader.read().unwrap());
        let row = reader.current_record().unwrap().unwrap();
        assert_eq!(row.get(0), Some("1"));
        assert_eq!(row.get(2), Some("z"));
    }

    #[test]
    fn skip_predicate_discards_header_framing_rows() {
        let mut reader = reader(
            "HDR,AAAA11111XXX000-FFF\n\
             Field1,Field2,Field3,Field4,Field5\n\
             value1,100,true,2016-12-31, 25.76\n\
             TRL,0001\n",
        );
        reader.set_skip_record(|row| row.get(0) == Some("HDR") || row.get(0) == Some("TRL"));

        assert!(reader.read().unwrap());
        let record: TestRecord = reader.get_record().unwrap();
        assert_eq!(record.field1, "value1");

        assert!(!reader.read().unwrap());
    }

    #[test]
    fn blank_line_terminates_the_record_stream() {
        let config = ReaderConfig::default().with_first_row_is_header(false);
        let mut reader = reader_with("1,2\n\n3,4\n", config);

        assert!(reader.read().unwrap());
        let row = reader.current_record().unwrap().unwrap();
        assert_eq!(row.get(0), Some("1"));

        assert!(!reader.read().unwrap());
        assert!(!reader.read().unwrap());
        assert!(reader.current_record().unwrap().is_none());
    }

    #[test]
    fn access_before_read_is_a_precondition_error() {
        let mut reader = reader("Field1,Field2\nvalue1,100\n");
        assert!(matches!(
            reader.current_record().unwrap_err(),
            Error::ReadRequired
        ));
        assert!(matches!(
            reader.get_record::<TestRecord>().unwrap_err(),
            Error::ReadRequired
        ));
    }

    #[test]
    fn get_field_converts_by_position() {
        let mut reader = reader(
            "Field1,Field2,Field3,Field4,Field5\nvalue1,100,true,2016-12-31, 25.76\n",
        );
        assert!(reader.read().unwrap());

        assert_eq!(reader.get_field::<String>(0).unwrap(), Some("value1".into()));
        assert_eq!(reader.get_field::<i32>(1).unwrap(), Some(100));
        assert_eq!(reader.get_field::<bool>(2).unwrap(), Some(true));
        assert_eq!(reader.get_field::<f64>(4).unwrap(), Some(25.76));
        assert_eq!(reader.get_field::<String>(9).unwrap(), None);
    }

    #[test]
    fn explicit_index_mappings_drive_the_record() {
        let mut reader = DelimitedTextReader::with_delimiter(
            "X1|X2|X3|X4|X5\nvalue1|100|true|\"2016-12-31\"| 25.76\n".as_bytes(),
            '|',
        );
        reader.map_field::<TestRecord>("field1").unwrap().column_index(0);
        reader.map_field::<TestRecord>("field4").unwrap().column_index(3);
        reader.map_field::<TestRecord>("field2").unwrap().column_index(1);
        reader.map_field::<TestRecord>("field5").unwrap().column_index(4);
        reader.map_field::<TestRecord>("field3").unwrap().column_index(2);

        assert!(reader.read().unwrap());
        let record: TestRecord = reader.get_record().unwrap();
        assert_eq!(record.field1, "value1");
        assert_eq!(record.field2, 100);
        assert!(record.field3);
        assert_eq!(record.field4, dec_31_2016());
        assert_eq!(record.field5, 25.76);
    }

    #[test]
    fn explicit_name_mappings_resolve_against_the_header() {
        let mut reader = DelimitedTextReader::with_delimiter(
            "X1|X2|X3|X4|X5\nvalue1|100|true|\"2016-12-31\"| 25.76\n".as_bytes(),
            '|',
        );
        reader.map_field::<TestRecord>("field1").unwrap().column_name("X1");
        reader.map_field::<TestRecord>("field4").unwrap().column_name("X4");
        reader.map_field::<TestRecord>("field2").unwrap().column_name("X2");
        reader.map_field::<TestRecord>("field5").unwrap().column_name("X5");
        reader.map_field::<TestRecord>("field3").unwrap().column_name("X3");

        assert!(reader.read().unwrap());
        let record: TestRecord = reader.get_record().unwrap();
        assert_eq!(record.field1, "value1");
        assert_eq!(record.field5, 25.76);
    }

    #[test]
    fn unresolved_name_mapping_raises_a_mapping_error() {
        let mut reader = reader(
            "X1,X2,X3,X4,X5\nvalue1,100,true,2016-12-31, 25.76\n",
        );
        reader.map_field::<TestRecord>("field1").unwrap().column_name("X1");
        reader.map_field::<TestRecord>("field2").unwrap().column_name("X2");
        reader.map_field::<TestRecord>("field3").unwrap().column_name("X3");
        reader.map_field::<TestRecord>("field4").unwrap().column_name("FOO");
        reader.map_field::<TestRecord>("field5").unwrap().column_name("X5");

        assert!(reader.read().unwrap());
        let err = reader.get_record::<TestRecord>().unwrap_err();
        match err {
            Error::Mapping { field, column } => {
                assert_eq!(field, "field4");
                assert_eq!(column, "FOO");
            }
            other => panic!("expected mapping error, got {other:?}"),
        }
    }

    #[test]
    fn tolerant_mode_falls_back_to_the_positional_index() {
        let config = ReaderConfig::default().with_ignore_mapping_failures();
        let mut reader = reader_with(
            "X1,X2,X3,X4,X5\nvalue1,100,true,2016-12-31, 25.76\n",
            config,
        );
        // Registration order gives field4 the positional index 3, which is
        // where its data actually lives.
        reader.map_field::<TestRecord>("field1").unwrap().column_name("X1");
        reader.map_field::<TestRecord>("field2").unwrap().column_name("X2");
        reader.map_field::<TestRecord>("field3").unwrap().column_name("X3");
        reader.map_field::<TestRecord>("field4").unwrap().column_name("FOO");
        reader.map_field::<TestRecord>("field5").unwrap().column_name("X5");

        assert!(reader.read().unwrap());
        let record: TestRecord = reader.get_record().unwrap();
        assert_eq!(record.field4, dec_31_2016());
    }

    #[test]
    fn explicit_mapping_wins_over_matching_header_name() {
        let mut reader = reader("name,other,third\na,b,c\n");
        reader.map_field::<NamePair>("name").unwrap().column_index(2);

        assert!(reader.read().unwrap());
        let record: NamePair = reader.get_record().unwrap();
        assert_eq!(record.name, "c");
        // The remaining field still auto-maps by header name.
        assert_eq!(record.other, "b");
    }

    #[test]
    fn custom_converter_applies_to_one_mapping() {
        let mut reader = reader(
            "Field1,Field2,Field3,Field4,Field5\nvalue1,100,true,\"20161231\", 25.76\n",
        );
        reader.map_field::<TestRecord>("field1").unwrap().column_index(0);
        reader.map_field::<TestRecord>("field2").unwrap().column_index(1);
        reader.map_field::<TestRecord>("field3").unwrap().column_index(2);
        reader
            .map_field::<TestRecord>("field4")
            .unwrap()
            .column_index(3)
            .converter(DateTimeConverter::with_format("%Y%m%d"));
        reader.map_field::<TestRecord>("field5").unwrap().column_index(4);

        assert!(reader.read().unwrap());
        let record: TestRecord = reader.get_record().unwrap();
        assert_eq!(record.field4, dec_31_2016());
    }

    #[test]
    fn no_header_mode_maps_positionally_without_any_setup() {
        let config = ReaderConfig::default().with_first_row_is_header(false);
        let mut reader = reader_with("value1,100,true,\"2016-12-31\", 25.76\n", config);

        assert!(reader.read().unwrap());
        let record: TestRecord = reader.get_record().unwrap();
        assert_eq!(record.field1, "value1");
        assert_eq!(record.field2, 100);
        assert!(record.field3);
        assert_eq!(record.field4, dec_31_2016());
        assert_eq!(record.field5, 25.76);
    }

    #[test]
    fn mapping_table_freezes_after_first_record() {
        let mut reader = reader("Field1,Field2,Field3,Field4,Field5\nvalue1,100,true,2016-12-31,25.76\n");
        assert!(reader.read().unwrap());
        let _: TestRecord = reader.get_record().unwrap();

        let err = reader.map_field::<TestRecord>("field1").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(reader.mapping_table::<TestRecord>().unwrap().is_frozen());
    }

    #[test]
    fn mapping_an_undeclared_field_is_an_error() {
        let mut reader = reader("a,b\n1,2\n");
        let err = reader.map_field::<NamePair>("missing").unwrap_err();
        assert!(matches!(err, Error::UnknownField { field, .. } if field == "missing"));
    }

    #[test]
    fn conversion_failure_does_not_poison_the_stream() {
        let mut reader = reader(
            "Field1,Field2,Field3,Field4,Field5\n\
             value1,not-a-number,true,2016-12-31,25.76\n\
             value2,200,false,2016-01-01,67.52\n",
        );

        assert!(reader.read().unwrap());
        assert!(matches!(
            reader.get_record::<TestRecord>().unwrap_err(),
            Error::Conversion { field, .. } if field == "field2"
        ));

        assert!(reader.read().unwrap());
        let record: TestRecord = reader.get_record().unwrap();
        assert_eq!(record.field2, 200);
    }

    #[test]
    fn nested_fields_are_skipped_by_positional_auto_mapping() {
        #[derive(Debug, Default, PartialEq)]
        struct Inner {
            detail: String,
        }

        #[derive(Debug, Default)]
        struct Outer {
            data1: String,
            data2: i32,
            inner: Inner,
            data4: bool,
        }

        delimited_record!(Outer { data1, data2, nested inner, data4 });

        let config = ReaderConfig::default().with_first_row_is_header(false);
        let mut reader = reader_with("value1,100,true,\"2016-12-31\", 25.76\n", config);

        assert!(reader.read().unwrap());
        let record: Outer = reader.get_record().unwrap();
        assert_eq!(record.data1, "value1");
        assert_eq!(record.data2, 100);
        assert_eq!(record.inner, Inner::default());
        assert!(record.data4);
    }
}
