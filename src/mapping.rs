//! Field mapping between row positions and typed record fields.
//!
//! Target shapes declare a static field-descriptor table through the
//! [`DelimitedRecord`] trait, usually generated with the
//! [`delimited_record!`](crate::delimited_record) macro. The reader resolves
//! each descriptor to a row position by three strategies, in precedence
//! order:
//!
//! 1. Explicit mappings registered with
//!    [`map_field`](crate::DelimitedTextReader::map_field), by column index
//!    or column name, optionally with a custom converter. Never overwritten.
//! 2. Automatic name matching against the header (case-insensitive by
//!    default), then pairing of leftover fields with unclaimed header
//!    columns in header order.
//! 3. In no-header mode, sequential positional assignment bounded by the
//!    current row width.
//!
//! Resolved mappings accumulate in a per-shape [`MappingTable`] cached by
//! the reader for its lifetime; a table freezes on the first record mapped
//! for its shape.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::convert::{ConvertError, CustomConvert, FromField};
use crate::{Error, Result};

/// A target shape for record mapping: a defaultable struct with a
/// field-descriptor table
///
/// Implement via the [`delimited_record!`](crate::delimited_record) macro:
///
/// ```
/// use delimited_text::delimited_record;
///
/// #[derive(Debug, Default)]
/// struct Reading {
///     station: String,
///     value: f64,
/// }
///
/// delimited_record!(Reading { station, value });
/// ```
pub trait DelimitedRecord: Default + 'static {
    /// The ordered field-descriptor table for this shape
    fn fields() -> Vec<FieldSpec<Self>>;

    /// Shape name used in error messages
    fn record_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// One target field's descriptor: name, auto-mapping eligibility, setter
pub struct FieldSpec<T: ?Sized> {
    name: &'static str,
    auto: bool,
    set: fn(&mut T, &FieldView<'_>) -> Result<()>,
}

impl<T> FieldSpec<T> {
    /// Descriptor for a basic-typed field, eligible for automatic mapping
    pub fn basic(name: &'static str, set: fn(&mut T, &FieldView<'_>) -> Result<()>) -> Self {
        Self {
            name,
            auto: true,
            set,
        }
    }

    /// Descriptor for a composite/nested field, skipped by automatic
    /// mapping; explicit mappings with a custom converter can still target it
    pub fn nested(name: &'static str, set: fn(&mut T, &FieldView<'_>) -> Result<()>) -> Self {
        Self {
            name,
            auto: false,
            set,
        }
    }

    /// The declared field name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether automatic mapping may bind this field
    pub fn is_auto(&self) -> bool {
        self.auto
    }

    pub(crate) fn assign(&self, record: &mut T, view: &FieldView<'_>) -> Result<()> {
        (self.set)(record, view)
    }
}

impl<T> std::fmt::Debug for FieldSpec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("auto", &self.auto)
            .finish()
    }
}

/// One field's raw text plus its mapping's converter, handed to a
/// descriptor's setter
#[derive(Debug)]
pub struct FieldView<'a> {
    field: &'static str,
    raw: Option<&'a str>,
    converter: Option<&'a dyn CustomConvert>,
}

impl<'a> FieldView<'a> {
    pub(crate) fn new(
        field: &'static str,
        raw: Option<&'a str>,
        converter: Option<&'a dyn CustomConvert>,
    ) -> Self {
        Self {
            field,
            raw,
            converter,
        }
    }

    /// The target field name
    pub fn name(&self) -> &'static str {
        self.field
    }

    /// The raw cell text, `None` for a null cell
    pub fn raw(&self) -> Option<&'a str> {
        self.raw
    }

    /// Convert the raw text to the field's type: through the mapping's
    /// custom converter when one is attached, else via [`FromField`]
    pub fn value<V: FromField>(&self) -> Result<V> {
        match self.converter {
            Some(_) => self.converted(),
            None => V::from_field(self.raw).map_err(|e| Error::conversion(self.field, e)),
        }
    }

    /// Convert through the mapping's custom converter only
    ///
    /// This is the conversion path for nested fields, which have no
    /// [`FromField`] default.
    pub fn converted<V: 'static>(&self) -> Result<V> {
        let converter = self.converter.ok_or_else(|| {
            Error::configuration(format!(
                "field '{}' has no default conversion and its mapping carries no custom converter",
                self.field
            ))
        })?;

        let boxed = converter
            .convert(self.raw)
            .map_err(|e| Error::conversion(self.field, e))?;

        boxed.downcast::<V>().map(|value| *value).map_err(|_| {
            Error::conversion(
                self.field,
                ConvertError::new::<V>(self.raw, "custom converter produced a different type"),
            )
        })
    }
}

/// A resolved binding from a target field to a row position
#[derive(Debug)]
pub struct FieldMapping {
    field: &'static str,
    spec_index: usize,
    column_index: usize,
    column_name: Option<String>,
    use_column_name: bool,
    converter: Option<Arc<dyn CustomConvert>>,
}

impl FieldMapping {
    fn explicit(field: &'static str, spec_index: usize, column_index: usize) -> Self {
        Self {
            field,
            spec_index,
            column_index,
            column_name: None,
            use_column_name: false,
            converter: None,
        }
    }

    fn auto(
        field: &'static str,
        spec_index: usize,
        column_index: usize,
        column_name: Option<String>,
    ) -> Self {
        Self {
            field,
            spec_index,
            column_index,
            column_name,
            use_column_name: false,
            converter: None,
        }
    }

    /// Bind this mapping to a fixed column index
    pub fn column_index(&mut self, index: usize) -> &mut Self {
        self.column_index = index;
        self
    }

    /// Bind this mapping to a column name, resolved against the header on
    /// every record access
    pub fn column_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.column_name = Some(name.into());
        self.use_column_name = true;
        self
    }

    /// Attach a custom converter consulted instead of the default
    pub fn converter(&mut self, converter: impl CustomConvert + 'static) -> &mut Self {
        self.converter = Some(Arc::new(converter));
        self
    }

    /// The target field name
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// The bound (or fallback) column index
    pub fn mapped_column_index(&self) -> usize {
        self.column_index
    }

    /// The bound column name, if any
    pub fn mapped_column_name(&self) -> Option<&str> {
        self.column_name.as_deref()
    }

    /// Whether resolution goes through the column name on each access
    pub fn uses_column_name(&self) -> bool {
        self.use_column_name
    }

    pub(crate) fn spec_index(&self) -> usize {
        self.spec_index
    }

    pub(crate) fn custom_converter(&self) -> Option<&dyn CustomConvert> {
        self.converter.as_deref()
    }
}

/// The accumulated mappings for one target shape
///
/// Tables are owned by the reader, keyed by shape identity, and invalidated
/// only when the reader is dropped. A table freezes when the first record
/// of its shape is mapped; registering further mappings afterwards is a
/// configuration error.
#[derive(Debug, Default)]
pub struct MappingTable {
    entries: Vec<FieldMapping>,
    frozen: bool,
}

impl MappingTable {
    /// The mappings resolved so far, in registration/resolution order
    pub fn entries(&self) -> &[FieldMapping] {
        &self.entries
    }

    /// Whether the table has been used to map a record
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    /// The next positional index after all mapped indices
    fn next_index(&self) -> usize {
        self.entries
            .iter()
            .map(|m| m.column_index + 1)
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn register(&mut self, field: &'static str, spec_index: usize) -> &mut FieldMapping {
        let column_index = self.next_index();
        let entry = FieldMapping::explicit(field, spec_index, column_index);
        self.entries.push(entry);
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    /// Fill mappings for target fields not yet mapped explicitly
    pub(crate) fn auto_generate<T: DelimitedRecord>(
        &mut self,
        specs: &[FieldSpec<T>],
        header: Option<&[String]>,
        header_mode: bool,
        case_sensitive: bool,
        row_len: usize,
    ) {
        let mut mapped: HashSet<usize> = self.entries.iter().map(|m| m.spec_index).collect();

        if header_mode {
            let Some(header) = header else {
                return;
            };

            // Columns already consumed by explicit mappings.
            let mut claimed: HashSet<usize> = self
                .entries
                .iter()
                .filter_map(|m| {
                    if m.use_column_name {
                        m.column_name
                            .as_deref()
                            .and_then(|name| find_header_index(header, name, case_sensitive))
                    } else {
                        Some(m.column_index)
                    }
                })
                .collect();

            // Pass 1: match field names against header names.
            for (index, spec) in specs.iter().enumerate() {
                if !spec.auto || mapped.contains(&index) {
                    continue;
                }
                if let Some(column) = find_header_index(header, spec.name, case_sensitive) {
                    self.entries.push(FieldMapping::auto(
                        spec.name,
                        index,
                        column,
                        Some(header[column].clone()),
                    ));
                    claimed.insert(column);
                    mapped.insert(index);
                }
            }

            // Pass 2: pair leftover fields with unclaimed header columns in
            // header order.
            for (index, spec) in specs.iter().enumerate() {
                if !spec.auto || mapped.contains(&index) {
                    continue;
                }
                let Some(column) = (0..header.len()).find(|c| !claimed.contains(c)) else {
                    break;
                };
                self.entries.push(FieldMapping::auto(
                    spec.name,
                    index,
                    column,
                    Some(header[column].clone()),
                ));
                claimed.insert(column);
                mapped.insert(index);
            }
        } else {
            // Positional assignment, bounded by the current row width.
            for (index, spec) in specs.iter().enumerate() {
                if !spec.auto || mapped.contains(&index) {
                    continue;
                }
                let column = self.next_index();
                if column >= row_len {
                    continue;
                }
                self.entries
                    .push(FieldMapping::auto(spec.name, index, column, None));
                mapped.insert(index);
            }
        }

        debug!(
            record = T::record_name(),
            mappings = self.entries.len(),
            "resolved field mappings"
        );
    }
}

/// Per-reader mapping cache keyed by target-shape identity
#[derive(Debug, Default)]
pub(crate) struct MappingCache {
    tables: HashMap<TypeId, MappingTable>,
}

impl MappingCache {
    pub(crate) fn table_mut<T: 'static>(&mut self) -> &mut MappingTable {
        self.tables.entry(TypeId::of::<T>()).or_default()
    }

    pub(crate) fn table<T: 'static>(&self) -> Option<&MappingTable> {
        self.tables.get(&TypeId::of::<T>())
    }
}

/// Locate a header column by name
pub(crate) fn find_header_index(
    header: &[String],
    name: &str,
    case_sensitive: bool,
) -> Option<usize> {
    header.iter().position(|h| {
        if case_sensitive {
            h == name
        } else {
            h.eq_ignore_ascii_case(name)
        }
    })
}

/// Generate a [`DelimitedRecord`] impl for an existing `Default` struct.
///
/// Fields are listed in declaration order; prefix a composite field with
/// `nested` to exclude it from automatic mapping (it can then only be
/// populated by an explicit mapping carrying a custom converter):
///
/// ```
/// use delimited_text::delimited_record;
///
/// #[derive(Debug, Default)]
/// struct Observation {
///     station: String,
///     reading: f64,
/// }
///
/// delimited_record!(Observation { station, reading });
/// ```
#[macro_export]
macro_rules! delimited_record {
    ($ty:ty { $($body:tt)* }) => {
        impl $crate::mapping::DelimitedRecord for $ty {
            fn fields() -> ::std::vec::Vec<$crate::mapping::FieldSpec<Self>> {
                let mut specs = ::std::vec::Vec::new();
                $crate::delimited_record!(@push specs, $($body)*);
                specs
            }
        }
    };
    (@push $specs:ident $(,)?) => {};
    (@push $specs:ident, nested $field:ident $(, $($rest:tt)*)?) => {
        $specs.push($crate::mapping::FieldSpec::nested(
            stringify!($field),
            |record: &mut Self, value: &$crate::mapping::FieldView<'_>| {
                record.$field = value.converted()?;
                Ok(())
            },
        ));
        $($crate::delimited_record!(@push $specs, $($rest)*);)?
    };
    (@push $specs:ident, $field:ident $(, $($rest:tt)*)?) => {
        $specs.push($crate::mapping::FieldSpec::basic(
            stringify!($field),
            |record: &mut Self, value: &$crate::mapping::FieldView<'_>| {
                record.$field = value.value()?;
                Ok(())
            },
        ));
        $($crate::delimited_record!(@push $specs, $($rest)*);)?
    };
}
