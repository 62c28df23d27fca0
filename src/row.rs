//! Parsed row representation with nullable cells.
//!
//! A [`Row`] is one parsed line's ordered field values. Cells are nullable
//! because header-driven backfill can extend a short row with an absent
//! default, and can replace an empty cell with an absent default, leaving
//! the position null rather than empty.

/// One parsed record's ordered field values, index-addressable and 0-based
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    cells: Vec<Option<String>>,
}

impl Row {
    /// Build a row from freshly tokenized fields (no null cells yet)
    pub fn from_fields(fields: Vec<String>) -> Self {
        Self {
            cells: fields.into_iter().map(Some).collect(),
        }
    }

    /// Number of cells in the row
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when the row has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The cell text at `index`, or `None` when the cell is null or the
    /// index is out of range
    pub fn get(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|cell| cell.as_deref())
    }

    /// True when the cell is null, empty, literally `null` (any case), or
    /// the index is out of range
    pub fn is_null(&self, index: usize) -> bool {
        match self.get(index) {
            Some(text) => text.is_empty() || text.eq_ignore_ascii_case("null"),
            None => true,
        }
    }

    /// True when the cell holds an empty string or is null
    pub(crate) fn is_empty_at(&self, index: usize) -> bool {
        self.get(index).is_none_or(str::is_empty)
    }

    /// Replace the cell at `index`
    pub(crate) fn set(&mut self, index: usize, value: Option<String>) {
        self.cells[index] = value;
    }

    /// Append a cell (used by backfill for rows shorter than the header)
    pub(crate) fn push(&mut self, value: Option<String>) {
        self.cells.push(value);
    }

    /// Iterate the cells in order
    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.cells.iter().map(|cell| cell.as_deref())
    }

    /// The underlying cells
    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }
}
