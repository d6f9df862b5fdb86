//! 📊 Frame: the tabular result set. Columns decided once at load time, rows read-only forever.
//!
//! Cells are `Option<String>` because CSV has exactly one way to say "nothing here" (an empty
//! field) and we would rather print `null` than pretend it was an empty string on purpose.

/// 📊 Ordered rows under a fixed, ordered set of column names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Frame {
    /// Every row must already be exactly `columns.len()` wide; the loader guarantees it.
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 📏 Data rows only. The header is not a row, it is a lifestyle.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row {
            columns: &self.columns,
            values,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|values| Row {
            columns: &self.columns,
            values,
        })
    }
}

/// 🪟 A borrowed view of one row: column name → value.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [Option<String>],
}

impl<'a> Row<'a> {
    /// 🔍 Look up a cell by column name. `None` for unknown columns and for null cells alike;
    /// reach for `values()` if you need to tell them apart.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let position = self.columns.iter().position(|name| name == column)?;
        self.values[position].as_deref()
    }

    pub fn values(&self) -> &'a [Option<String>] {
        self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, Option<&'a str>)> + 'a {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Option::as_deref))
    }
}
