use std::collections::HashMap;

use allocative::Allocative;

use crate::error::RowShapeError;
use crate::store::{AnyStore, KeyedStore, StoreKind};

/// One row: column name to untyped text value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Allocative)]
pub struct Row {
    values: HashMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a row from `(column, value)` pairs. A repeated column keeps the
    /// last value.
    pub fn from_pairs<C, V>(pairs: impl IntoIterator<Item = (C, V)>) -> Self
    where
        C: Into<String>,
        V: Into<String>,
    {
        pairs.into_iter().collect()
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// Sets `column` to `value`, returning the previous value if any.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(column.into(), value.into())
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<C: Into<String>, V: Into<String>> FromIterator<(C, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (C, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        }
    }
}

/// A named table: an ordered column list and a keyed store of rows.
///
/// The column order drives projection and display, independently of the
/// order rows sit in the store. A key maps to at most one row; adding a row
/// under an existing key replaces it.
#[derive(Debug, Clone, Allocative)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: AnyStore<String, Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>, kind: StoreKind) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: AnyStore::new(kind),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared columns in declaration order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Stores `row` under `key`.
    ///
    /// # Errors
    /// Returns [RowShapeError] if the row lacks any declared column. Extra
    /// columns are kept.
    pub fn add_row(&mut self, key: impl Into<String>, row: Row) -> Result<(), RowShapeError> {
        let missing: Vec<String> = self
            .columns
            .iter()
            .filter(|column| !row.contains(column))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(RowShapeError {
                table: self.name.clone(),
                missing,
            });
        }
        self.rows.put(key.into(), row);
        Ok(())
    }

    pub fn get_row(&self, key: &str) -> Option<&Row> {
        self.rows.get(key)
    }

    pub fn get_row_mut(&mut self, key: &str) -> Option<&mut Row> {
        self.rows.get_mut(key)
    }

    pub fn remove_row(&mut self, key: &str) -> Option<Row> {
        self.rows.remove(key)
    }

    /// Keys of all live rows, in store order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.rows.keys()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn store_kind(&self) -> StoreKind {
        self.rows.kind()
    }

    /// Current size of the store's backing array.
    pub fn capacity(&self) -> usize {
        self.rows.capacity()
    }
}
