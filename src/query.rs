//! Full-scan execution of `SELECT`, `UPDATE` and `DELETE` over one table.
//!
//! No secondary index exists: every operation walks the live keys of the
//! table's store and filters rows with [predicate::matches].

use std::fmt;

use crate::predicate::{self, ConditionEntry};
use crate::table::Table;

/// Placeholder rendered for a value the row does not carry.
pub const NULL: &str = "NULL";

/// Represents the result of a successful `SELECT` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    /// Declared columns of the table, in declaration order.
    pub columns: Vec<String>,
    /// One entry per matching row, projected onto `columns`. `None` marks a
    /// value missing from the row.
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Tab-separated header line followed by one line per row.
impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.columns.join("\t"))?;
        for row in &self.rows {
            f.write_str("\n")?;
            for (i, value) in row.iter().enumerate() {
                if i > 0 {
                    f.write_str("\t")?;
                }
                f.write_str(value.as_deref().unwrap_or(NULL))?;
            }
        }
        Ok(())
    }
}

/// Returns the keys of all rows matching `conditions`, in store order.
///
/// The keys are collected up front so callers can mutate the table while
/// walking them.
fn matching_keys(table: &Table, conditions: &[ConditionEntry]) -> Vec<String> {
    table
        .keys()
        .filter(|key| {
            table
                .get_row(key)
                .is_some_and(|row| predicate::matches(row, conditions))
        })
        .cloned()
        .collect()
}

/// Projects every matching row onto the declared columns.
pub fn select(table: &Table, conditions: &[ConditionEntry]) -> QueryResult {
    let rows = table
        .keys()
        .filter_map(|key| table.get_row(key))
        .filter(|row| predicate::matches(row, conditions))
        .map(|row| {
            table
                .columns()
                .iter()
                .map(|column| row.get(column).map(str::to_string))
                .collect()
        })
        .collect();

    QueryResult {
        columns: table.columns().to_vec(),
        rows,
    }
}

/// Sets `column` to `value` on every matching row and returns how many rows
/// were touched.
///
/// The row keeps its key even when `column` is the key column.
pub fn update(table: &mut Table, column: &str, value: &str, conditions: &[ConditionEntry]) -> usize {
    let keys = matching_keys(table, conditions);

    let mut affected = 0;
    for key in &keys {
        if let Some(row) = table.get_row_mut(key) {
            row.set(column, value);
            affected += 1;
        }
    }
    affected
}

/// Removes every matching row and returns how many were removed.
///
/// Each row leaves the store as soon as it is reached, so the store may shrink
/// part way through.
pub fn delete(table: &mut Table, conditions: &[ConditionEntry]) -> usize {
    matching_keys(table, conditions)
        .iter()
        .filter(|key| table.remove_row(key).is_some())
        .count()
}
