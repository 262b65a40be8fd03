//! Dynamic record model.
//!
//! A [`Record`] is the runtime representation of one row: a typed bag of
//! column values, a change-tracking set, a persisted flag, and nested child
//! record collections keyed by child table name. It performs no I/O; the
//! orchestrator in `clay-orm` drives all reads and writes.
//!
//! A record is owned by a single logical caller at a time. The change set
//! and persisted flag are not synchronized; concurrent mutation is a caller
//! error.

use std::collections::{BTreeMap, BTreeSet};

use crate::value::{SqlValue, ToSqlValue};

/// A dynamic row with change tracking and child collections.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    table: String,
    values: BTreeMap<String, SqlValue>,
    changed: BTreeSet<String>,
    saved: bool,
    children: BTreeMap<String, Vec<Record>>,
}

impl Record {
    /// Creates a new, unsaved record for the given table.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            values: BTreeMap::new(),
            changed: BTreeSet::new(),
            saved: false,
            children: BTreeMap::new(),
        }
    }

    /// Returns the table name this record belongs to.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Sets a column value and marks the column changed, unless the value is
    /// identical to the one already stored. Equal-value sets are no-ops so a
    /// later save does not issue a redundant UPDATE column.
    pub fn set(&mut self, column: impl Into<String>, value: impl ToSqlValue) {
        let column = column.into();
        let value = value.to_sql_value();
        if self.values.get(&column) == Some(&value) {
            return;
        }
        self.values.insert(column.clone(), value);
        self.changed.insert(column);
    }

    /// Sets a column value without touching the change set. Used when
    /// reconstituting rows from storage and when the orchestrator propagates
    /// identity values, neither of which should make the record dirty.
    pub fn set_clean(&mut self, column: impl Into<String>, value: impl ToSqlValue) {
        self.values.insert(column.into(), value.to_sql_value());
    }

    /// Returns a column's value. `None` means the column was never set or
    /// fetched; `Some(&SqlValue::Null)` means the column holds SQL NULL.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.values.get(column)
    }

    /// Returns all stored column values in name order.
    #[must_use]
    pub fn values(&self) -> &BTreeMap<String, SqlValue> {
        &self.values
    }

    /// Returns the values of only the changed columns.
    #[must_use]
    pub fn changed_values(&self) -> BTreeMap<String, SqlValue> {
        self.changed
            .iter()
            .filter_map(|c| self.values.get(c).map(|v| (c.clone(), v.clone())))
            .collect()
    }

    /// Returns whether the record needs a write: either it was never saved
    /// or columns changed since the last save.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.saved || !self.changed.is_empty()
    }

    /// Returns whether the record has been persisted.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Marks the record persisted and clears the change set. Called by the
    /// orchestrator immediately after a successful write.
    pub fn mark_saved(&mut self) {
        self.saved = true;
        self.changed.clear();
    }

    /// Appends a child record under the given child table name.
    pub fn add_child(&mut self, table: impl Into<String>, record: Record) {
        self.children.entry(table.into()).or_default().push(record);
    }

    /// Replaces the child collection for the given child table name.
    pub fn set_children(&mut self, table: impl Into<String>, records: Vec<Record>) {
        self.children.insert(table.into(), records);
    }

    /// Returns the ordered child records for a child table, if any.
    #[must_use]
    pub fn children_of(&self, table: &str) -> Option<&[Record]> {
        self.children.get(table).map(Vec::as_slice)
    }

    /// Returns all child collections.
    #[must_use]
    pub fn children(&self) -> &BTreeMap<String, Vec<Record>> {
        &self.children
    }

    /// Returns all child collections mutably, for graph traversal.
    pub fn children_mut(&mut self) -> &mut BTreeMap<String, Vec<Record>> {
        &mut self.children
    }
}
