//! The persistence orchestrator.
//!
//! [`Orm`] decides insert-vs-update per record, executes generated
//! statements, propagates generated identity values into child foreign keys,
//! and walks the parent/child graph. It owns no connections: every operation
//! borrows a `&mut SqliteConnection`, which a pooled connection and an open
//! transaction both dereference to. Cancellation follows tokio's model —
//! dropping the returned future abandons the in-flight call.

use std::collections::BTreeMap;
use std::sync::Arc;

use clay_core::schema::{ChildRelation, Column, Schema, Table};
use clay_core::sqlgen::{Dialect, Generator, SqliteDialect};
use clay_core::{Record, SqlValue};
use futures::future::BoxFuture;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::debug;

use crate::error::{OrmError, Result};
use crate::exec::{execute_stmt, fetch_rows};

/// Schema-driven persistence orchestrator.
///
/// Holds a frozen schema and a statement generator. The schema is shared and
/// read-only, so one `Orm` is safe to use from concurrent tasks; individual
/// [`Record`]s are not, and stay owned by a single logical caller.
#[derive(Debug, Clone)]
pub struct Orm<D: Dialect = SqliteDialect> {
    schema: Arc<Schema>,
    generator: Generator<D>,
}

impl Orm<SqliteDialect> {
    /// Creates an orchestrator targeting SQLite.
    #[must_use]
    pub fn sqlite(schema: Arc<Schema>) -> Self {
        Self::new(schema, SqliteDialect)
    }
}

impl<D: Dialect> Orm<D> {
    /// Creates an orchestrator for the given schema and dialect.
    pub fn new(schema: Arc<Schema>, dialect: D) -> Self {
        Self {
            schema,
            generator: Generator::new(dialect),
        }
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Saves a single record.
    ///
    /// - never saved: INSERT, then read back the generated identity when the
    ///   database supplies it, and mark the record saved;
    /// - saved and clean: no statement is issued, returns 0 rows affected;
    /// - saved and dirty: UPDATE of exactly the changed columns, keyed by
    ///   the primary key (plus declared foreign keys on multi-key tables).
    pub async fn save(&self, conn: &mut SqliteConnection, rec: &mut Record) -> Result<u64> {
        if !rec.is_saved() {
            return self.insert(conn, rec).await;
        }
        if !rec.is_dirty() {
            return Ok(0);
        }
        self.update(conn, rec).await
    }

    /// Inserts a record unconditionally and marks it saved.
    pub async fn insert(&self, conn: &mut SqliteConnection, rec: &mut Record) -> Result<u64> {
        let table = self.schema.table(rec.table())?;
        let (sql, args) = self
            .generator
            .binding_insert(&self.schema, rec.table(), rec.values())?;
        let result = execute_stmt(conn, rec.table(), &sql, args).await?;

        // A database-generated identity comes back through the driver; a
        // caller-supplied one is already in the record (or was generated
        // database-side and stays unresolved until re-fetched).
        if !table.caller_supplies_pk && rec.get(&table.primary).is_none() {
            rec.set_clean(table.primary.clone(), SqlValue::Int(result.last_insert_rowid()));
        }
        rec.mark_saved();
        Ok(result.rows_affected())
    }

    /// Updates a record's changed columns, keyed by its primary key.
    pub async fn update(&self, conn: &mut SqliteConnection, rec: &mut Record) -> Result<u64> {
        let table = self.schema.table(rec.table())?;
        let set_values = rec.changed_values();
        let where_values = key_map(table, rec)?;
        let (sql, args) =
            self.generator
                .binding_update(&self.schema, rec.table(), &set_values, &where_values)?;
        let result = execute_stmt(conn, rec.table(), &sql, args).await?;
        rec.mark_saved();
        Ok(result.rows_affected())
    }

    /// Deletes the row a record maps to, keyed by its primary key.
    ///
    /// The in-memory record is left intact apart from being marked saved
    /// with an empty change set; whether it may be re-saved afterwards is
    /// the caller's concern.
    pub async fn delete(&self, conn: &mut SqliteConnection, rec: &mut Record) -> Result<u64> {
        let table = self.schema.table(rec.table())?;
        let where_values = key_map(table, rec)?;
        let (sql, args) = self
            .generator
            .binding_delete(&self.schema, rec.table(), &where_values)?;
        let result = execute_stmt(conn, rec.table(), &sql, args).await?;
        rec.mark_saved();
        Ok(result.rows_affected())
    }

    /// Saves a record and its entire child graph.
    ///
    /// The parent is saved first so its identity is resolved, then each
    /// child's foreign-key column(s) are populated from it before the child
    /// (and its own children) are saved. Returns the total rows affected
    /// across the subgraph; when a child write fails, the error carries the
    /// rows affected so far ([`OrmError::PartialSave`]).
    pub async fn save_all(&self, conn: &mut SqliteConnection, rec: &mut Record) -> Result<u64>
    where
        D: Sync,
    {
        self.save_graph(conn, rec).await
    }

    fn save_graph<'a>(
        &'a self,
        conn: &'a mut SqliteConnection,
        rec: &'a mut Record,
    ) -> BoxFuture<'a, Result<u64>>
    where
        D: Sync,
    {
        Box::pin(async move {
            let mut rows = self.save(&mut *conn, rec).await?;
            let table = self.schema.table(rec.table())?;

            for (child_name, relation) in &table.children {
                let propagated = self.join_values(table, relation, rec)?;
                let Some(children) = rec.children_mut().get_mut(child_name) else {
                    continue;
                };
                for child in children.iter_mut() {
                    for (foreign, value) in &propagated {
                        // A plain set: marks the child dirty only when the
                        // key actually changes.
                        child.set(foreign.clone(), value.clone());
                    }
                    match self.save_graph(&mut *conn, child).await {
                        Ok(n) => rows += n,
                        Err(OrmError::PartialSave { rows: nested, source }) => {
                            return Err(OrmError::PartialSave {
                                rows: rows + nested,
                                source,
                            });
                        }
                        Err(err) => {
                            return Err(OrmError::PartialSave {
                                rows,
                                source: Box::new(err),
                            });
                        }
                    }
                }
            }
            Ok(rows)
        })
    }

    /// Retrieves at most one record matching a partial key map. A miss is
    /// `Ok(None)`, never an error.
    pub async fn retrieve(
        &self,
        conn: &mut SqliteConnection,
        table_name: &str,
        key: &BTreeMap<String, SqlValue>,
    ) -> Result<Option<Record>> {
        let mut records = self.retrieve_many(conn, table_name, key).await?;
        if records.is_empty() {
            Ok(None)
        } else {
            Ok(Some(records.remove(0)))
        }
    }

    /// Retrieves every record matching a partial key map. An empty map
    /// retrieves the whole table; a miss is an empty vector, never an error.
    ///
    /// Fetched records are saved and clean: rows coming out of storage are
    /// never considered dirty.
    pub async fn retrieve_many(
        &self,
        conn: &mut SqliteConnection,
        table_name: &str,
        key: &BTreeMap<String, SqlValue>,
    ) -> Result<Vec<Record>> {
        let table = self.schema.table(table_name)?;
        let (sql, args) = self
            .generator
            .binding_retrieve(&self.schema, table_name, key)?;
        let rows = fetch_rows(conn, table_name, &sql, args).await?;
        rows.iter()
            .map(|row| record_from_row(table, table_name, row))
            .collect()
    }

    /// Populates a record's child collections by retrieving every declared
    /// child relation, keyed by the relation's join column(s). Explicit and
    /// on-demand: nothing triggers this implicitly. Returns the number of
    /// child records fetched.
    pub async fn fleshen_children(
        &self,
        conn: &mut SqliteConnection,
        rec: &mut Record,
    ) -> Result<usize> {
        let table = self.schema.table(rec.table())?;
        let mut fetched = 0;
        for (child_name, relation) in &table.children {
            let key: BTreeMap<String, SqlValue> = self
                .join_values(table, relation, rec)?
                .into_iter()
                .collect();
            let children = self.retrieve_many(&mut *conn, child_name, &key).await?;
            fetched += children.len();
            rec.set_children(child_name.clone(), children);
        }
        Ok(fetched)
    }

    /// Finds the parent record(s) of a child record through the declared
    /// parent tables' relations. Parents whose join value is absent on the
    /// child are skipped.
    pub async fn parents_via_child(
        &self,
        conn: &mut SqliteConnection,
        rec: &Record,
    ) -> Result<Vec<Record>> {
        let table = self.schema.table(rec.table())?;
        let mut parents = Vec::new();
        for parent_name in &table.parent_tables {
            let parent_table = self.schema.table(parent_name)?;
            let Some(relation) = parent_table.children.get(rec.table()) else {
                continue;
            };

            let mut key = BTreeMap::new();
            let mut complete = true;
            for (local, foreign) in relation.join_pairs() {
                let local = if local.is_empty() {
                    parent_table.primary.as_str()
                } else {
                    local
                };
                match rec.get(foreign) {
                    Some(value) => {
                        key.insert(String::from(local), value.clone());
                    }
                    None => {
                        complete = false;
                        break;
                    }
                }
            }
            if !complete {
                continue;
            }
            parents.extend(self.retrieve_many(&mut *conn, parent_name, &key).await?);
        }
        Ok(parents)
    }

    /// Resolves a relation's join pairs against the parent record, mapping
    /// each child-side column to the parent-side value. Requires the parent
    /// identity to be resolved.
    fn join_values(
        &self,
        table: &Table,
        relation: &ChildRelation,
        rec: &Record,
    ) -> Result<Vec<(String, SqlValue)>> {
        let mut values = Vec::new();
        for (local, foreign) in relation.join_pairs() {
            let local = if local.is_empty() {
                table.primary.as_str()
            } else {
                local
            };
            let value = rec
                .get(local)
                .filter(|v| !v.is_expr())
                .cloned()
                .ok_or_else(|| OrmError::MissingIdentity(table.name.clone()))?;
            values.push((String::from(foreign), value));
        }
        Ok(values)
    }
}

/// Builds the WHERE key map for a record: its primary key value, plus any
/// declared foreign keys present on the record for multi-key tables. A
/// declared foreign key the record does not carry narrows the key to what is
/// there, which is logged since the clause then matches on less than the
/// table declared.
fn key_map(table: &Table, rec: &Record) -> Result<BTreeMap<String, SqlValue>> {
    let pk = rec
        .get(&table.primary)
        .filter(|v| !v.is_expr())
        .cloned()
        .ok_or_else(|| OrmError::MissingIdentity(table.name.clone()))?;

    let mut key = BTreeMap::new();
    key.insert(table.primary.clone(), pk);
    if table.multi_key {
        for fk in &table.foreign_keys {
            match rec.get(fk) {
                Some(value) => {
                    key.insert(fk.clone(), value.clone());
                }
                None => {
                    debug!(
                        table = %table.name,
                        column = %fk,
                        "declared key column absent from record; keying without it"
                    );
                }
            }
        }
    }
    Ok(key)
}

/// Reconstitutes one result row as a saved, clean record.
fn record_from_row(table: &Table, table_name: &str, row: &SqliteRow) -> Result<Record> {
    let mut rec = Record::new(table_name);
    for name in table.select_columns() {
        let column = table.column_def(name)?;
        rec.set_clean(name, decode_column(column, row, name)?);
    }
    rec.mark_saved();
    Ok(rec)
}

/// Decodes one column using the schema's metadata to pick the Rust type:
/// integer columns decode as i64, floating db types as f64, everything else
/// as text. SQL NULL maps to [`SqlValue::Null`].
fn decode_column(column: &Column, row: &SqliteRow, name: &str) -> Result<SqlValue> {
    if column.is_number {
        let value: Option<i64> = row.try_get(name)?;
        return Ok(value.map_or(SqlValue::Null, SqlValue::Int));
    }
    let db_type = column.db_type.to_ascii_uppercase();
    if db_type.contains("REAL") || db_type.contains("FLOA") || db_type.contains("DOUB") {
        let value: Option<f64> = row.try_get(name)?;
        return Ok(value.map_or(SqlValue::Null, SqlValue::Float));
    }
    let value: Option<String> = row.try_get(name)?;
    Ok(value.map_or(SqlValue::Null, SqlValue::Text))
}
