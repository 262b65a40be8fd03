//! Dialect-parameterized SQL statement generation.
//!
//! One [`Generator`] engine renders INSERT/UPDATE/DELETE/SELECT statements
//! for any dialect; a [`Dialect`] supplies only syntax (placeholder tokens,
//! the identity-return clause, the default identity expression). Adding a
//! dialect means implementing the trait, not duplicating the algorithm.
//!
//! All generation is pure: each operation returns the statement text plus an
//! ordered bind-argument list whose positions match the placeholders exactly.

mod postgres;
mod sqlite;

pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use std::collections::BTreeMap;

use crate::error::{GenResult, SqlGenError};
use crate::schema::{Column, Schema, Table};
use crate::value::SqlValue;

/// Trait for SQL dialect-specific syntax.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the bind placeholder for the `index`-th bound argument
    /// (1-based). Dialects with positional tokens ignore both arguments.
    fn placeholder(&self, index: usize, column: &str) -> String;

    /// Returns the clause that makes an INSERT hand back the generated
    /// identity value, if the dialect has one. Dialects without it rely on
    /// the driver's last-insert-id mechanism.
    fn identity_return_clause(&self, column: &str) -> Option<String> {
        let _ = column;
        None
    }

    /// Returns the expression used to generate an identity value when the
    /// table expects a caller-supplied key and none was provided.
    fn default_identity_expr(&self) -> &'static str;
}

/// SQL statement generator for a single dialect.
#[derive(Debug, Clone)]
pub struct Generator<D: Dialect> {
    dialect: D,
}

impl<D: Dialect> Generator<D> {
    /// Creates a generator for the given dialect.
    pub fn new(dialect: D) -> Self {
        Self { dialect }
    }

    /// Returns the dialect.
    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Generates an INSERT statement for the given value map.
    ///
    /// When the table's identity is caller-supplied and absent from the
    /// value map, the dialect's default identity expression is inserted as a
    /// raw expression. When it is database-generated and absent, the
    /// dialect's identity-return clause is appended if it has one.
    ///
    /// The column list, placeholder list and bind arguments are produced in
    /// a single ordering pass over the (sorted) value map; raw expressions
    /// are spliced into their placeholder slot and compacted out of the bind
    /// arguments so placeholder indices stay dense.
    pub fn binding_insert(
        &self,
        schema: &Schema,
        table: &str,
        values: &BTreeMap<String, SqlValue>,
    ) -> GenResult<(String, Vec<SqlValue>)> {
        let sch_table = schema.table(table)?;
        if values.is_empty() {
            return Err(SqlGenError::EmptyValues(String::from(table)));
        }

        let mut effective = values.clone();
        let identity_absent = !effective.contains_key(&sch_table.primary);
        if sch_table.caller_supplies_pk && identity_absent {
            effective.insert(
                sch_table.primary.clone(),
                SqlValue::expr(self.dialect.default_identity_expr()),
            );
        }

        let mut col_names = Vec::with_capacity(effective.len());
        let mut slots = Vec::with_capacity(effective.len());
        let mut args = Vec::with_capacity(effective.len());
        for (name, value) in &effective {
            let column = sch_table.column_def(name)?;
            col_names.push(name.as_str());
            match value {
                SqlValue::Expr(text) => slots.push(text.clone()),
                other => {
                    let rendered = normalize(column, other);
                    slots.push(self.dialect.placeholder(args.len() + 1, name));
                    args.push(rendered);
                }
            }
        }

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            sch_table.resolved_name(),
            col_names.join(", "),
            slots.join(", ")
        );
        if !sch_table.caller_supplies_pk && identity_absent {
            if let Some(clause) = self.dialect.identity_return_clause(&sch_table.primary) {
                sql.push(' ');
                sql.push_str(&clause);
            }
        }
        Ok((sql, args))
    }

    /// Generates an UPDATE statement. The SET clause covers exactly the
    /// given value map (the caller passes only changed columns); the WHERE
    /// clause binds the key map. Identities are never generated here.
    pub fn binding_update(
        &self,
        schema: &Schema,
        table: &str,
        set_values: &BTreeMap<String, SqlValue>,
        where_values: &BTreeMap<String, SqlValue>,
    ) -> GenResult<(String, Vec<SqlValue>)> {
        let sch_table = schema.table(table)?;
        if set_values.is_empty() {
            return Err(SqlGenError::EmptyValues(String::from(table)));
        }

        let mut args = Vec::new();
        let mut set_parts = Vec::with_capacity(set_values.len());
        for (name, value) in set_values {
            let column = sch_table.column_def(name)?;
            match value {
                SqlValue::Expr(text) => set_parts.push(format!("{name} = {text}")),
                other => {
                    let rendered = normalize(column, other);
                    let slot = self.dialect.placeholder(args.len() + 1, name);
                    set_parts.push(format!("{name} = {slot}"));
                    args.push(rendered);
                }
            }
        }

        let where_parts = self.render_where(sch_table, where_values, &mut args)?;
        if where_parts.is_empty() {
            return Err(SqlGenError::MissingKey {
                table: String::from(table),
                kind: "UPDATE",
            });
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            sch_table.resolved_name(),
            set_parts.join(", "),
            where_parts.join(" AND ")
        );
        Ok((sql, args))
    }

    /// Generates a DELETE statement keyed by the given WHERE map.
    pub fn binding_delete(
        &self,
        schema: &Schema,
        table: &str,
        where_values: &BTreeMap<String, SqlValue>,
    ) -> GenResult<(String, Vec<SqlValue>)> {
        let sch_table = schema.table(table)?;
        let mut args = Vec::new();
        let where_parts = self.render_where(sch_table, where_values, &mut args)?;
        if where_parts.is_empty() {
            return Err(SqlGenError::MissingKey {
                table: String::from(table),
                kind: "DELETE",
            });
        }
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            sch_table.resolved_name(),
            where_parts.join(" AND ")
        );
        Ok((sql, args))
    }

    /// Generates a SELECT statement over the table's retrieval columns,
    /// filtered by a partial key map. An empty map selects every row.
    pub fn binding_retrieve(
        &self,
        schema: &Schema,
        table: &str,
        where_values: &BTreeMap<String, SqlValue>,
    ) -> GenResult<(String, Vec<SqlValue>)> {
        let sch_table = schema.table(table)?;
        let mut args = Vec::new();
        let where_parts = self.render_where(sch_table, where_values, &mut args)?;

        let mut sql = format!(
            "SELECT {} FROM {}",
            sch_table.select_columns().join(", "),
            sch_table.resolved_name()
        );
        if !where_parts.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_parts.join(" AND "));
        }
        Ok((sql, args))
    }

    /// Renders WHERE conditions from a column/value map, appending bind
    /// arguments to `args`. NULL values render as `IS NULL` with no bind;
    /// raw expressions are spliced in verbatim.
    fn render_where(
        &self,
        table: &Table,
        where_values: &BTreeMap<String, SqlValue>,
        args: &mut Vec<SqlValue>,
    ) -> GenResult<Vec<String>> {
        let mut parts = Vec::with_capacity(where_values.len());
        for (name, value) in where_values {
            let column = table.column_def(name)?;
            match value {
                SqlValue::Null => parts.push(format!("{name} IS NULL")),
                SqlValue::Expr(text) => parts.push(format!("{name} = {text}")),
                other => {
                    let rendered = normalize(column, other);
                    let slot = self.dialect.placeholder(args.len() + 1, name);
                    parts.push(format!("{name} = {slot}"));
                    args.push(rendered);
                }
            }
        }
        Ok(parts)
    }
}

/// Per-type rendering policy, shared by every statement kind. Floats bound
/// to an integer column truncate; unsigned integers render as decimal text
/// since the supported drivers have no native unsigned type.
fn normalize(column: &Column, value: &SqlValue) -> SqlValue {
    match value {
        SqlValue::Float(f) if column.is_number => SqlValue::Int(f.trunc() as i64),
        SqlValue::UInt(u) => SqlValue::Text(u.to_string()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, Schema, Table};

    fn test_schema() -> Schema {
        Schema::new("test")
            .table_def(
                Table::new("people", "PersonID")
                    .column(Column::new("PersonID").identity().number())
                    .column(Column::new("Name").not_null().length(255))
                    .column(Column::new("Age").number())
                    .column(Column::new("Weight"))
                    .column(Column::new("UpdatedAt")),
            )
            .table_def(
                Table::new("sessions", "Token")
                    .caller_supplies_pk()
                    .column(Column::new("Token").identity().length(36))
                    .column(Column::new("PersonID").number().foreign_key())
                    .with_foreign_key("PersonID"),
            )
    }

    fn values(pairs: &[(&str, SqlValue)]) -> BTreeMap<String, SqlValue> {
        pairs
            .iter()
            .map(|(k, v)| (String::from(*k), v.clone()))
            .collect()
    }

    #[test]
    fn test_insert_sqlite() {
        let schema = test_schema();
        let generator = Generator::new(SqliteDialect);
        let (sql, args) = generator
            .binding_insert(
                &schema,
                "people",
                &values(&[
                    ("Name", SqlValue::Text(String::from("Joe"))),
                    ("Age", SqlValue::Int(30)),
                ]),
            )
            .unwrap();

        assert_eq!(sql, "INSERT INTO people (Age, Name) VALUES (?, ?)");
        assert_eq!(args, vec![SqlValue::Int(30), SqlValue::Text(String::from("Joe"))]);
    }

    #[test]
    fn test_insert_postgres_returning_identity() {
        let schema = test_schema();
        let generator = Generator::new(PostgresDialect);
        let (sql, args) = generator
            .binding_insert(
                &schema,
                "people",
                &values(&[("Name", SqlValue::Text(String::from("Joe")))]),
            )
            .unwrap();

        assert_eq!(
            sql,
            "INSERT INTO people (Name) VALUES ($1) RETURNING PersonID"
        );
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_insert_caller_supplied_identity_uses_expression() {
        let schema = test_schema();
        let generator = Generator::new(SqliteDialect);
        let (sql, args) = generator
            .binding_insert(&schema, "sessions", &values(&[("PersonID", SqlValue::Int(7))]))
            .unwrap();

        // The generated identity is spliced in as raw SQL, not bound.
        assert_eq!(
            sql,
            "INSERT INTO sessions (PersonID, Token) VALUES (?, lower(hex(randomblob(16))))"
        );
        assert_eq!(args, vec![SqlValue::Int(7)]);
    }

    #[test]
    fn test_expr_values_are_compacted_out_of_binds() {
        let schema = test_schema();
        let generator = Generator::new(PostgresDialect);
        let (sql, args) = generator
            .binding_insert(
                &schema,
                "people",
                &values(&[
                    ("Age", SqlValue::Int(30)),
                    ("Name", SqlValue::Text(String::from("Joe"))),
                    ("UpdatedAt", SqlValue::expr("CURRENT_TIMESTAMP")),
                ]),
            )
            .unwrap();

        // Placeholder numbering stays dense after the expression slot.
        assert_eq!(
            sql,
            "INSERT INTO people (Age, Name, UpdatedAt) VALUES ($1, $2, CURRENT_TIMESTAMP) RETURNING PersonID"
        );
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_single_ordering_pass_alignment() {
        let schema = test_schema();
        let generator = Generator::new(SqliteDialect);
        let map = values(&[
            ("Weight", SqlValue::Float(80.5)),
            ("Name", SqlValue::Text(String::from("Joe"))),
            ("Age", SqlValue::Int(30)),
            ("UpdatedAt", SqlValue::expr("CURRENT_TIMESTAMP")),
        ]);
        let (sql, args) = generator.binding_insert(&schema, "people", &map).unwrap();

        let placeholders = sql.matches('?').count();
        assert_eq!(placeholders, args.len());
        assert_eq!(args.len(), map.len() - 1);
        // BTreeMap iteration fixes one deterministic order for columns,
        // placeholders and arguments alike.
        assert_eq!(
            sql,
            "INSERT INTO people (Age, Name, UpdatedAt, Weight) VALUES (?, ?, CURRENT_TIMESTAMP, ?)"
        );
        assert_eq!(
            args,
            vec![
                SqlValue::Int(30),
                SqlValue::Text(String::from("Joe")),
                SqlValue::Float(80.5),
            ]
        );
    }

    #[test]
    fn test_float_truncates_for_integer_column() {
        let schema = test_schema();
        let generator = Generator::new(SqliteDialect);
        let (_, args) = generator
            .binding_insert(&schema, "people", &values(&[("Age", SqlValue::Float(30.9))]))
            .unwrap();
        assert_eq!(args, vec![SqlValue::Int(30)]);
    }

    #[test]
    fn test_unsigned_renders_as_decimal_text() {
        let schema = test_schema();
        let generator = Generator::new(SqliteDialect);
        let (_, args) = generator
            .binding_insert(
                &schema,
                "people",
                &values(&[("Age", SqlValue::UInt(u64::MAX))]),
            )
            .unwrap();
        assert_eq!(args, vec![SqlValue::Text(u64::MAX.to_string())]);
    }

    #[test]
    fn test_update_touches_only_given_columns() {
        let schema = test_schema();
        let generator = Generator::new(SqliteDialect);
        let (sql, args) = generator
            .binding_update(
                &schema,
                "people",
                &values(&[("Name", SqlValue::Text(String::from("Jane")))]),
                &values(&[("PersonID", SqlValue::Int(1))]),
            )
            .unwrap();

        assert_eq!(sql, "UPDATE people SET Name = ? WHERE PersonID = ?");
        assert_eq!(
            args,
            vec![SqlValue::Text(String::from("Jane")), SqlValue::Int(1)]
        );
    }

    #[test]
    fn test_update_postgres_indices_continue_into_where() {
        let schema = test_schema();
        let generator = Generator::new(PostgresDialect);
        let (sql, args) = generator
            .binding_update(
                &schema,
                "people",
                &values(&[
                    ("Age", SqlValue::Int(31)),
                    ("Name", SqlValue::Text(String::from("Jane"))),
                ]),
                &values(&[("PersonID", SqlValue::Int(1))]),
            )
            .unwrap();

        assert_eq!(
            sql,
            "UPDATE people SET Age = $1, Name = $2 WHERE PersonID = $3"
        );
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn test_null_in_where_renders_is_null() {
        let schema = test_schema();
        let generator = Generator::new(SqliteDialect);
        let (sql, args) = generator
            .binding_retrieve(
                &schema,
                "people",
                &values(&[
                    ("Name", SqlValue::Text(String::from("Joe"))),
                    ("Weight", SqlValue::Null),
                ]),
            )
            .unwrap();

        assert_eq!(
            sql,
            "SELECT Age, Name, PersonID, UpdatedAt, Weight FROM people \
             WHERE Name = ? AND Weight IS NULL"
        );
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_retrieve_without_keys_selects_all() {
        let schema = test_schema();
        let generator = Generator::new(SqliteDialect);
        let (sql, args) = generator
            .binding_retrieve(&schema, "people", &BTreeMap::new())
            .unwrap();
        assert_eq!(
            sql,
            "SELECT Age, Name, PersonID, UpdatedAt, Weight FROM people"
        );
        assert!(args.is_empty());
    }

    #[test]
    fn test_delete_requires_key_bindings() {
        let schema = test_schema();
        let generator = Generator::new(SqliteDialect);
        let err = generator
            .binding_delete(&schema, "people", &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, SqlGenError::MissingKey { kind: "DELETE", .. }));
    }

    #[test]
    fn test_unknown_table_and_column_are_errors() {
        let schema = test_schema();
        let generator = Generator::new(SqliteDialect);

        let err = generator
            .binding_insert(&schema, "nope", &values(&[("Name", SqlValue::Null)]))
            .unwrap_err();
        assert!(matches!(
            err,
            SqlGenError::Schema(crate::error::SchemaError::UnknownTable(_))
        ));

        let err = generator
            .binding_insert(
                &schema,
                "people",
                &values(&[("NoSuchColumn", SqlValue::Int(1))]),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            SqlGenError::Schema(crate::error::SchemaError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_empty_values_is_an_error() {
        let schema = test_schema();
        let generator = Generator::new(SqliteDialect);
        let err = generator
            .binding_insert(&schema, "people", &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, SqlGenError::EmptyValues(_)));
    }
}
