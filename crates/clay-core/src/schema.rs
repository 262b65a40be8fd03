//! Schema metadata types.
//!
//! These types describe the relational layout the persistence layer works
//! against: tables, columns, primary keys and parent/child relations. A
//! [`Schema`] is constructed once (in code or from JSON via serde) and then
//! treated as frozen; the orchestrator shares it behind an `Arc` and never
//! mutates it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Schema definition for a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Whether the column allows NULL values.
    #[serde(default = "default_true")]
    pub allow_null: bool,
    /// Whether the column holds an integer quantity. Float values bound to
    /// such a column are truncated during rendering.
    #[serde(default)]
    pub is_number: bool,
    /// Whether this column is the table's identity column.
    #[serde(default)]
    pub is_identity: bool,
    /// Whether this column references a parent table.
    #[serde(default)]
    pub is_foreign_key: bool,
    /// Whether this column carries a UNIQUE constraint.
    #[serde(default)]
    pub is_unique: bool,
    /// Declared length, if any (e.g. VARCHAR width).
    #[serde(default)]
    pub length: usize,
    /// The database-side type name, used to pick a decode strategy when
    /// reconstituting rows.
    #[serde(default)]
    pub db_type: String,
    /// Default value expression, if any.
    #[serde(default)]
    pub default_value: String,
}

fn default_true() -> bool {
    true
}

impl Column {
    /// Creates a new nullable column.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allow_null: true,
            is_number: false,
            is_identity: false,
            is_foreign_key: false,
            is_unique: false,
            length: 0,
            db_type: String::new(),
            default_value: String::new(),
        }
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.allow_null = false;
        self
    }

    /// Marks the column as an integer quantity.
    #[must_use]
    pub fn number(mut self) -> Self {
        self.is_number = true;
        self
    }

    /// Marks the column as the table's identity column.
    #[must_use]
    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self.allow_null = false;
        self
    }

    /// Marks the column as a foreign key.
    #[must_use]
    pub fn foreign_key(mut self) -> Self {
        self.is_foreign_key = true;
        self
    }

    /// Marks the column UNIQUE.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    /// Sets the declared length.
    #[must_use]
    pub fn length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Sets the database-side type name.
    #[must_use]
    pub fn db_type(mut self, db_type: impl Into<String>) -> Self {
        self.db_type = db_type.into();
        self
    }
}

/// A parent-to-child table relationship.
///
/// Declared on the parent table, keyed by the child table's name. The local
/// column lives on the parent, the foreign column on the child. Composite
/// joins set `multi_key` and use the plural column lists instead.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChildRelation {
    /// The parent table's name.
    #[serde(default)]
    pub parent_table: String,
    /// Whether the join is composite.
    #[serde(default)]
    pub multi_key: bool,
    /// Join column on the parent side. Empty means the parent's primary key.
    #[serde(default)]
    pub local_column: String,
    /// Join column on the child side.
    #[serde(default)]
    pub foreign_column: String,
    /// Parent-side join columns for composite joins.
    #[serde(default)]
    pub local_columns: Vec<String>,
    /// Child-side join columns for composite joins.
    #[serde(default)]
    pub foreign_columns: Vec<String>,
}

impl ChildRelation {
    /// Creates a single-column relation.
    #[must_use]
    pub fn new(
        parent_table: impl Into<String>,
        local_column: impl Into<String>,
        foreign_column: impl Into<String>,
    ) -> Self {
        Self {
            parent_table: parent_table.into(),
            multi_key: false,
            local_column: local_column.into(),
            foreign_column: foreign_column.into(),
            local_columns: Vec::new(),
            foreign_columns: Vec::new(),
        }
    }

    /// Creates a composite relation over parallel column lists.
    #[must_use]
    pub fn composite(
        parent_table: impl Into<String>,
        local_columns: Vec<String>,
        foreign_columns: Vec<String>,
    ) -> Self {
        Self {
            parent_table: parent_table.into(),
            multi_key: true,
            local_column: String::new(),
            foreign_column: String::new(),
            local_columns,
            foreign_columns,
        }
    }

    /// Returns the parent/child join column pairs for this relation.
    #[must_use]
    pub fn join_pairs(&self) -> Vec<(&str, &str)> {
        if self.multi_key {
            self.local_columns
                .iter()
                .map(String::as_str)
                .zip(self.foreign_columns.iter().map(String::as_str))
                .collect()
        } else {
            vec![(self.local_column.as_str(), self.foreign_column.as_str())]
        }
    }
}

/// Schema definition for a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name as declared in the database.
    pub name: String,
    /// Display-name override. When set it wins over `name` in generated SQL.
    #[serde(default)]
    pub alias: String,
    /// The identity (primary key) column name.
    pub primary: String,
    /// Whether WHERE clauses key on the primary key plus the declared
    /// foreign keys instead of the primary key alone.
    #[serde(default)]
    pub multi_key: bool,
    /// Whether callers (or a default identity expression) supply the primary
    /// key, as opposed to a database-generated identity.
    #[serde(default)]
    pub caller_supplies_pk: bool,
    /// Foreign key column names, consulted when `multi_key` is set.
    #[serde(default)]
    pub foreign_keys: Vec<String>,
    /// Column definitions, keyed by column name.
    pub columns: BTreeMap<String, Column>,
    /// Columns to fetch on retrieval. Empty means all columns.
    #[serde(default)]
    pub essential_columns: Vec<String>,
    /// Names of tables this table is a child of.
    #[serde(default)]
    pub parent_tables: Vec<String>,
    /// Child relations, keyed by child table name.
    #[serde(default)]
    pub children: BTreeMap<String, ChildRelation>,
}

impl Table {
    /// Creates a new table with the given identity column.
    #[must_use]
    pub fn new(name: impl Into<String>, primary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: String::new(),
            primary: primary.into(),
            multi_key: false,
            caller_supplies_pk: false,
            foreign_keys: Vec::new(),
            columns: BTreeMap::new(),
            essential_columns: Vec::new(),
            parent_tables: Vec::new(),
            children: BTreeMap::new(),
        }
    }

    /// Adds a column definition.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.insert(column.name.clone(), column);
        self
    }

    /// Sets the display-name override.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Marks the primary key as caller-supplied.
    #[must_use]
    pub fn caller_supplies_pk(mut self) -> Self {
        self.caller_supplies_pk = true;
        self
    }

    /// Declares a foreign key column and enables multi-key WHERE clauses.
    #[must_use]
    pub fn with_foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_keys.push(column.into());
        self.multi_key = true;
        self
    }

    /// Declares a child relation.
    #[must_use]
    pub fn child(mut self, child_table: impl Into<String>, relation: ChildRelation) -> Self {
        self.children.insert(child_table.into(), relation);
        self
    }

    /// Declares a parent table.
    #[must_use]
    pub fn parent(mut self, parent_table: impl Into<String>) -> Self {
        self.parent_tables.push(parent_table.into());
        self
    }

    /// Restricts retrieval to the given columns.
    #[must_use]
    pub fn essential(mut self, columns: &[&str]) -> Self {
        self.essential_columns = columns.iter().map(|c| String::from(*c)).collect();
        self
    }

    /// Returns the name to use in generated SQL: the alias when one is set,
    /// the declared name otherwise.
    #[must_use]
    pub fn resolved_name(&self) -> &str {
        if self.alias.is_empty() {
            &self.name
        } else {
            &self.alias
        }
    }

    /// Looks up a column definition.
    pub fn column_def(&self, name: &str) -> Result<&Column, SchemaError> {
        self.columns.get(name).ok_or_else(|| SchemaError::UnknownColumn {
            table: self.name.clone(),
            column: String::from(name),
        })
    }

    /// Returns whether the table declares the named column.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Returns the columns fetched on retrieval: the essential columns when
    /// declared, otherwise every column in name order.
    #[must_use]
    pub fn select_columns(&self) -> Vec<&str> {
        if self.essential_columns.is_empty() {
            self.columns.keys().map(String::as_str).collect()
        } else {
            self.essential_columns.iter().map(String::as_str).collect()
        }
    }

    /// Returns the columns a WHERE clause keys on: the primary key, plus the
    /// declared foreign keys for multi-key tables.
    #[must_use]
    pub fn key_columns(&self) -> Vec<&str> {
        let mut cols = vec![self.primary.as_str()];
        if self.multi_key {
            cols.extend(self.foreign_keys.iter().map(String::as_str));
        }
        cols
    }

    /// Returns the parent-side join column for a relation, falling back to
    /// the primary key when the relation leaves it unspecified.
    #[must_use]
    pub fn local_join_column<'a>(&'a self, relation: &'a ChildRelation) -> &'a str {
        if relation.local_column.is_empty() {
            &self.primary
        } else {
            &relation.local_column
        }
    }
}

/// The complete schema: a frozen set of table definitions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    /// Schema name.
    #[serde(default)]
    pub name: String,
    /// Table definitions, keyed by table key.
    pub tables: BTreeMap<String, Table>,
    /// Lookup-name aliases, mapping an alternate key to a table key.
    #[serde(default)]
    pub table_aliases: BTreeMap<String, String>,
}

impl Schema {
    /// Creates a new empty schema.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: BTreeMap::new(),
            table_aliases: BTreeMap::new(),
        }
    }

    /// Adds a table definition.
    #[must_use]
    pub fn table_def(mut self, table: Table) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }

    /// Adds a lookup alias for a table key.
    #[must_use]
    pub fn table_alias(mut self, alias: impl Into<String>, table: impl Into<String>) -> Self {
        self.table_aliases.insert(alias.into(), table.into());
        self
    }

    /// Looks up a table by key or alias. Unknown tables are a caller error
    /// and surface immediately.
    pub fn table(&self, name: &str) -> Result<&Table, SchemaError> {
        let key = self.table_aliases.get(name).map_or(name, String::as_str);
        self.tables
            .get(key)
            .ok_or_else(|| SchemaError::UnknownTable(String::from(name)))
    }

    /// Checks the schema's cross-table invariants: essential columns must be
    /// declared, every child relation must reference declared tables and
    /// columns on both sides of the join, and composite relations must pair
    /// their column lists one-to-one.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for (table_key, table) in &self.tables {
            if !table.has_column(&table.primary) {
                return Err(SchemaError::UnknownColumn {
                    table: table_key.clone(),
                    column: table.primary.clone(),
                });
            }
            for name in &table.essential_columns {
                if !table.has_column(name) {
                    return Err(SchemaError::UnknownColumn {
                        table: table_key.clone(),
                        column: name.clone(),
                    });
                }
            }
            for (child_name, relation) in &table.children {
                let child = self
                    .tables
                    .get(child_name)
                    .ok_or_else(|| SchemaError::UnknownTable(child_name.clone()))?;
                if relation.multi_key
                    && relation.local_columns.len() != relation.foreign_columns.len()
                {
                    return Err(SchemaError::MismatchedJoinColumns {
                        table: table_key.clone(),
                        child: child_name.clone(),
                        local: relation.local_columns.len(),
                        foreign: relation.foreign_columns.len(),
                    });
                }
                for (local, foreign) in relation.join_pairs() {
                    let local = if local.is_empty() {
                        table.primary.as_str()
                    } else {
                        local
                    };
                    if !table.has_column(local) {
                        return Err(SchemaError::InvalidChildRelation {
                            table: table_key.clone(),
                            child: child_name.clone(),
                            column: String::from(local),
                        });
                    }
                    if !child.has_column(foreign) {
                        return Err(SchemaError::InvalidChildRelation {
                            table: table_key.clone(),
                            child: child_name.clone(),
                            column: String::from(foreign),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people_table() -> Table {
        Table::new("people", "PersonID")
            .column(Column::new("PersonID").identity().number())
            .column(Column::new("Name").not_null().length(255))
            .column(Column::new("Age").number())
            .child(
                "addresses",
                ChildRelation::new("people", "PersonID", "PersonID"),
            )
    }

    fn addresses_table() -> Table {
        Table::new("addresses", "AddressID")
            .column(Column::new("AddressID").identity().number())
            .column(Column::new("PersonID").number().foreign_key())
            .column(Column::new("Address1"))
            .parent("people")
    }

    #[test]
    fn test_table_lookup_and_alias() {
        let schema = Schema::new("test")
            .table_def(people_table())
            .table_alias("person", "people");

        assert!(schema.table("people").is_ok());
        assert_eq!(schema.table("person").unwrap().name, "people");
        assert!(matches!(
            schema.table("nope"),
            Err(SchemaError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_resolved_name_prefers_alias() {
        let table = Table::new("people", "PersonID").alias("app_people");
        assert_eq!(table.resolved_name(), "app_people");

        let plain = Table::new("people", "PersonID");
        assert_eq!(plain.resolved_name(), "people");
    }

    #[test]
    fn test_select_columns_sorted_or_essential() {
        let table = people_table();
        assert_eq!(table.select_columns(), vec!["Age", "Name", "PersonID"]);

        let trimmed = people_table().essential(&["PersonID", "Name"]);
        assert_eq!(trimmed.select_columns(), vec!["PersonID", "Name"]);
    }

    #[test]
    fn test_key_columns_multi_key() {
        let single = addresses_table();
        assert_eq!(single.key_columns(), vec!["AddressID"]);

        let multi = addresses_table().with_foreign_key("PersonID");
        assert_eq!(multi.key_columns(), vec!["AddressID", "PersonID"]);
    }

    #[test]
    fn test_validate_catches_bad_relation() {
        let schema = Schema::new("test")
            .table_def(people_table())
            .table_def(addresses_table());
        assert!(schema.validate().is_ok());

        let broken = Schema::new("test")
            .table_def(
                Table::new("people", "PersonID")
                    .column(Column::new("PersonID").identity())
                    .child(
                        "addresses",
                        ChildRelation::new("people", "PersonID", "NoSuchColumn"),
                    ),
            )
            .table_def(addresses_table());
        assert!(matches!(
            broken.validate(),
            Err(SchemaError::InvalidChildRelation { .. })
        ));
    }

    #[test]
    fn test_composite_join_pairs_line_up() {
        let relation = ChildRelation::composite(
            "orders",
            vec![String::from("OrderID"), String::from("TenantID")],
            vec![String::from("OrderID"), String::from("TenantID")],
        );
        assert_eq!(
            relation.join_pairs(),
            vec![("OrderID", "OrderID"), ("TenantID", "TenantID")]
        );
    }

    #[test]
    fn test_validate_rejects_mismatched_composite_lists() {
        // Two parent-side columns against one child-side column: without the
        // length check the second pair would silently never join.
        let schema = Schema::new("test")
            .table_def(
                Table::new("orders", "OrderID")
                    .column(Column::new("OrderID").identity().number())
                    .column(Column::new("TenantID").number())
                    .child(
                        "order_lines",
                        ChildRelation::composite(
                            "orders",
                            vec![String::from("OrderID"), String::from("TenantID")],
                            vec![String::from("OrderID")],
                        ),
                    ),
            )
            .table_def(
                Table::new("order_lines", "LineID")
                    .column(Column::new("LineID").identity().number())
                    .column(Column::new("OrderID").number().foreign_key())
                    .parent("orders"),
            );
        assert!(matches!(
            schema.validate(),
            Err(SchemaError::MismatchedJoinColumns {
                local: 2,
                foreign: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_validate_checks_essential_columns() {
        let schema = Schema::new("test")
            .table_def(people_table().essential(&["PersonID", "Nmae"]))
            .table_def(addresses_table());
        assert!(matches!(
            schema.validate(),
            Err(SchemaError::UnknownColumn { ref column, .. }) if column == "Nmae"
        ));

        let ok = Schema::new("test")
            .table_def(people_table().essential(&["PersonID", "Name"]))
            .table_def(addresses_table());
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_schema_from_json() {
        let raw = r#"{
            "name": "test",
            "tables": {
                "people": {
                    "name": "people",
                    "primary": "PersonID",
                    "columns": {
                        "PersonID": { "name": "PersonID", "is_identity": true, "is_number": true },
                        "Name": { "name": "Name", "allow_null": false }
                    }
                }
            }
        }"#;
        let schema: Schema = serde_json::from_str(raw).unwrap();
        let table = schema.table("people").unwrap();
        assert_eq!(table.primary, "PersonID");
        assert!(table.column_def("PersonID").unwrap().is_identity);
        assert!(!table.column_def("Name").unwrap().allow_null);
        assert!(schema.validate().is_ok());
    }
}
