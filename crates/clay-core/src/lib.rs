//! # clay-core
//!
//! Schema-driven building blocks for dynamic SQL persistence.
//!
//! This crate provides:
//! - A frozen [`schema::Schema`] describing tables, columns, keys and
//!   parent/child relations
//! - A dynamic [`record::Record`]: a typed bag of column values with change
//!   tracking and nested child collections, no static per-table types
//! - A [`sqlgen::Generator`] that renders INSERT/UPDATE/DELETE/SELECT
//!   statements with ordered bind parameters, parameterized over a small
//!   [`sqlgen::Dialect`] trait
//!
//! Everything here is pure and driver-free; execution lives in `clay-orm`.
//!
//! ## Example
//!
//! ```rust
//! use clay_core::schema::{Column, Schema, Table};
//! use clay_core::sqlgen::{Generator, SqliteDialect};
//! use clay_core::record::Record;
//!
//! let schema = Schema::new("app").table_def(
//!     Table::new("people", "PersonID")
//!         .column(Column::new("PersonID").identity().number())
//!         .column(Column::new("Name").not_null()),
//! );
//!
//! let mut rec = Record::new("people");
//! rec.set("Name", "Joe");
//!
//! let generator = Generator::new(SqliteDialect);
//! let (sql, args) = generator
//!     .binding_insert(&schema, "people", rec.values())
//!     .unwrap();
//! assert_eq!(sql, "INSERT INTO people (Name) VALUES (?)");
//! assert_eq!(args.len(), 1);
//! ```

pub mod error;
pub mod record;
pub mod schema;
pub mod sqlgen;
pub mod value;

pub use error::{GenResult, SchemaError, SqlGenError};
pub use record::Record;
pub use schema::{ChildRelation, Column, Schema, Table};
pub use sqlgen::{Dialect, Generator, PostgresDialect, SqliteDialect};
pub use value::{SqlValue, ToSqlValue};
