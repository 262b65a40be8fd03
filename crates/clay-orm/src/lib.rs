//! # clay-orm
//!
//! Schema-driven persistence without static per-table types.
//!
//! This crate provides:
//! - [`Orm`]: insert-vs-update decisions, identity propagation, recursive
//!   graph saves, and partial-key retrieval over dynamic [`Record`]s
//! - [`transact`]: an opt-in commit-or-rollback wrapper; outside it, every
//!   operation runs against whatever connection or transaction the caller
//!   passes in
//! - [`execute_raw`]: bare statement execution for callers that own DDL
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! use clay_core::schema::{Column, Schema, Table};
//! use clay_core::{Record, SqlValue};
//! use clay_orm::Orm;
//! use sqlx::SqlitePool;
//!
//! async fn example(pool: &SqlitePool) -> clay_orm::Result<()> {
//!     let schema = Arc::new(
//!         Schema::new("app").table_def(
//!             Table::new("people", "PersonID")
//!                 .column(Column::new("PersonID").identity().number())
//!                 .column(Column::new("Name").not_null()),
//!         ),
//!     );
//!     let orm = Orm::sqlite(schema);
//!     let mut conn = pool.acquire().await?;
//!
//!     let mut person = Record::new("people");
//!     person.set("Name", "Joe");
//!     orm.save_all(&mut conn, &mut person).await?;
//!
//!     let mut key = BTreeMap::new();
//!     key.insert(String::from("PersonID"), person.get("PersonID").cloned().unwrap());
//!     let fetched = orm.retrieve(&mut conn, "people", &key).await?;
//!     assert!(fetched.is_some());
//!     Ok(())
//! }
//! ```

mod error;
mod exec;
mod orm;

pub use error::{OrmError, Result};
pub use exec::{execute_raw, transact};
pub use orm::Orm;

// Re-export the core types callers need to build schemas and records.
pub use clay_core::{ChildRelation, Column, Record, Schema, SqlValue, Table, ToSqlValue};
