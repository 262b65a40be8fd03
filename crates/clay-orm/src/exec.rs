//! Statement execution plumbing.
//!
//! Every orchestrator operation funnels through here: bind-argument
//! translation to sqlx, statement logging, the raw-statement helper, and the
//! transaction wrapper. All entry points take `&mut SqliteConnection`, which
//! both a pooled connection and an open transaction dereference to, so a
//! bare connection and a transaction are interchangeable capabilities.

use clay_core::SqlValue;
use futures::future::BoxFuture;
use sqlx::sqlite::{SqliteArguments, SqliteQueryResult, SqliteRow};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, error, info};

use crate::error::{OrmError, Result};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Binds a `SqlValue` to a query. Raw expressions never reach this point:
/// the generator splices them into the statement text and compacts them out
/// of the argument list. A stray one binds as its text.
pub(crate) fn bind_value(query: SqliteQuery<'_>, value: SqlValue) -> SqliteQuery<'_> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::UInt(u) => query.bind(u.to_string()),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Expr(s) => query.bind(s),
    }
}

/// Logs a statement and its bind arguments. The `CLAY_DEBUG` switch raises
/// the level from `debug` to `info`; it never changes behavior.
pub(crate) fn log_statement(table: &str, sql: &str, args: &[SqlValue]) {
    if std::env::var_os("CLAY_DEBUG").is_some() {
        info!(table = %table, sql = %sql, args = ?args, "executing statement");
    } else {
        debug!(table = %table, sql = %sql, args = ?args, "executing statement");
    }
}

/// Executes a generated statement, wrapping failures with the target table.
pub(crate) async fn execute_stmt(
    conn: &mut SqliteConnection,
    table: &str,
    sql: &str,
    args: Vec<SqlValue>,
) -> Result<SqliteQueryResult> {
    log_statement(table, sql, &args);
    let mut query = sqlx::query(sql);
    for arg in args {
        query = bind_value(query, arg);
    }
    query
        .execute(&mut *conn)
        .await
        .map_err(|source| OrmError::Execute {
            table: String::from(table),
            source,
        })
}

/// Runs a generated query and returns all rows, wrapping failures with the
/// target table.
pub(crate) async fn fetch_rows(
    conn: &mut SqliteConnection,
    table: &str,
    sql: &str,
    args: Vec<SqlValue>,
) -> Result<Vec<SqliteRow>> {
    log_statement(table, sql, &args);
    let mut query = sqlx::query(sql);
    for arg in args {
        query = bind_value(query, arg);
    }
    query
        .fetch_all(&mut *conn)
        .await
        .map_err(|source| OrmError::Execute {
            table: String::from(table),
            source,
        })
}

/// Prepares and executes a bare SQL statement against a connection.
///
/// Useful for DDL in test setups and for callers that own table creation;
/// generated statements go through the orchestrator instead.
pub async fn execute_raw(conn: &mut SqliteConnection, sql: &str) -> Result<u64> {
    debug!(sql = %sql, "executing raw statement");
    let result = sqlx::query(sql).execute(conn).await?;
    Ok(result.rows_affected())
}

/// Runs a closure inside a transaction: commits on `Ok`, rolls back on
/// `Err`. A rollback failure is logged and the closure's error wins.
///
/// The orchestrator never opens transactions on its own; multi-statement
/// atomicity is opt-in through this helper or a caller-managed transaction.
pub async fn transact<T, F>(pool: &SqlitePool, f: F) -> Result<T>
where
    F: for<'t> FnOnce(&'t mut Transaction<'static, Sqlite>) -> BoxFuture<'t, Result<T>>,
{
    let mut tx = pool.begin().await?;
    match f(&mut tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
