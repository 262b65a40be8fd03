//! PostgreSQL dialect.

use super::Dialect;

/// PostgreSQL syntax: numbered `$N` placeholders, `RETURNING` for generated
/// identities, `gen_random_uuid()` default identities.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn placeholder(&self, index: usize, _column: &str) -> String {
        format!("${index}")
    }

    fn identity_return_clause(&self, column: &str) -> Option<String> {
        Some(format!("RETURNING {column}"))
    }

    fn default_identity_expr(&self) -> &'static str {
        "gen_random_uuid()"
    }
}
