//! SQLite dialect.

use super::Dialect;

/// SQLite syntax: positional `?` placeholders, identities read back through
/// the driver's last-insert-rowid, hex-GUID default identities.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize, _column: &str) -> String {
        String::from("?")
    }

    fn default_identity_expr(&self) -> &'static str {
        "lower(hex(randomblob(16)))"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_positional() {
        let dialect = SqliteDialect;
        assert_eq!(dialect.placeholder(1, "Name"), "?");
        assert_eq!(dialect.placeholder(9, "Age"), "?");
    }

    #[test]
    fn test_no_identity_return_clause() {
        assert!(SqliteDialect.identity_return_clause("PersonID").is_none());
    }
}
