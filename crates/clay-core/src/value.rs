//! SQL values and parameter handling.
//!
//! Every value that flows between a [`crate::record::Record`] and the SQL
//! generator is one of the variants below. Keeping the set closed means the
//! generator's rendering dispatch is an exhaustive match rather than a
//! runtime type switch with a failure arm.

/// A SQL value that can be stored in a record and bound as a parameter.
///
/// All variants except [`SqlValue::Expr`] travel as bind parameters and are
/// never interpolated into statement text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL. Distinct from a column that was never fetched or set.
    Null,
    /// Text value.
    Text(String),
    /// Signed 64-bit integer.
    Int(i64),
    /// Unsigned 64-bit integer. Rendered as decimal text at bind time since
    /// the supported drivers have no native unsigned type.
    UInt(u64),
    /// Double-precision float.
    Float(f64),
    /// A raw SQL expression, emitted verbatim into the statement text
    /// instead of being bound (e.g. `CURRENT_TIMESTAMP` or a database-side
    /// GUID call). Never escaped, never parameterized.
    Expr(String),
}

impl SqlValue {
    /// Creates a raw expression value.
    pub fn expr(text: impl Into<String>) -> Self {
        Self::Expr(text.into())
    }

    /// Returns whether this value is a raw expression.
    #[must_use]
    pub fn is_expr(&self) -> bool {
        matches!(self, Self::Expr(_))
    }

    /// Returns whether this value is SQL NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for i16 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for i8 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u16 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u8 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::UInt(self)
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(42_i32.to_sql_value(), SqlValue::Int(42));
        assert_eq!(42_u64.to_sql_value(), SqlValue::UInt(42));
        assert_eq!(2.5_f64.to_sql_value(), SqlValue::Float(2.5));
        assert_eq!(true.to_sql_value(), SqlValue::Int(1));
        assert_eq!(
            "hello".to_sql_value(),
            SqlValue::Text(String::from("hello"))
        );
    }

    #[test]
    fn test_option_conversions() {
        assert_eq!(None::<i32>.to_sql_value(), SqlValue::Null);
        assert_eq!(Some(42_i32).to_sql_value(), SqlValue::Int(42));
    }

    #[test]
    fn test_expr_marker() {
        let v = SqlValue::expr("CURRENT_TIMESTAMP");
        assert!(v.is_expr());
        assert!(!v.is_null());
        assert!(!SqlValue::Int(1).is_expr());
    }
}
