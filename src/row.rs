//! Schema-shaped rows shared by the quality checks and the writers.
//!
//! Typed records convert into [`Row`]s laid out in their [`TableSchema`]'s
//! column order, so checks and exports can work on any table generically.

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

use crate::schema::TableSchema;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Boolean(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(f) => Some(*f),
            _ => None,
        }
    }

    /// Comparable form used for key matching; `None` for null
    pub fn key(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn bind_to(&self, idx: usize, stmt: &mut rusqlite::Statement) -> rusqlite::Result<()> {
        match self {
            Value::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null)?,
            Value::Integer(i) => stmt.raw_bind_parameter(idx, i)?,
            Value::Real(f) => stmt.raw_bind_parameter(idx, f)?,
            Value::Text(s) => stmt.raw_bind_parameter(idx, s.as_str())?,
            Value::Boolean(b) => stmt.raw_bind_parameter(idx, i64::from(*b))?,
        }
        Ok(())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Text(v.format("%Y-%m-%d").to_string())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Text(v.format("%Y-%m-%dT%H:%M:%S").to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One row, values in schema column order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn get(&self, idx: usize) -> &Value {
        self.values.get(idx).unwrap_or(&Value::Null)
    }
}

/// Implemented by every typed record that maps onto a table schema
pub trait IntoRow {
    fn schema() -> &'static TableSchema;
    fn to_row(&self) -> Row;
}

/// A materialized table: schema plus rows
#[derive(Debug, Clone)]
pub struct Table {
    pub schema: &'static TableSchema,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn from_records<T: IntoRow>(records: &[T]) -> Self {
        Self {
            schema: T::schema(),
            rows: records.iter().map(IntoRow::to_row).collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.schema.name
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of a single column, or `None` if the schema has no such column
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Value> + 'a> {
        let idx = self.schema.column_index(name)?;
        Some(self.rows.iter().map(move |row| row.get(idx)))
    }
}

/// Build a row from values listed in schema column order
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        $crate::row::Row {
            values: vec![$($crate::row::Value::from($value)),*],
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalizes_numbers_and_text() {
        assert_eq!(Value::Integer(42).key().as_deref(), Some("42"));
        assert_eq!(Value::from("web").key().as_deref(), Some("web"));
        assert_eq!(Value::Null.key(), None);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(2.5)), Value::Real(2.5));

        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Value::from(date), Value::Text("2024-03-09".into()));
    }

    #[test]
    fn test_row_macro_and_out_of_range_get() {
        let row = row![1i64, "a", None::<f64>, true];
        assert_eq!(row.values.len(), 4);
        assert_eq!(row.get(3), &Value::Boolean(true));
        assert_eq!(row.get(10), &Value::Null);
    }
}
