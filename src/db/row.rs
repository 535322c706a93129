use time::PrimitiveDateTime;

use super::{DbError, DbResult, SqlValue};

/// One row returned by a procedure. Column lookup ignores ASCII case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    columns: Vec<(String, SqlValue)>,
}

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.push(column, value.into());
        self
    }

    pub fn push(&mut self, column: &str, value: SqlValue) {
        self.columns.push((column.to_owned(), value));
    }

    pub fn value(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, v)| v)
    }

    fn require(&self, column: &str) -> DbResult<&SqlValue> {
        self.value(column)
            .ok_or_else(|| DbError::ColumnNotFound(column.to_owned()))
    }

    pub fn get_i32(&self, column: &str) -> DbResult<i32> {
        self.get_optional_i32(column)?
            .ok_or_else(|| DbError::UnexpectedNull(column.to_owned()))
    }

    pub fn get_optional_i32(&self, column: &str) -> DbResult<Option<i32>> {
        match self.require(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Int(v) => Ok(Some(*v)),
            _ => Err(mismatch(column, "int")),
        }
    }

    pub fn get_bool(&self, column: &str) -> DbResult<bool> {
        match self.require(column)? {
            SqlValue::Bool(v) => Ok(*v),
            SqlValue::Null => Err(DbError::UnexpectedNull(column.to_owned())),
            _ => Err(mismatch(column, "bit")),
        }
    }

    pub fn get_string(&self, column: &str) -> DbResult<String> {
        self.get_optional_string(column)?
            .ok_or_else(|| DbError::UnexpectedNull(column.to_owned()))
    }

    pub fn get_optional_string(&self, column: &str) -> DbResult<Option<String>> {
        match self.require(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(v) => Ok(Some(v.clone())),
            _ => Err(mismatch(column, "nvarchar")),
        }
    }

    pub fn get_optional_datetime(&self, column: &str) -> DbResult<Option<PrimitiveDateTime>> {
        match self.require(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::DateTime(v) => Ok(Some(*v)),
            _ => Err(mismatch(column, "datetime")),
        }
    }
}

fn mismatch(column: &str, expected: &'static str) -> DbError {
    DbError::TypeMismatch {
        column: column.to_owned(),
        expected,
    }
}

/// Output parameter values read back after a non-query call.
///
/// A declared output the driver did not return reads as NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputValues(ResultRow);

impl OutputValues {
    pub fn new(row: ResultRow) -> Self {
        Self(row)
    }

    pub fn int(&self, name: &str) -> DbResult<Option<i32>> {
        match self.0.value(name) {
            None => Ok(None),
            Some(_) => self.0.get_optional_i32(name),
        }
    }

    pub fn text(&self, name: &str) -> DbResult<Option<String>> {
        match self.0.value(name) {
            None => Ok(None),
            Some(_) => self.0.get_optional_string(name),
        }
    }
}
