//! Stored-procedure client.
//!
//! Repositories talk to the database only through [`ConnectionFactory`] and
//! [`Connection`]; the Postgres pool in [`postgres`] is the production
//! implementation.

mod command;
pub mod postgres;
mod row;

pub use command::{Direction, ProcedureCommand, SqlParameter, SqlType, SqlValue};
pub use row::{OutputValues, ResultRow};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("column '{0}' not found in result")]
    ColumnNotFound(String),
    #[error("column '{0}' is NULL")]
    UnexpectedNull(String),
    #[error("column '{column}' is not of type {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
    },
    #[error("column '{column}' has unsupported type {type_name}")]
    UnsupportedType { column: String, type_name: String },
}

pub type DbResult<T> = Result<T, DbError>;

/// A connection held exclusively for one repository call.
///
/// Dropping it hands it back to wherever it came from.
#[async_trait]
pub trait Connection: Send {
    async fn execute_non_query(&mut self, command: &ProcedureCommand) -> DbResult<OutputValues>;
    async fn execute_reader(&mut self, command: &ProcedureCommand) -> DbResult<Vec<ResultRow>>;
}

#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn open(&self) -> DbResult<Box<dyn Connection>>;
}
