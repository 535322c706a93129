use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{
    pool::PoolConnection,
    postgres::{PgArguments, PgPoolOptions, PgRow},
    query::Query,
    Column, PgPool, Postgres, Row, TypeInfo,
};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tracing::debug;

use super::{
    Connection, ConnectionFactory, DbError, DbResult, Direction, OutputValues, ProcedureCommand,
    ResultRow, SqlType, SqlValue,
};
use crate::config::AppConfig;

/// Hands out pooled Postgres connections, one per repository call.
#[derive(Clone)]
pub struct PgConnectionFactory {
    pool: PgPool,
}

impl PgConnectionFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ConnectionFactory for PgConnectionFactory {
    async fn open(&self) -> DbResult<Box<dyn Connection>> {
        let conn = self.pool.acquire().await?;
        Ok(Box::new(PgSession { conn }))
    }
}

struct PgSession {
    conn: PoolConnection<Postgres>,
}

#[async_trait]
impl Connection for PgSession {
    async fn execute_non_query(&mut self, command: &ProcedureCommand) -> DbResult<OutputValues> {
        let sql = render_call(command);
        debug!(procedure = command.name(), %sql, "execute non-query");
        let row = bind_inputs(sqlx::query(&sql), command)
            .fetch_optional(&mut *self.conn)
            .await?;
        let values = match row {
            Some(row) => decode_row(&row)?,
            None => ResultRow::new(),
        };
        Ok(OutputValues::new(values))
    }

    async fn execute_reader(&mut self, command: &ProcedureCommand) -> DbResult<Vec<ResultRow>> {
        let sql = render_select(command);
        debug!(procedure = command.name(), %sql, "execute reader");
        let rows = bind_inputs(sqlx::query(&sql), command)
            .fetch_all(&mut *self.conn)
            .await?;
        rows.iter().map(decode_row).collect()
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `CALL "proc"($1, $2, NULL::int4, ...)`: outputs travel as typed NULL
/// placeholders and come back in the single returned row.
fn render_call(command: &ProcedureCommand) -> String {
    let mut next = 0;
    let args: Vec<String> = command
        .parameters()
        .iter()
        .map(|p| match p.direction {
            Direction::Input => {
                next += 1;
                format!("${next}")
            }
            Direction::Output => format!("NULL::{}", p.sql_type.pg_name()),
        })
        .collect();
    format!("CALL {}({})", quote_ident(command.name()), args.join(", "))
}

/// `SELECT * FROM "proc"($1, ...)`: set-returning functions take inputs only.
fn render_select(command: &ProcedureCommand) -> String {
    let args: Vec<String> = (1..=command.inputs().count())
        .map(|i| format!("${i}"))
        .collect();
    format!(
        "SELECT * FROM {}({})",
        quote_ident(command.name()),
        args.join(", ")
    )
}

fn bind_inputs<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    command: &ProcedureCommand,
) -> Query<'q, Postgres, PgArguments> {
    for param in command.inputs() {
        query = match (&param.value, param.sql_type) {
            (SqlValue::Int(v), _) => query.bind(*v),
            (SqlValue::Bool(v), _) => query.bind(*v),
            (SqlValue::Text(v), _) => query.bind(v.clone()),
            (SqlValue::DateTime(v), _) => query.bind(*v),
            (SqlValue::Null, SqlType::Int) => query.bind(None::<i32>),
            (SqlValue::Null, SqlType::Bit) => query.bind(None::<bool>),
            (SqlValue::Null, SqlType::NVarChar(_)) => query.bind(None::<String>),
            (SqlValue::Null, SqlType::DateTime) => query.bind(None::<PrimitiveDateTime>),
        };
    }
    query
}

fn decode_row(row: &PgRow) -> DbResult<ResultRow> {
    let mut out = ResultRow::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let value = match column.type_info().name() {
            "INT2" => row
                .try_get::<Option<i16>, _>(idx)?
                .map(|v| SqlValue::Int(v.into())),
            "INT4" => row.try_get::<Option<i32>, _>(idx)?.map(SqlValue::Int),
            "BOOL" => row.try_get::<Option<bool>, _>(idx)?.map(SqlValue::Bool),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
                row.try_get::<Option<String>, _>(idx)?.map(SqlValue::Text)
            }
            "TIMESTAMP" => row
                .try_get::<Option<PrimitiveDateTime>, _>(idx)?
                .map(SqlValue::DateTime),
            "TIMESTAMPTZ" => row
                .try_get::<Option<OffsetDateTime>, _>(idx)?
                .map(|v| {
                    let utc = v.to_offset(UtcOffset::UTC);
                    SqlValue::DateTime(PrimitiveDateTime::new(utc.date(), utc.time()))
                }),
            other => {
                return Err(DbError::UnsupportedType {
                    column: column.name().to_owned(),
                    type_name: other.to_owned(),
                })
            }
        };
        out.push(column.name(), value.unwrap_or(SqlValue::Null));
    }
    Ok(out)
}
