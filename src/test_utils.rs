//! In-memory stand-ins for the database, shared by unit tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use time::macros::datetime;

use crate::db::{
    Connection, ConnectionFactory, DbError, DbResult, OutputValues, ProcedureCommand, ResultRow,
    SqlValue,
};

/// What a scripted procedure answers with.
pub enum Reply {
    Outputs(ResultRow),
    Rows(Vec<ResultRow>),
}

type Script = dyn Fn(&ProcedureCommand) -> DbResult<Reply> + Send + Sync;

struct Inner {
    script: Box<Script>,
    refuse: bool,
    calls: Mutex<Vec<ProcedureCommand>>,
    opened: AtomicUsize,
    released: AtomicUsize,
}

/// Records every command it sees and counts connections handed out and returned.
#[derive(Clone)]
pub struct FakeConnectionFactory {
    inner: Arc<Inner>,
}

impl FakeConnectionFactory {
    pub fn scripted(
        script: impl Fn(&ProcedureCommand) -> DbResult<Reply> + Send + Sync + 'static,
    ) -> Self {
        Self::build(Box::new(script), false)
    }

    pub fn outputs(row: ResultRow) -> Self {
        Self::scripted(move |_| Ok(Reply::Outputs(row.clone())))
    }

    pub fn rows(rows: Vec<ResultRow>) -> Self {
        Self::scripted(move |_| Ok(Reply::Rows(rows.clone())))
    }

    /// Every `open` fails as if the server were down.
    pub fn refusing() -> Self {
        Self::build(Box::new(|_| Ok(Reply::Rows(Vec::new()))), true)
    }

    fn build(script: Box<Script>, refuse: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                script,
                refuse,
                calls: Mutex::new(Vec::new()),
                opened: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
            }),
        }
    }

    pub fn calls(&self) -> Vec<ProcedureCommand> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> ProcedureCommand {
        self.calls().pop().expect("no procedure was called")
    }

    pub fn opened(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.inner.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionFactory for FakeConnectionFactory {
    async fn open(&self) -> DbResult<Box<dyn Connection>> {
        if self.inner.refuse {
            return Err(connection_refused());
        }
        self.inner.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeConnection {
            inner: self.inner.clone(),
        }))
    }
}

struct FakeConnection {
    inner: Arc<Inner>,
}

impl FakeConnection {
    fn run(&self, command: &ProcedureCommand) -> DbResult<Reply> {
        self.inner.calls.lock().unwrap().push(command.clone());
        (self.inner.script)(command)
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        self.inner.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn execute_non_query(&mut self, command: &ProcedureCommand) -> DbResult<OutputValues> {
        match self.run(command)? {
            Reply::Outputs(row) => Ok(OutputValues::new(row)),
            Reply::Rows(_) => Ok(OutputValues::default()),
        }
    }

    async fn execute_reader(&mut self, command: &ProcedureCommand) -> DbResult<Vec<ResultRow>> {
        match self.run(command)? {
            Reply::Rows(rows) => Ok(rows),
            Reply::Outputs(_) => Ok(Vec::new()),
        }
    }
}

pub fn connection_refused() -> DbError {
    DbError::Sqlx(sqlx::Error::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "connection refused",
    )))
}

/// Five users, mixed active flags, some never logged in.
pub fn user_fixture() -> Vec<ResultRow> {
    let user = |id: i32, email: &str, active: bool, role: i32, last_login: SqlValue| {
        ResultRow::new()
            .with("UserID", id)
            .with("Email", email)
            .with("IsActive", active)
            .with("RoleID", role)
            .with("LastLogin", last_login)
    };
    vec![
        user(1, "admin@hotel.test", true, 1, datetime!(2024-06-01 08:00:00).into()),
        user(2, "guest1@hotel.test", true, 2, SqlValue::Null),
        user(3, "guest2@hotel.test", false, 2, datetime!(2023-12-24 18:45:10).into()),
        user(4, "guest3@hotel.test", false, 2, SqlValue::Null),
        user(5, "clerk@hotel.test", true, 3, datetime!(2024-06-02 22:15:00).into()),
    ]
}

/// Behaves like `spListAllUsers`: NULL lists everyone, a flag filters on it.
pub fn list_all_users_procedure(command: &ProcedureCommand) -> DbResult<Reply> {
    let rows = user_fixture();
    let rows = match command.value("IsActive") {
        Some(SqlValue::Bool(flag)) => rows
            .into_iter()
            .filter(|r| r.value("IsActive") == Some(&SqlValue::Bool(*flag)))
            .collect(),
        _ => rows,
    };
    Ok(Reply::Rows(rows))
}
