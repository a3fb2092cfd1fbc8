//! Routine executor trait and implementations
//!
//! Provides a trait for running gateway statements, with:
//! - Real implementation over a sqlx MySQL pool
//! - Mock implementation for testing

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::Value;
use sqlx::mysql::{MySql, MySqlArguments, MySqlDatabaseError};
use sqlx::query::Query;
use sqlx::{Either, Executor, MySqlPool, Row};

use super::decode;
use crate::models::{Record, SqlParam, Statement, FUNCTION_RESULT_ALIAS};

/// Trait for executing gateway statements (testable)
#[async_trait]
pub trait RoutineExecutor: Send + Sync {
    /// Run a statement and return the rows of its first result set.
    async fn fetch_first_result_set(&self, statement: &Statement) -> Result<Vec<Record>, DbError>;

    /// Run a statement and return the first column of its first row.
    async fn fetch_scalar(&self, statement: &Statement) -> Result<Value, DbError>;
}

/// Failure while executing a statement
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Raised by the server while running the statement (SIGNAL, constraint, syntax)
    #[error("{message}")]
    Server {
        /// MySQL error number (1644 for SIGNAL, 1366 for a bad value...)
        code: Option<u16>,
        sqlstate: Option<String>,
        message: String,
    },

    /// Pool, network or TLS failure
    #[error("connection error: {0}")]
    Connection(String),

    /// Decode, protocol or other driver failure
    #[error("driver error: {0}")]
    Driver(String),
}

impl DbError {
    /// A server-raised error with the given SQLSTATE
    pub fn server(sqlstate: &str, message: impl Into<String>) -> Self {
        Self::Server {
            code: None,
            sqlstate: Some(sqlstate.to_owned()),
            message: message.into(),
        }
    }

    /// A server-raised error carrying its MySQL error number
    pub fn mysql(code: u16, sqlstate: &str, message: impl Into<String>) -> Self {
        Self::Server {
            code: Some(code),
            sqlstate: Some(sqlstate.to_owned()),
            message: message.into(),
        }
    }

    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Self::Server { sqlstate, .. } => sqlstate.as_deref(),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Server { code, .. } => *code,
            _ => None,
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) => Self::Server {
                code: db
                    .try_downcast_ref::<MySqlDatabaseError>()
                    .map(MySqlDatabaseError::number),
                sqlstate: db.code().map(|code| code.into_owned()),
                message: db.message().to_owned(),
            },
            e @ (sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Configuration(_)) => Self::Connection(e.to_string()),
            other => Self::Driver(other.to_string()),
        }
    }
}

/// Executor backed by a MySQL connection pool
#[derive(Clone)]
pub struct MySqlExecutor {
    pool: MySqlPool,
}

impl MySqlExecutor {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

/// Bind every parameter positionally, in order.
fn bind_params(statement: &Statement) -> Query<'_, MySql, MySqlArguments> {
    statement
        .params
        .iter()
        .fold(sqlx::query(&statement.sql), |query, param| match param {
            SqlParam::Null => query.bind(None::<String>),
            SqlParam::Bool(v) => query.bind(*v),
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Float(v) => query.bind(*v),
            SqlParam::Text(v) => query.bind(v.clone()),
        })
}

#[async_trait]
impl RoutineExecutor for MySqlExecutor {
    async fn fetch_first_result_set(&self, statement: &Statement) -> Result<Vec<Record>, DbError> {
        // CALL yields one result set per SELECT inside the procedure, then a
        // final status packet. Keep the first set, drain the rest so the
        // connection goes back to the pool clean.
        let mut stream = self.pool.fetch_many(bind_params(statement));
        let mut records = Vec::new();
        let mut first_done = false;

        while let Some(item) = stream.try_next().await? {
            match item {
                Either::Left(_) => first_done = true,
                Either::Right(row) if !first_done => records.push(decode::row_to_record(&row)?),
                Either::Right(_) => {}
            }
        }

        Ok(records)
    }

    async fn fetch_scalar(&self, statement: &Statement) -> Result<Value, DbError> {
        let row = bind_params(statement).fetch_optional(&self.pool).await?;

        match row {
            Some(row) if !row.is_empty() => Ok(decode::column_to_json(&row, 0)?),
            _ => Ok(Value::Null),
        }
    }
}

/// Scripted outcome for [`MockExecutor`]
#[derive(Debug)]
pub enum MockResponse {
    Rows(Vec<Record>),
    Scalar(Value),
    Error(DbError),
    /// Never completes
    Hang,
}

/// Mock executor for testing
///
/// Returns scripted responses in order and records every statement it
/// receives. With no scripted response it returns an empty result.
#[derive(Default)]
pub struct MockExecutor {
    responses: Mutex<VecDeque<MockResponse>>,
    statements: Mutex<Vec<Statement>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a response to return on the next invocation
    pub fn add_response(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Statements executed so far
    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    fn next(&self, statement: &Statement) -> Option<MockResponse> {
        self.statements.lock().unwrap().push(statement.clone());
        self.responses.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl RoutineExecutor for MockExecutor {
    async fn fetch_first_result_set(&self, statement: &Statement) -> Result<Vec<Record>, DbError> {
        match self.next(statement) {
            None => Ok(Vec::new()),
            Some(MockResponse::Rows(rows)) => Ok(rows),
            Some(MockResponse::Scalar(value)) => {
                let mut record = Record::new();
                record.insert(FUNCTION_RESULT_ALIAS.into(), value);
                Ok(vec![record])
            }
            Some(MockResponse::Error(e)) => Err(e),
            Some(MockResponse::Hang) => std::future::pending().await,
        }
    }

    async fn fetch_scalar(&self, statement: &Statement) -> Result<Value, DbError> {
        match self.next(statement) {
            None => Ok(Value::Null),
            Some(MockResponse::Scalar(value)) => Ok(value),
            Some(MockResponse::Rows(rows)) => Ok(rows
                .into_iter()
                .next()
                .and_then(|row| row.into_iter().next().map(|(_, v)| v))
                .unwrap_or(Value::Null)),
            Some(MockResponse::Error(e)) => Err(e),
            Some(MockResponse::Hang) => std::future::pending().await,
        }
    }
}
