//! Procedure gateway - the single path to stored routines
//!
//! Turns "routine name + ordered parameters" into a bound statement, runs it
//! through a [`RoutineExecutor`], and reports failures as [`GatewayError`].
//! Both database error channels end up here:
//! - errors raised by the server (`SIGNAL`, constraints)
//! - error-marker strings returned by SQL functions
//!
//! The gateway does not decide which failures are the client's fault; the
//! HTTP layer does.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use sqlx::MySqlPool;

use super::decode;
use super::executor::{DbError, MySqlExecutor, RoutineExecutor};
use crate::models::{FunctionCall, ProcedureCall, Record, RoutineName, SqlParam, ValidationError};

/// Prefix a SQL function uses to return an error instead of a value
pub const ERROR_SENTINEL_PREFIX: &str = "Lỗi:";

/// Gateway failure
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Routine name is not a bare identifier (caller bug)
    #[error("invalid routine name '{name}': {source}")]
    InvalidName {
        name: String,
        source: ValidationError,
    },

    /// The statement failed; Display is the driver message verbatim
    #[error("{source}")]
    Procedure { routine: String, source: DbError },

    /// A SQL function returned an error-marker string
    #[error("{0}")]
    Sentinel(String),

    /// The call did not complete within the configured timeout
    #[error("call to {routine} timed out after {timeout:?}")]
    Timeout { routine: String, timeout: Duration },
}

impl GatewayError {
    /// SQLSTATE reported by the database, if it raised the error
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Self::Procedure { source, .. } => source.sqlstate(),
            _ => None,
        }
    }
}

/// Stored procedure / function gateway
#[derive(Clone)]
pub struct Gateway {
    executor: Arc<dyn RoutineExecutor>,
    call_timeout: Option<Duration>,
}

impl Gateway {
    pub fn new(executor: Arc<dyn RoutineExecutor>) -> Self {
        Self {
            executor,
            call_timeout: None,
        }
    }

    /// Gateway over a MySQL pool
    pub fn mysql(pool: MySqlPool) -> Self {
        Self::new(Arc::new(MySqlExecutor::new(pool)))
    }

    /// Abandon calls that run longer than `timeout`.
    ///
    /// The abandoned query's connection is released when its future drops.
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout
    }

    /// Invoke a stored procedure and return the rows of its first result set.
    ///
    /// An empty result set is not an error. `procedure` is templated into
    /// the statement and must never come from user input.
    pub async fn call(
        &self,
        procedure: &str,
        params: Vec<SqlParam>,
    ) -> Result<Vec<Record>, GatewayError> {
        let call = ProcedureCall::new(routine_name(procedure)?, params);
        let statement = call.statement();

        match self
            .run(procedure, self.executor.fetch_first_result_set(&statement))
            .await
        {
            Ok(rows) => {
                tracing::debug!(procedure, rows = rows.len(), "procedure call succeeded");
                Ok(rows)
            }
            Err(e) => {
                tracing::error!(procedure, error = %e, "procedure call failed");
                Err(e)
            }
        }
    }

    /// Invoke a SQL function through `SELECT f(?, ...)` and return its value.
    ///
    /// A string result starting with [`ERROR_SENTINEL_PREFIX`] becomes
    /// [`GatewayError::Sentinel`]. Other numeric strings are returned as
    /// JSON numbers.
    pub async fn call_function(
        &self,
        function: &str,
        params: Vec<SqlParam>,
    ) -> Result<Value, GatewayError> {
        let call = FunctionCall::new(routine_name(function)?, params);
        let statement = call.statement();

        let value = match self
            .run(function, self.executor.fetch_scalar(&statement))
            .await
        {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(function, error = %e, "function call failed");
                return Err(e);
            }
        };

        match value {
            Value::String(text) if text.starts_with(ERROR_SENTINEL_PREFIX) => {
                tracing::warn!(function, result = %text, "function returned an error marker");
                Err(GatewayError::Sentinel(text))
            }
            Value::String(text) => Ok(decode::numeric_or_text(text)),
            other => Ok(other),
        }
    }

    async fn run<T>(
        &self,
        routine: &str,
        fut: impl Future<Output = Result<T, DbError>>,
    ) -> Result<T, GatewayError> {
        let outcome = match self.call_timeout {
            Some(timeout) => tokio::time::timeout(timeout, fut)
                .await
                .map_err(|_| GatewayError::Timeout {
                    routine: routine.to_owned(),
                    timeout,
                })?,
            None => fut.await,
        };

        outcome.map_err(|source| GatewayError::Procedure {
            routine: routine.to_owned(),
            source,
        })
    }
}

fn routine_name(name: &str) -> Result<RoutineName, GatewayError> {
    RoutineName::new(name).map_err(|source| {
        tracing::error!(routine = name, error = %source, "refusing to build statement");
        GatewayError::InvalidName {
            name: name.to_owned(),
            source,
        }
    })
}
