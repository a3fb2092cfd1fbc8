//! API error type with IntoResponse
//!
//! One rule decides the status of every gateway failure:
//! - function error markers, SQLSTATE classes 45 (SIGNAL), 22 (data
//!   exception) and 23 (integrity constraint), and the MySQL errors for a
//!   value that does not fit its parameter (reported as `HY000`) are the
//!   client's fault: 400 with the database's own message
//! - everything else is the server's fault: 500 with a generic message,
//!   the cause is logged

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::{DbError, GatewayError};

/// Generic message for server-side failures
pub const SERVER_ERROR: &str = "Lỗi máy chủ.";

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed request input (400)
    Validation { message: String },

    /// Rejected by a stored routine (400)
    Business { message: String },

    /// Infrastructure failure (500, logged)
    Server {
        message: &'static str,
        cause: String,
    },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Classify a gateway failure. `server_message` is what clients see
    /// when the failure is not theirs.
    pub fn from_gateway(err: GatewayError, server_message: &'static str) -> Self {
        match err {
            GatewayError::Sentinel(message) => Self::Business { message },
            GatewayError::Procedure {
                source:
                    DbError::Server {
                        code,
                        sqlstate,
                        message,
                    },
                ..
            } if is_client_error(code, sqlstate.as_deref()) => Self::Business { message },
            other => Self::Server {
                message: server_message,
                cause: other.to_string(),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Business { .. } => StatusCode::BAD_REQUEST,
            Self::Server { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the client
    pub fn message(&self) -> &str {
        match self {
            Self::Validation { message } | Self::Business { message } => message.as_str(),
            Self::Server { message, .. } => *message,
        }
    }
}

/// MySQL error numbers raised by bad input that carry SQLSTATE `HY000`
///
/// 1644 unhandled user-defined SIGNAL, 1366 incorrect value for a column,
/// 1265 data truncated, 1292 truncated incorrect value (dates), 1406 data
/// too long.
const CLIENT_ERROR_CODES: [u16; 5] = [1644, 1366, 1265, 1292, 1406];

/// SQLSTATE classes raised by bad input rather than a broken server
pub fn is_client_sqlstate(sqlstate: &str) -> bool {
    matches!(sqlstate.get(..2), Some("45" | "22" | "23"))
}

/// Whether a server-raised error is the client's fault
pub fn is_client_error(code: Option<u16>, sqlstate: Option<&str>) -> bool {
    code.is_some_and(|code| CLIENT_ERROR_CODES.contains(&code))
        || sqlstate.is_some_and(is_client_sqlstate)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Server { cause, .. } => tracing::error!("Server error: {}", cause),
            Self::Business { message } => tracing::debug!("Rejected by database: {}", message),
            Self::Validation { .. } => {}
        }

        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::validation(e.body_text())
    }
}
