//! Stored routine names and the statements built from them
//!
//! The routine name is the only text ever templated into SQL. It is
//! restricted to a bare identifier; every parameter is bound positionally.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{SqlParam, ValidationError};

/// Maximum identifier length accepted by MySQL
const MAX_ROUTINE_NAME_LEN: usize = 64;

/// Bare identifier: letter or underscore, then letters, digits, underscores
static IDENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").expect("invalid identifier regex")
});

/// Validated stored procedure or function name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutineName(String);

impl RoutineName {
    /// Create a routine name, validating identifier format.
    ///
    /// # Example
    /// ```
    /// use coursegate_server::models::RoutineName;
    ///
    /// assert!(RoutineName::new("get_teacher_courses").is_ok());
    /// assert!(RoutineName::new("users; DROP TABLE users").is_err());
    /// assert!(RoutineName::new("9lives").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "routine name" });
        }

        if s.len() > MAX_ROUTINE_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "routine name",
                max: MAX_ROUTINE_NAME_LEN,
            });
        }

        if !IDENT_RE.is_match(s) {
            return Err(ValidationError::InvalidFormat {
                field: "routine name",
                reason: "must be a bare identifier (letters, digits, underscores)",
            });
        }

        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RoutineName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoutineName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// SQL text plus its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl Statement {
    /// Number of `?` placeholders in the SQL text
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }
}

/// A stored procedure invocation: `CALL name(?, ?, ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureCall {
    pub name: RoutineName,
    pub params: Vec<SqlParam>,
}

impl ProcedureCall {
    pub fn new(name: RoutineName, params: Vec<SqlParam>) -> Self {
        Self { name, params }
    }

    pub fn statement(&self) -> Statement {
        Statement {
            sql: format!("CALL {}({})", self.name, placeholders(self.params.len())),
            params: self.params.clone(),
        }
    }
}

/// Column alias used for scalar function results
pub const FUNCTION_RESULT_ALIAS: &str = "result";

/// A SQL function invocation: `SELECT name(?, ...) AS result`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: RoutineName,
    pub params: Vec<SqlParam>,
}

impl FunctionCall {
    pub fn new(name: RoutineName, params: Vec<SqlParam>) -> Self {
        Self { name, params }
    }

    pub fn statement(&self) -> Statement {
        Statement {
            sql: format!(
                "SELECT {}({}) AS {}",
                self.name,
                placeholders(self.params.len()),
                FUNCTION_RESULT_ALIAS
            ),
            params: self.params.clone(),
        }
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
