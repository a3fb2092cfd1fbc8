//! Domain models with validation at construction
//!
//! Routine names are validated when built. Request payloads are forwarded
//! as scalar parameters; business rules are enforced by the database.

pub mod validation;
pub mod param;
pub mod routine;
pub mod user;
pub mod course;

pub use validation::ValidationError;
pub use param::SqlParam;
pub use routine::{FunctionCall, ProcedureCall, RoutineName, Statement, FUNCTION_RESULT_ALIAS};
pub use user::UserPayload;
pub use course::{CoursePayload, IncomeQuery, TeacherCoursesQuery, DEFAULT_MAX_PRICE};

/// A result row: column name to JSON value, in column order
pub type Record = serde_json::Map<String, serde_json::Value>;
