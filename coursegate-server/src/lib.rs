//! coursegate-server: HTTP gateway to the course platform's stored procedures
//!
//! Every route parses its parameters, makes one stored procedure or SQL
//! function call through [`db::Gateway`], and maps the outcome to a JSON
//! response. Validation and business rules live in the database.

pub mod db;
pub mod http;
pub mod models;

pub use db::{create_pool, Gateway, GatewayError, PoolConfig};
pub use http::{run_server, ServerConfig};
