//! Database layer - connection pool and procedure gateway
//!
//! # Design Principles
//!
//! - One pool per process, built at startup and injected into handlers
//! - Every stored routine call goes through [`Gateway`]
//! - Routine names are validated identifiers; parameters are always bound
//! - No retries; the database owns business rules and transactions

pub mod decode;
pub mod executor;
pub mod gateway;
pub mod pool;

pub use executor::{DbError, MockExecutor, MockResponse, MySqlExecutor, RoutineExecutor};
pub use gateway::{Gateway, GatewayError, ERROR_SENTINEL_PREFIX};
pub use pool::{create_lazy_pool, create_pool, ping, PoolConfig};
