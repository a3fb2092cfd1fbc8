//! Database connection pool management
//!
//! Uses sqlx MySqlPool with an explicit connection limit. Callers never hold
//! connections themselves: each query borrows one and sqlx returns it on
//! completion, failure or drop.

use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::MySqlPool;

/// Default maximum connections for the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Acquire wait used when no timeout is configured. Requests beyond the
/// connection limit queue until a connection is released.
const UNBOUNDED_ACQUIRE_WAIT: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// MySQL pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,

    /// Full `mysql://` URL; overrides the discrete fields when set
    pub url: Option<String>,

    /// Maximum number of open connections
    pub max_connections: u32,

    /// How long a caller waits for a free connection (None = no bound)
    pub acquire_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "elearning_db".to_string(),
            url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: None,
        }
    }
}

impl PoolConfig {
    /// Connection options for a single MySQL connection.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is set and cannot be parsed.
    pub fn connect_options(&self) -> Result<MySqlConnectOptions, sqlx::Error> {
        if let Some(url) = &self.url {
            return url.parse();
        }

        Ok(MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database))
    }

    pub fn pool_options(&self) -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout.unwrap_or(UNBOUNDED_ACQUIRE_WAIT))
    }

    /// Target description for logs (never includes the password)
    pub fn describe(&self) -> String {
        match &self.url {
            Some(url) => {
                let rest = url.split_once("://").map_or(url.as_str(), |(_, rest)| rest);
                let rest = rest.rsplit_once('@').map_or(rest, |(_, host)| host);
                rest.split('?').next().unwrap_or(rest).to_string()
            }
            None => format!("{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

/// Create a MySQL connection pool and open its first connection.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the server cannot be
/// reached with the given credentials.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&PoolConfig::default()).await?;
/// ```
pub async fn create_pool(config: &PoolConfig) -> Result<MySqlPool, sqlx::Error> {
    let options = config.connect_options()?;
    tracing::debug!(
        target_db = %config.describe(),
        max_connections = config.max_connections,
        "connecting MySQL pool"
    );
    config.pool_options().connect_with(options).await
}

/// Create a MySQL connection pool without connecting.
///
/// Connections open on first use, so the process starts while the database
/// is still down and each call fails or recovers on its own.
///
/// # Errors
///
/// Returns an error only if the configuration is invalid.
pub fn create_lazy_pool(config: &PoolConfig) -> Result<MySqlPool, sqlx::Error> {
    let options = config.connect_options()?;
    tracing::debug!(
        target_db = %config.describe(),
        max_connections = config.max_connections,
        "creating lazy MySQL pool"
    );
    Ok(config.pool_options().connect_lazy_with(options))
}

/// Round-trip `SELECT 1` through the pool.
pub async fn ping(pool: &MySqlPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await
}
