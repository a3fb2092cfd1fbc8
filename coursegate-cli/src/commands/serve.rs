//! HTTP server command
//!
//! Builds a lazy pool and the gateway, then runs the API until shutdown.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use coursegate_server::db::{create_lazy_pool, Gateway};
use coursegate_server::http::{run_server, ServerConfig};

use crate::config::DatabaseArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "COURSEGATE_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Directory of static files served at `/`
    #[arg(long, env = "COURSEGATE_STATIC_DIR", default_value = "public")]
    pub static_dir: PathBuf,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Abandon a stored procedure call after this many seconds (0 = never)
    #[arg(long, env = "COURSEGATE_CALL_TIMEOUT_SECS", default_value_t = 30)]
    pub call_timeout_secs: u64,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

impl ServeArgs {
    fn call_timeout(&self) -> Option<Duration> {
        (self.call_timeout_secs > 0).then(|| Duration::from_secs(self.call_timeout_secs))
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let pool_config = args.db.pool_config();
    tracing::info!(
        database = %pool_config.describe(),
        max_connections = pool_config.max_connections,
        "Using database"
    );

    // Connections open on demand; a down database fails requests, not startup
    let pool = create_lazy_pool(&pool_config)
        .with_context(|| format!("Invalid database configuration for {}", pool_config.describe()))?;

    let gateway = Gateway::mysql(pool).with_call_timeout(args.call_timeout());

    let config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
        static_dir: Some(args.static_dir),
    };

    // Blocks until shutdown
    run_server(gateway, config).await.context("Server error")?;

    Ok(())
}
