//! Database connectivity check

use anyhow::{Context, Result};
use clap::Parser;

use coursegate_server::db::{create_pool, ping};

use crate::config::DatabaseArgs;

/// Arguments for the ping command
#[derive(Parser, Debug)]
pub struct PingArgs {
    #[command(flatten)]
    pub db: DatabaseArgs,
}

/// Open the pool and run `SELECT 1`
pub async fn run_ping(args: PingArgs) -> Result<()> {
    let pool_config = args.db.pool_config();
    let target = pool_config.describe();

    let pool = create_pool(&pool_config)
        .await
        .with_context(|| format!("Failed to connect to {}", target))?;
    let value = ping(&pool)
        .await
        .with_context(|| format!("SELECT 1 failed on {}", target))?;

    tracing::debug!(value, "ping result");
    println!("ok: {} is reachable", target);
    pool.close().await;
    Ok(())
}
