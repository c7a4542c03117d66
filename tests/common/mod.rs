//! Common test utilities
//!
//! Integration tests need a reachable MySQL instance; they skip themselves
//! when `TEST_DATABASE_URL`/`DATABASE_URL` is unset or the server is down.
//! Tests run concurrently against the same database, so each test works with
//! its own users/contracts/owners instead of truncating shared tables.

use anyhow::{Context, Result};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use std::sync::Once;

static ENV_INIT: Once = Once::new();

fn init_env() {
    ENV_INIT.call_once(|| {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();
    });
}

pub async fn get_test_pool() -> Result<MySqlPool> {
    init_env();

    let url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .context("TEST_DATABASE_URL or DATABASE_URL must be set")?;

    let pool = MySqlPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .context("could not connect to test database")?;

    Ok(pool)
}

/// Apply migrations; safe to call from every test, concurrent callers
/// serialize on the migrator's lock.
pub async fn setup_database(pool: &MySqlPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to run migrations")?;
    Ok(())
}

/// A unique email for this test run.
#[allow(dead_code)]
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, uuid::Uuid::new_v4())
}
