//! Postgres pool setup for the `postgres` backend.
//!
//! Migrations create `users`, `sessions`, and `profiles`; they are idempotent
//! so pointing at an already-provisioned database is safe.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

const MAX_CONNECTIONS: u32 = 4;
const ACQUIRE_TIMEOUT_SECS: u64 = 3;

/// Connect and bring the schema up to date.
///
/// # Errors
///
/// Returns an error if the connection or migrations fail.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;
    info!("database ready");

    Ok(pool)
}

// =============================================================================
// TEST HELPERS
// =============================================================================
