//! Session table migrations.
//!
//! Only the session tables live in `PostgreSQL`; every other record is in
//! the Appwrite database, whose collections are managed in the Appwrite
//! console.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - storefront session database
//! - `ADMIN_DATABASE_URL` - admin session database
//!
//! Both fall back to `DATABASE_URL`.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;
use yousuf_rice_admin::middleware::session::{SESSION_SCHEMA, SESSION_TABLE};
use yousuf_rice_backend::ConfigError;
use yousuf_rice_backend::config::get_database_url;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid session store name: {0}")]
    StoreName(String),
}

/// Create the storefront session table (`tower_sessions.session`).
pub async fn storefront() -> Result<(), MigrationError> {
    let pool = connect("STOREFRONT_DATABASE_URL").await?;

    tracing::info!("Creating storefront session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}

/// Create the admin session table (`admin.session`).
pub async fn admin() -> Result<(), MigrationError> {
    let pool = connect("ADMIN_DATABASE_URL").await?;

    tracing::info!("Creating admin session table...");
    PostgresStore::new(pool)
        .with_schema_name(SESSION_SCHEMA)
        .map_err(MigrationError::StoreName)?
        .with_table_name(SESSION_TABLE)
        .map_err(MigrationError::StoreName)?
        .migrate()
        .await?;

    tracing::info!("Admin migrations complete!");
    Ok(())
}

async fn connect(env_key: &str) -> Result<PgPool, MigrationError> {
    dotenvy::dotenv().ok();
    let database_url = get_database_url(env_key)?;

    tracing::info!("Connecting to {env_key}...");
    Ok(PgPool::connect(database_url.expose_secret()).await?)
}
