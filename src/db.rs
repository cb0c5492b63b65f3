use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;

/// Postgres-backed implementation of every store trait in the crate.
#[derive(Clone)]
pub struct PgStore {
    pub pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        // Run migrations if present
        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        Ok(Self { pool })
    }
}
