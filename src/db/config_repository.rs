// src/db/config_repository.rs
// DOCUMENTATION: System configuration key/value storage

use crate::errors::FindamError;
use crate::models::SystemConfiguration;
use sqlx::PgPool;

pub struct ConfigRepository;

impl ConfigRepository {
    /// Fetch a configuration value by key
    pub async fn get(pool: &PgPool, key: &str) -> Result<Option<String>, FindamError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM findam_system_configs WHERE key = $1")
                .bind(key)
                .fetch_optional(pool)
                .await
                .map_err(|e| {
                    log::error!("Failed to fetch config '{}': {}", key, e);
                    FindamError::DatabaseError(e.to_string())
                })?;

        Ok(row.map(|(value,)| value))
    }

    /// Insert or update a configuration value
    pub async fn set(
        pool: &PgPool,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> Result<SystemConfiguration, FindamError> {
        sqlx::query_as::<_, SystemConfiguration>(
            r#"
            INSERT INTO findam_system_configs (key, value, description, last_updated)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value,
                description = COALESCE(EXCLUDED.description, findam_system_configs.description),
                last_updated = NOW()
            RETURNING *
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(description)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to set config '{}': {}", key, e);
            FindamError::DatabaseError(e.to_string())
        })
    }

    /// All configuration rows (admin listing)
    pub async fn list(pool: &PgPool) -> Result<Vec<SystemConfiguration>, FindamError> {
        sqlx::query_as::<_, SystemConfiguration>(
            "SELECT * FROM findam_system_configs ORDER BY key ASC",
        )
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list configs: {}", e);
            FindamError::DatabaseError(e.to_string())
        })
    }
}
