//! MySQL-backed token store.
//!
//! Table `oauth_tokens`: one row per provider user id, replaced on every
//! successful exchange.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::{error, info, warn};

use super::{validate_record, TokenStore, WriteOutcome};
use crate::config::DatabaseConfig;
use crate::error::StoreError;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
const IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisabledReason {
    NotConfigured,
    InitFailed,
}

#[derive(Debug)]
pub enum StoreState {
    Enabled(MySqlPool),
    Disabled(DisabledReason),
}

/// Token store backed by MySQL. Never changes state after construction.
#[derive(Debug)]
pub struct MySqlStore {
    state: StoreState,
}

impl MySqlStore {
    /// Connect and ensure the schema exists.
    ///
    /// Never fails: without a config no connection is attempted, and a
    /// connect or schema error closes the pool and yields a disabled store.
    pub async fn initialize(config: Option<&DatabaseConfig>) -> Self {
        let Some(config) = config else {
            info!("MySQL not configured, token persistence disabled");
            return Self::disabled(DisabledReason::NotConfigured);
        };

        let pool = match MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .idle_timeout(IDLE_TIMEOUT)
            .connect_with(config.connect_options())
            .await
        {
            Ok(pool) => pool,
            Err(e) => {
                error!(host = %config.host, port = config.port, "Failed to connect to MySQL: {e}");
                return Self::disabled(DisabledReason::InitFailed);
            }
        };

        if let Err(e) = ensure_schema(&pool).await {
            error!("Failed to create oauth_tokens table: {e}");
            pool.close().await;
            return Self::disabled(DisabledReason::InitFailed);
        }

        info!(host = %config.host, database = %config.database, "MySQL connected and migrated");
        Self::from_pool(pool)
    }

    /// Wrap an existing pool. The schema is assumed to exist.
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self {
            state: StoreState::Enabled(pool),
        }
    }

    pub fn disabled(reason: DisabledReason) -> Self {
        Self {
            state: StoreState::Disabled(reason),
        }
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    async fn try_upsert(
        pool: &MySqlPool,
        user_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), StoreError> {
        validate_record(user_id, access_token)?;

        sqlx::query(
            r#"
            INSERT INTO oauth_tokens (user_id, access_token, refresh_token)
            VALUES (?, ?, ?) AS new
            ON DUPLICATE KEY UPDATE
                access_token = new.access_token,
                refresh_token = new.refresh_token,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(user_id)
        .bind(access_token)
        .bind(refresh_token.unwrap_or_default())
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn try_has_token(pool: &MySqlPool, user_id: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM oauth_tokens WHERE user_id = ? LIMIT 1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(row.is_some())
    }
}

/// Create the `oauth_tokens` table if it does not exist.
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS oauth_tokens (
            id            INT AUTO_INCREMENT PRIMARY KEY,
            user_id       VARCHAR(255) NOT NULL UNIQUE,
            access_token  TEXT NOT NULL,
            refresh_token TEXT NULL,
            created_at    TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at    TIMESTAMP DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[async_trait]
impl TokenStore for MySqlStore {
    fn is_enabled(&self) -> bool {
        matches!(self.state, StoreState::Enabled(_))
    }

    async fn upsert_token(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> WriteOutcome {
        let StoreState::Enabled(pool) = &self.state else {
            return WriteOutcome::Disabled;
        };

        match Self::try_upsert(pool, user_id, access_token, refresh_token).await {
            Ok(()) => WriteOutcome::Stored,
            Err(e) => WriteOutcome::Failed(e),
        }
    }

    async fn has_token(&self, user_id: &str) -> bool {
        let StoreState::Enabled(pool) = &self.state else {
            return false;
        };
        if user_id.is_empty() {
            return false;
        }

        Self::try_has_token(pool, user_id)
            .await
            .unwrap_or_else(|e| {
                warn!(user_id, "Token lookup failed: {e}");
                false
            })
    }
}
