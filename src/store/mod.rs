//! Token store — persistence of the user → token mapping.
//!
//! `db` is the MySQL backend used in production; `memory` keeps records
//! in-process and backs the test suite.

pub mod db;
pub mod memory;

pub use db::{DisabledReason, MySqlStore, StoreState};
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;

/// One stored token pair. At most one exists per `user_id`.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub user_id: String,
    pub access_token: String,
    /// Empty when the provider issued no refresh token.
    pub refresh_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a best-effort write.
///
/// Deliberately not a `Result`: a failed write cannot be `?`-propagated into
/// the HTTP response, the caller can only log it and carry on.
#[must_use]
#[derive(Debug)]
pub enum WriteOutcome {
    Stored,
    /// The store has no backend; nothing was written.
    Disabled,
    Failed(StoreError),
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// False when the store was never configured or failed to initialize.
    fn is_enabled(&self) -> bool;

    /// Insert a record for `user_id`, or replace its tokens if one exists.
    async fn upsert_token(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> WriteOutcome;

    /// Whether a record exists. Storage errors read as `false`.
    async fn has_token(&self, user_id: &str) -> bool;
}

pub(crate) fn validate_record(user_id: &str, access_token: &str) -> Result<(), StoreError> {
    if user_id.is_empty() {
        return Err(StoreError::InvalidRecord("user_id is empty"));
    }
    if access_token.is_empty() {
        return Err(StoreError::InvalidRecord("access_token is empty"));
    }
    Ok(())
}
