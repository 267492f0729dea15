//! In-process token store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{validate_record, TokenRecord, TokenStore, WriteOutcome};

/// Token store that keeps records in memory. Always enabled.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, TokenRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user_id: &str) -> Option<TokenRecord> {
        self.records.read().await.get(user_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn upsert_token(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> WriteOutcome {
        if let Err(e) = validate_record(user_id, access_token) {
            return WriteOutcome::Failed(e);
        }

        let now = Utc::now();
        let refresh_token = refresh_token.unwrap_or_default().to_string();
        let mut records = self.records.write().await;

        records
            .entry(user_id.to_string())
            .and_modify(|record| {
                record.access_token = access_token.to_string();
                record.refresh_token = refresh_token.clone();
                record.updated_at = now;
            })
            .or_insert_with(|| TokenRecord {
                user_id: user_id.to_string(),
                access_token: access_token.to_string(),
                refresh_token: refresh_token.clone(),
                created_at: now,
                updated_at: now,
            });

        WriteOutcome::Stored
    }

    async fn has_token(&self, user_id: &str) -> bool {
        !user_id.is_empty() && self.records.read().await.contains_key(user_id)
    }
}
