//! Password-reset token records and their in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::UserId;
use crate::store::{StoreError, TokenPersistence};

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResetToken {
    pub id: Uuid,
    pub user_id: UserId,
    /// Opaque random value mailed to the user.
    pub token_value: String,
    /// Seconds since epoch.
    pub expires_at: u64,
    pub used: bool,
    pub created_at: u64,
}

impl ResetToken {
    /// Valid iff unused and strictly before expiry.
    pub fn is_valid_at(&self, now: u64) -> bool {
        !self.used && now < self.expires_at
    }
}

impl std::fmt::Debug for ResetToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetToken")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("token_value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("used", &self.used)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// DashMap-backed [`TokenPersistence`], keyed by token value.
#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    tokens: Arc<DashMap<String, ResetToken>>,
    /// Held per user while its tokens are being replaced.
    issuing: Arc<DashMap<UserId, ()>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn invalidate_user(&self, user_id: UserId) -> usize {
        let mut changed = 0;
        for mut entry in self.tokens.iter_mut() {
            let token = entry.value_mut();
            if token.user_id == user_id && !token.used {
                token.used = true;
                changed += 1;
            }
        }
        changed
    }
}

#[async_trait]
impl TokenPersistence for InMemoryTokenStore {
    async fn save(&self, token: ResetToken) -> Result<(), StoreError> {
        self.tokens.insert(token.token_value.clone(), token);
        Ok(())
    }

    async fn find_by_token(&self, token_value: &str) -> Result<Option<ResetToken>, StoreError> {
        Ok(self.tokens.get(token_value).map(|r| r.value().clone()))
    }

    async fn replace_for_user(&self, token: ResetToken) -> Result<usize, StoreError> {
        let user_id = token.user_id;
        let invalidated = {
            // The entry guard holds the shard lock, serializing issuers of one user.
            let _guard = self.issuing.entry(user_id).or_default();
            let invalidated = self.invalidate_user(user_id);
            self.tokens.insert(token.token_value.clone(), token);
            invalidated
        };
        self.issuing.remove(&user_id);
        Ok(invalidated)
    }

    async fn invalidate_all_for_user(&self, user_id: UserId) -> Result<usize, StoreError> {
        Ok(self.invalidate_user(user_id))
    }

    async fn mark_used_if_valid(
        &self,
        token_value: &str,
        now: u64,
    ) -> Result<Option<ResetToken>, StoreError> {
        let Some(mut entry) = self.tokens.get_mut(token_value) else {
            return Ok(None);
        };
        let token = entry.value_mut();
        if !token.is_valid_at(now) {
            return Ok(None);
        }
        token.used = true;
        Ok(Some(token.clone()))
    }

    async fn delete_expired(&self, now: u64) -> Result<usize, StoreError> {
        let before = self.tokens.len();
        self.tokens.retain(|_, token| token.expires_at > now);
        Ok(before.saturating_sub(self.tokens.len()))
    }
}
