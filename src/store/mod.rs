//! Storage collaborators consumed by the core.
//!
//! # Data Flow
//! ```text
//! auth handlers ──▶ UserStore (create / find_by_email / find_by_id / save)
//! reset ledger  ──▶ UserStore + TokenPersistence
//! ```
//!
//! # Design Decisions
//! - The core only sees these traits; storage engines plug in behind them
//! - In-memory DashMap implementations back development and tests
//! - `mark_used_if_valid` is the single atomic claim that makes reset tokens
//!   single-use even under concurrent consumption
//! - `replace_for_user` keeps at most one live token per user under
//!   concurrent issuance

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::{Role, UserId};

pub mod reset_tokens;
pub mod users;

pub use reset_tokens::{InMemoryTokenStore, ResetToken};
pub use users::{InMemoryUserStore, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record conflict: {0}")]
    Conflict(String),

    #[error("storage backend failure: {0}")]
    Backend(String),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key/value user lookup owned by an external system.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account, allocating its id. Emails are unique.
    async fn create(&self, email: &str, password_hash: String, role: Role) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Insert or replace the record with `user.id`.
    async fn save(&self, user: User) -> Result<(), StoreError>;
}

/// Persisted password-reset tokens.
#[async_trait]
pub trait TokenPersistence: Send + Sync {
    async fn save(&self, token: ResetToken) -> Result<(), StoreError>;

    /// Mark every token of `token.user_id` as used and insert `token`, as one
    /// step with respect to other calls for the same user. Returns how many
    /// earlier tokens were invalidated.
    async fn replace_for_user(&self, token: ResetToken) -> Result<usize, StoreError>;

    async fn find_by_token(&self, token_value: &str) -> Result<Option<ResetToken>, StoreError>;

    /// Mark every token of `user_id` as used. Returns how many changed.
    async fn invalidate_all_for_user(&self, user_id: UserId) -> Result<usize, StoreError>;

    /// Atomically flip `used` on a token that is valid at `now`.
    ///
    /// Returns the claimed record, or `None` when the token is unknown,
    /// already used or expired. At most one caller can ever claim a token.
    async fn mark_used_if_valid(
        &self,
        token_value: &str,
        now: u64,
    ) -> Result<Option<ResetToken>, StoreError>;

    /// Remove tokens whose expiry is at or before `now`.
    async fn delete_expired(&self, now: u64) -> Result<usize, StoreError>;
}
