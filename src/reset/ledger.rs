//! Single-use, time-limited password-reset tokens.
//!
//! ```text
//! request_reset ──▶ Issued(unused) ──consume──▶ Consumed(used)
//!                        │
//!                        └── now >= expires_at ──▶ Expired (computed, never stored)
//! ```
//!
//! Issuing a token marks every earlier token of that user as used, and a
//! successful reset does the same, so at most one token per user is ever
//! authoritative.

use std::sync::Arc;

use rand::RngCore;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::password::{hash_password, strength_violations, PasswordHashError};
use crate::config::PasswordResetConfig;
use crate::mail::{MailError, Mailer};
use crate::observability::metrics;
use crate::store::{ResetToken, StoreError, TokenPersistence, UserStore};
use crate::time::unix_now;

/// 256 bits of randomness per token.
const TOKEN_BYTES: usize = 32;
const RESET_SUBJECT: &str = "WellnessApp - Reset your password";

#[derive(Debug, Error)]
pub enum ResetError {
    /// Unknown, used and expired tokens all look the same to the caller.
    #[error("reset token is invalid or expired")]
    InvalidToken,

    #[error("password does not meet requirements")]
    WeakPassword(Vec<String>),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Mail(#[from] MailError),

    #[error("{0}")]
    Hash(#[from] PasswordHashError),

    #[error("password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub struct ResetTokenLedger {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenPersistence>,
    mailer: Arc<dyn Mailer>,
    frontend_url: String,
    token_ttl_secs: u64,
}

impl ResetTokenLedger {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenPersistence>,
        mailer: Arc<dyn Mailer>,
        config: &PasswordResetConfig,
    ) -> Self {
        Self {
            users,
            tokens,
            mailer,
            frontend_url: config.frontend_url.clone(),
            token_ttl_secs: config.token_ttl_secs,
        }
    }

    /// Start a reset for `email`.
    ///
    /// Always `Ok(())` for unknown addresses, without touching storage or the
    /// mailer. This is deliberate: the caller's response must not reveal
    /// whether an account exists. Failures for real accounts still propagate.
    /// Content is identical either way, but unknown addresses return sooner
    /// since only real accounts persist a token and send mail.
    ///
    /// Concurrent requests for one account leave exactly one live token.
    pub async fn request_reset(&self, email: &str) -> Result<(), ResetError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown account");
            metrics::record_reset_event("unknown_account");
            return Ok(());
        };

        let now = unix_now();
        let token = ResetToken {
            id: Uuid::new_v4(),
            user_id: user.id,
            token_value: generate_token_value(),
            expires_at: now.saturating_add(self.token_ttl_secs),
            used: false,
            created_at: now,
        };
        let body = self.reset_email_body(&token.token_value);
        let invalidated = self.tokens.replace_for_user(token).await?;

        self.mailer.send(&user.email, RESET_SUBJECT, &body).await?;

        tracing::info!(user_id = user.id, invalidated, "Password reset token issued");
        metrics::record_reset_event("issued");
        Ok(())
    }

    /// Whether `token` could be consumed right now. No side effects.
    pub async fn validate(&self, token: &str) -> Result<bool, ResetError> {
        let now = unix_now();
        Ok(self
            .tokens
            .find_by_token(token)
            .await?
            .is_some_and(|t| t.is_valid_at(now)))
    }

    /// Set a new password using `token`, burning the token.
    pub async fn consume(&self, token: &str, new_password: &str) -> Result<(), ResetError> {
        let violations = strength_violations(new_password);
        if !violations.is_empty() {
            return Err(ResetError::WeakPassword(violations));
        }

        // Cheap pre-check so bogus tokens never cost an Argon2 hash.
        if !self.validate(token).await? {
            metrics::record_reset_event("rejected");
            return Err(ResetError::InvalidToken);
        }

        let password = new_password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

        let Some(claimed) = self.tokens.mark_used_if_valid(token, unix_now()).await? else {
            metrics::record_reset_event("rejected");
            return Err(ResetError::InvalidToken);
        };

        let Some(mut user) = self.users.find_by_id(claimed.user_id).await? else {
            tracing::warn!(user_id = claimed.user_id, "Reset token references a missing user");
            metrics::record_reset_event("rejected");
            return Err(ResetError::InvalidToken);
        };

        user.password_hash = password_hash;
        let user_id = user.id;
        self.users.save(user).await?;

        self.tokens.invalidate_all_for_user(user_id).await?;

        tracing::info!(user_id, "Password reset completed");
        metrics::record_reset_event("consumed");
        Ok(())
    }

    /// Delete tokens past expiry. Housekeeping only; `validate` never trusts stale rows.
    pub async fn purge_expired(&self) -> Result<usize, ResetError> {
        let removed = self.tokens.delete_expired(unix_now()).await?;
        metrics::record_sweep("reset_tokens", removed);
        if removed > 0 {
            tracing::debug!(removed, "Purged expired reset tokens");
        }
        Ok(removed)
    }

    fn reset_email_body(&self, token_value: &str) -> String {
        let link = format!("{}?token={}", self.frontend_url, token_value);
        let minutes = self.token_ttl_secs / 60;
        format!(
            "Hello,\n\n\
             We received a request to reset the password of your WellnessApp account.\n\n\
             Open the following link to choose a new password:\n\
             {link}\n\n\
             This link expires in {minutes} minutes.\n\n\
             If you did not request this change you can ignore this email.\n\n\
             The WellnessApp team\n"
        )
    }
}

fn generate_token_value() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::auth::Role;
    use crate::mail::OutboxMailer;
    use crate::store::{InMemoryTokenStore, InMemoryUserStore};
    use async_trait::async_trait;

    const NEW_PASSWORD: &str = "N3w!Passphrase";

    struct Fixture {
        ledger: Arc<ResetTokenLedger>,
        users: InMemoryUserStore,
        tokens: InMemoryTokenStore,
        outbox: Arc<OutboxMailer>,
    }

    fn fixture() -> Fixture {
        let users = InMemoryUserStore::new(None);
        let tokens = InMemoryTokenStore::new();
        let outbox = Arc::new(OutboxMailer::new());
        let ledger = Arc::new(ResetTokenLedger::new(
            Arc::new(users.clone()),
            Arc::new(tokens.clone()),
            outbox.clone(),
            &PasswordResetConfig::default(),
        ));
        Fixture { ledger, users, tokens, outbox }
    }

    fn token_from_mail(body: &str) -> String {
        let start = body.find("?token=").expect("link in body") + "?token=".len();
        body[start..].split_whitespace().next().unwrap().to_string()
    }

    async fn issue_for(f: &Fixture, email: &str) -> String {
        f.ledger.request_reset(email).await.unwrap();
        token_from_mail(&f.outbox.last_to(email).unwrap().body)
    }

    #[tokio::test]
    async fn test_unknown_email_succeeds_without_writes() {
        // Intentional: success for unknown accounts prevents enumeration.
        let f = fixture();
        f.ledger.request_reset("ghost@example.com").await.unwrap();
        assert!(f.tokens.is_empty());
        assert!(f.outbox.sent().is_empty());
    }

    #[tokio::test]
    async fn test_issue_mails_link() {
        let f = fixture();
        f.users.create_user("ana@example.com", "0ld!Password", Role::User).unwrap();

        let token = issue_for(&f, "ana@example.com").await;
        let mail = f.outbox.last_to("ana@example.com").unwrap();
        assert!(mail.body.contains(&format!("http://localhost:5173?token={}", token)));
        assert!(mail.body.contains("60 minutes"));
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(f.ledger.validate(&token).await.unwrap());
    }

    #[tokio::test]
    async fn test_second_request_invalidates_first() {
        let f = fixture();
        f.users.create_user("ben@example.com", "0ld!Password", Role::User).unwrap();

        let first = issue_for(&f, "ben@example.com").await;
        let second = issue_for(&f, "ben@example.com").await;
        assert_ne!(first, second);
        assert!(!f.ledger.validate(&first).await.unwrap());
        assert!(f.ledger.validate(&second).await.unwrap());
    }

    #[tokio::test]
    async fn test_consume_is_single_use() {
        let f = fixture();
        let user = f.users.create_user("cy@example.com", "0ld!Password", Role::User).unwrap();
        let token = issue_for(&f, "cy@example.com").await;

        f.ledger.consume(&token, NEW_PASSWORD).await.unwrap();
        let stored = f.users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(verify_password(&stored.password_hash, NEW_PASSWORD));

        let second = f.ledger.consume(&token, "An0ther!Secret").await;
        assert!(matches!(second, Err(ResetError::InvalidToken)));
        let stored = f.users.find_by_id(user.id).await.unwrap().unwrap();
        assert!(verify_password(&stored.password_hash, NEW_PASSWORD));
    }

    #[tokio::test]
    async fn test_unknown_and_expired_tokens_look_the_same() {
        let f = fixture();
        let user = f.users.create_user("dee@example.com", "0ld!Password", Role::User).unwrap();
        let now = unix_now();
        f.tokens
            .save(ResetToken {
                id: Uuid::new_v4(),
                user_id: user.id,
                token_value: "expired-token".to_string(),
                expires_at: now - 1,
                used: false,
                created_at: now - 3601,
            })
            .await
            .unwrap();

        assert!(!f.ledger.validate("expired-token").await.unwrap());
        let expired = f.ledger.consume("expired-token", NEW_PASSWORD).await.unwrap_err();
        let unknown = f.ledger.consume("never-issued", NEW_PASSWORD).await.unwrap_err();
        assert!(matches!(expired, ResetError::InvalidToken));
        assert!(matches!(unknown, ResetError::InvalidToken));
        assert_eq!(expired.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_weak_password_keeps_token() {
        let f = fixture();
        f.users.create_user("eve@example.com", "0ld!Password", Role::User).unwrap();
        let token = issue_for(&f, "eve@example.com").await;

        let err = f.ledger.consume(&token, "weak").await.unwrap_err();
        assert!(matches!(err, ResetError::WeakPassword(ref v) if !v.is_empty()));
        assert!(f.ledger.validate(&token).await.unwrap());
    }

    #[tokio::test]
    async fn test_consume_invalidates_sibling_tokens() {
        let f = fixture();
        let user = f.users.create_user("fay@example.com", "0ld!Password", Role::User).unwrap();
        let now = unix_now();
        for value in ["sibling-a", "sibling-b"] {
            f.tokens
                .save(ResetToken {
                    id: Uuid::new_v4(),
                    user_id: user.id,
                    token_value: value.to_string(),
                    expires_at: now + 600,
                    used: false,
                    created_at: now,
                })
                .await
                .unwrap();
        }

        f.ledger.consume("sibling-a", NEW_PASSWORD).await.unwrap();
        assert!(!f.ledger.validate("sibling-b").await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_consume_single_winner() {
        let f = fixture();
        f.users.create_user("gil@example.com", "0ld!Password", Role::User).unwrap();
        let token = issue_for(&f, "gil@example.com").await;

        let a = {
            let ledger = f.ledger.clone();
            let token = token.clone();
            tokio::spawn(async move { ledger.consume(&token, NEW_PASSWORD).await })
        };
        let b = {
            let ledger = f.ledger.clone();
            let token = token.clone();
            tokio::spawn(async move { ledger.consume(&token, "Oth3r!Passphrase").await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_leave_one_live_token() {
        const CALLERS: usize = 8;
        let f = fixture();
        f.users.create_user("hal@example.com", "0ld!Password", Role::User).unwrap();

        for _ in 0..20 {
            let barrier = Arc::new(tokio::sync::Barrier::new(CALLERS));
            let handles: Vec<_> = (0..CALLERS)
                .map(|_| {
                    let ledger = f.ledger.clone();
                    let barrier = barrier.clone();
                    tokio::spawn(async move {
                        barrier.wait().await;
                        ledger.request_reset("hal@example.com").await
                    })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            let mut live = 0;
            for mail in f.outbox.sent().iter().filter(|m| m.to == "hal@example.com") {
                if f.ledger.validate(&token_from_mail(&mail.body)).await.unwrap() {
                    live += 1;
                }
            }
            assert_eq!(live, 1);
        }
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let f = fixture();
        let now = unix_now();
        f.tokens
            .save(ResetToken {
                id: Uuid::new_v4(),
                user_id: 1,
                token_value: "stale".to_string(),
                expires_at: now - 10,
                used: false,
                created_at: now - 3610,
            })
            .await
            .unwrap();

        assert_eq!(f.ledger.purge_expired().await.unwrap(), 1);
        assert!(f.tokens.is_empty());
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), MailError> {
            Err(MailError("smtp unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_mailer_failure_propagates() {
        let users = InMemoryUserStore::new(None);
        users.create_user("hal@example.com", "0ld!Password", Role::User).unwrap();
        let ledger = ResetTokenLedger::new(
            Arc::new(users),
            Arc::new(InMemoryTokenStore::new()),
            Arc::new(FailingMailer),
            &PasswordResetConfig::default(),
        );

        let err = ledger.request_reset("hal@example.com").await.unwrap_err();
        assert!(matches!(err, ResetError::Mail(_)));
    }
}
