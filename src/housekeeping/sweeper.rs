//! Periodic cleanup of rate-limit counters and expired reset tokens.
//!
//! Both jobs run on their own interval in one task and stop on the shutdown
//! broadcast. Neither blocks request handling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::reset::ResetTokenLedger;
use crate::security::RateLimiter;

pub struct Sweeper {
    limiter: Arc<RateLimiter>,
    ledger: Arc<ResetTokenLedger>,
    limiter_interval: Duration,
    purge_interval: Duration,
}

impl Sweeper {
    pub fn new(
        limiter: Arc<RateLimiter>,
        ledger: Arc<ResetTokenLedger>,
        limiter_interval: Duration,
        purge_interval: Duration,
    ) -> Self {
        Self {
            limiter,
            ledger,
            limiter_interval,
            purge_interval,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            limiter_interval_secs = self.limiter_interval.as_secs(),
            purge_interval_secs = self.purge_interval.as_secs(),
            "Sweeper starting"
        );

        let mut limiter_ticker = time::interval(self.limiter_interval);
        let mut purge_ticker = time::interval(self.purge_interval);
        limiter_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        purge_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = limiter_ticker.tick() => {
                    let removed = self.limiter.sweep();
                    crate::observability::metrics::record_sweep("rate_limit_counters", removed);
                }
                _ = purge_ticker.tick() => {
                    if let Err(e) = self.ledger.purge_expired().await {
                        tracing::error!(error = %e, "Reset token purge failed");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PasswordResetConfig, RateLimitConfig};
    use crate::mail::OutboxMailer;
    use crate::store::{InMemoryTokenStore, InMemoryUserStore, ResetToken, TokenPersistence};
    use crate::time::unix_now;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_purges_and_stops_on_shutdown() {
        let tokens = InMemoryTokenStore::new();
        let now = unix_now();
        tokens
            .save(ResetToken {
                id: Uuid::new_v4(),
                user_id: 1,
                token_value: "stale".to_string(),
                expires_at: now - 1,
                used: false,
                created_at: now - 3601,
            })
            .await
            .unwrap();

        let ledger = Arc::new(ResetTokenLedger::new(
            Arc::new(InMemoryUserStore::new(None)),
            Arc::new(tokens.clone()),
            Arc::new(OutboxMailer::new()),
            &PasswordResetConfig::default(),
        ));
        let limiter = Arc::new(RateLimiter::new(&RateLimitConfig::default()));
        let sweeper = Sweeper::new(limiter, ledger, Duration::from_millis(20), Duration::from_millis(20));

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(sweeper.run(rx));

        // First tick of a tokio interval fires immediately.
        time::sleep(Duration::from_millis(100)).await;
        assert!(tokens.is_empty());

        tx.send(()).unwrap();
        time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
