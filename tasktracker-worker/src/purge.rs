/// Expired refresh-token purge
///
/// Garbage-collects refresh-token rows whose expiry has passed. Runs on a
/// [`DailySchedule`] alongside live traffic: it only deletes rows that every
/// request path already rejects, so no coordination with the API is needed.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use tasktracker_shared::session::RefreshTokenStore;
/// use tasktracker_worker::{purge::PurgeScheduler, schedule::DailySchedule};
///
/// # async fn example(tokens: Arc<dyn RefreshTokenStore>) {
/// let scheduler = PurgeScheduler::new(tokens, DailySchedule::default());
/// let shutdown = scheduler.shutdown_token();
///
/// tokio::spawn(async move {
///     tokio::signal::ctrl_c().await.ok();
///     shutdown.cancel();
/// });
///
/// scheduler.run().await;
/// # }
/// ```

use crate::schedule::DailySchedule;
use std::sync::Arc;
use tasktracker_shared::session::{store::StoreResult, Clock, RefreshTokenStore, SystemClock};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Deletes expired refresh tokens once per scheduled slot
///
/// Talks to the token store directly, so the worker needs neither the
/// signing secret nor a password hasher.
pub struct PurgeScheduler {
    tokens: Arc<dyn RefreshTokenStore>,
    schedule: DailySchedule,
    clock: Arc<dyn Clock>,
    shutdown_token: CancellationToken,
}

impl PurgeScheduler {
    pub fn new(tokens: Arc<dyn RefreshTokenStore>, schedule: DailySchedule) -> Self {
        Self::with_clock(tokens, schedule, Arc::new(SystemClock))
    }

    /// Creates a scheduler that reads the time from `clock`
    pub fn with_clock(
        tokens: Arc<dyn RefreshTokenStore>,
        schedule: DailySchedule,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tokens,
            schedule,
            clock,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Gets shutdown token
    ///
    /// Used to signal graceful shutdown from external handlers.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Purges once, now
    ///
    /// Rows with `expires_at < now` are removed whether or not they were
    /// revoked. Returns the number of rows removed.
    pub async fn run_once(&self) -> StoreResult<u64> {
        self.tokens.delete_expired(self.clock.now()).await
    }

    /// Sleeps until each slot and purges, until shutdown
    ///
    /// A failed purge is logged and retried at the next slot.
    pub async fn run(&self) {
        tracing::info!(
            hour = self.schedule.hour(),
            minute = self.schedule.minute(),
            "Purge scheduler starting"
        );

        loop {
            let now = self.clock.now();
            let next = self.schedule.next_after(now);
            let wait = (next - now).to_std().unwrap_or_default();

            tracing::debug!(next_run = %next, "Waiting for next purge slot");

            tokio::select! {
                _ = self.shutdown_token.cancelled() => break,
                _ = sleep(wait) => {}
            }

            match self.run_once().await {
                Ok(purged) => tracing::info!(purged, "Scheduled purge complete"),
                Err(e) => tracing::error!(error = %e, "Scheduled purge failed"),
            }
        }

        tracing::info!("Purge scheduler stopped");
    }
}
