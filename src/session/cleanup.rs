use super::backend::SessionBackend;
use super::store::SessionStore;
use crate::recommendation::{RecommendationRotator, Scope};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Shortest period the scheduler will tick at
pub const MIN_SWEEP_PERIOD: Duration = Duration::from_secs(1);

/// One pass of expiration cleanup
#[async_trait]
pub trait Sweeper: Send + Sync {
    /// Returns the number of sessions removed
    async fn sweep(&self) -> Result<usize>;
}

/// Expires idle sessions and the recommendation rotation state they owned
pub struct SessionJanitor<B: SessionBackend> {
    store: Arc<SessionStore<B>>,
    rotator: RecommendationRotator,
    retention: chrono::Duration,
}

impl<B: SessionBackend> SessionJanitor<B> {
    pub fn new(
        store: Arc<SessionStore<B>>,
        rotator: RecommendationRotator,
        retention_hours: u32,
    ) -> Self {
        Self {
            store,
            rotator,
            retention: chrono::Duration::hours(i64::from(retention_hours)),
        }
    }

    pub fn retention_hours(&self) -> i64 {
        self.retention.num_hours()
    }
}

#[async_trait]
impl<B: SessionBackend + 'static> Sweeper for SessionJanitor<B> {
    async fn sweep(&self) -> Result<usize> {
        let removed = self.store.try_sweep_expired(self.retention).await?;
        for id in &removed {
            self.rotator.forget(&Scope::session(id.as_str()));
        }
        Ok(removed.len())
    }
}

/// Periodically runs a [`Sweeper`] in the background
pub struct CleanupScheduler {
    sweeper: Arc<dyn Sweeper>,
    period: Duration,
}

impl CleanupScheduler {
    /// Periods shorter than [`MIN_SWEEP_PERIOD`] are raised to it
    pub fn new(sweeper: Arc<dyn Sweeper>, period: Duration) -> Self {
        if period < MIN_SWEEP_PERIOD {
            warn!(
                "Cleanup period {:?} too short, using {:?}",
                period, MIN_SWEEP_PERIOD
            );
        }
        Self {
            sweeper,
            period: period.max(MIN_SWEEP_PERIOD),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run one sweep now. Errors are logged and reported as `None`.
    pub async fn run_once(&self) -> Option<usize> {
        match self.sweeper.sweep().await {
            Ok(removed) => {
                debug!("Cleanup tick removed {} sessions", removed);
                Some(removed)
            }
            Err(e) => {
                error!("Session cleanup failed: {:#}", e);
                None
            }
        }
    }

    /// Start the timer loop. The first sweep happens one full period after
    /// spawning; the loop runs until the returned handle is shut down.
    pub fn spawn(self) -> CleanupHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let period = self.period;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Session cleanup scheduler started ({}s interval)", period.as_secs());

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_once().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("Session cleanup scheduler stopped");
        });

        CleanupHandle { shutdown_tx, task }
    }
}

/// Handle to a running [`CleanupScheduler`]
pub struct CleanupHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl CleanupHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Signal the loop to stop and wait for it
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            error!("Cleanup task panicked: {}", e);
        }
    }
}
