// Integration tests for the background session cleanup
//
// The scheduler runs against tokio's paused clock so ticks happen
// deterministically instead of waiting on real time.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use recycle_classifier::recommendation::{RecommendationRotator, Scope};
use recycle_classifier::session::{
    CleanupScheduler, FileBackend, SessionBackend, SessionJanitor, SessionRecord, SessionStore,
    Sweeper, MIN_SWEEP_PERIOD,
};
use recycle_classifier::Material;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Counts invocations and fails every other one
#[derive(Default)]
struct FlakySweeper {
    calls: AtomicUsize,
}

#[async_trait]
impl Sweeper for FlakySweeper {
    async fn sweep(&self) -> Result<usize> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call % 2 == 0 {
            bail!("disk unavailable");
        }
        Ok(1)
    }
}

#[tokio::test]
async fn test_run_once_reports_failures_as_none() {
    let sweeper = Arc::new(FlakySweeper::default());
    let scheduler = CleanupScheduler::new(sweeper.clone(), Duration::from_secs(3600));

    assert_eq!(scheduler.run_once().await, None);
    assert_eq!(scheduler.run_once().await, Some(1));
    assert_eq!(sweeper.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_keeps_running_after_failed_sweeps() {
    let sweeper = Arc::new(FlakySweeper::default());
    let handle = CleanupScheduler::new(sweeper.clone(), Duration::from_secs(3600)).spawn();

    // Nothing happens before the first full interval
    tokio::time::sleep(Duration::from_secs(3599)).await;
    assert_eq!(sweeper.calls.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(3 * 3600)).await;
    assert_eq!(sweeper.calls.load(Ordering::SeqCst), 3);
    assert!(handle.is_running());

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_zero_period_is_raised_to_minimum() {
    let sweeper = Arc::new(FlakySweeper::default());
    let scheduler = CleanupScheduler::new(sweeper.clone(), Duration::ZERO);
    assert_eq!(scheduler.period(), MIN_SWEEP_PERIOD);

    let handle = scheduler.spawn();
    tokio::time::sleep(MIN_SWEEP_PERIOD * 3 + MIN_SWEEP_PERIOD / 2).await;

    assert!(handle.is_running());
    assert_eq!(sweeper.calls.load(Ordering::SeqCst), 3);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_the_loop() {
    let sweeper = Arc::new(FlakySweeper::default());
    let handle = CleanupScheduler::new(sweeper.clone(), Duration::from_secs(60)).spawn();

    handle.shutdown().await;
    tokio::time::sleep(Duration::from_secs(600)).await;

    assert_eq!(sweeper.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_janitor_expires_sessions_and_their_rotation_state() -> Result<()> {
    let dir = TempDir::new()?;
    let backend = FileBackend::open(dir.path()).await?;
    backend
        .write(&SessionRecord::new_at(
            "idle",
            Utc::now() - ChronoDuration::hours(25),
        ))
        .await?;

    let store = Arc::new(SessionStore::new(FileBackend::open(dir.path()).await?));
    let active = store.create(None).await?;

    let rotator = RecommendationRotator::default();
    rotator.next_for(Material::Glass, &Scope::session("idle"));
    rotator.next_for(Material::Glass, &Scope::session(active.as_str()));

    let janitor = SessionJanitor::new(Arc::clone(&store), rotator.clone(), 24);
    assert_eq!(janitor.sweep().await?, 1);

    assert!(store.get("idle").await.is_none());
    assert!(store.get(&active).await.is_some());
    assert_eq!(
        rotator
            .usage()
            .dispensed(&Scope::session("idle"), Material::Glass),
        0
    );
    assert_eq!(
        rotator
            .usage()
            .dispensed(&Scope::session(active.as_str()), Material::Glass),
        1
    );

    Ok(())
}

#[tokio::test]
async fn test_forced_sweep_alongside_scheduled_tick() -> Result<()> {
    let dir = TempDir::new()?;
    let backend = FileBackend::open(dir.path()).await?;
    for i in 0..5 {
        backend
            .write(&SessionRecord::new_at(
                format!("expired-{}", i),
                Utc::now() - ChronoDuration::hours(2),
            ))
            .await?;
    }

    let store = Arc::new(SessionStore::new(FileBackend::open(dir.path()).await?));
    let janitor = Arc::new(SessionJanitor::new(
        store,
        RecommendationRotator::default(),
        1,
    ));
    let scheduler = CleanupScheduler::new(janitor.clone(), Duration::from_secs(3600));

    let (forced, ticked) = tokio::join!(janitor.sweep(), scheduler.run_once());
    assert_eq!(forced? + ticked.unwrap_or(0), 5);
    assert_eq!(janitor.sweep().await?, 0);

    Ok(())
}
