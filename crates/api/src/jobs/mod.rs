//! Background work.
//!
//! The service runs exactly one periodic task: the ride expiry sweep,
//! which finishes every active ride whose arrival has passed. The runner
//! is a plain interval loop with a watch-channel shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use domain::services::Clock;
use domain::DomainError;
use persistence::repositories::RideRepository;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Handle to a running periodic task.
pub struct PeriodicTask {
    name: &'static str,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Signal shutdown and wait for the loop to drain, up to `timeout`.
    pub async fn stop(self, timeout: Duration) {
        let _ = self.shutdown_tx.send(true);
        match tokio::time::timeout(timeout, self.handle).await {
            Ok(Ok(())) => info!(task = self.name, "Background task stopped"),
            Ok(Err(e)) => warn!(task = self.name, error = %e, "Background task panicked"),
            Err(_) => warn!(
                task = self.name,
                timeout_secs = timeout.as_secs(),
                "Background task did not stop in time"
            ),
        }
    }
}

/// Spawn a loop that runs `sweep` once per interval, logging the number of
/// affected rows. The first run happens a full interval after startup.
fn spawn_periodic<F, Fut>(name: &'static str, every: Duration, sweep: F) -> PeriodicTask
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<u64, DomainError>> + Send,
{
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately; wait a full interval instead.
        interval.tick().await;

        info!(task = name, every_secs = every.as_secs(), "Background task scheduled");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match sweep().await {
                        Ok(0) => {}
                        Ok(affected) => info!(task = name, affected, "Background sweep applied"),
                        Err(e) => error!(task = name, error = %e, "Background sweep failed"),
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });

    PeriodicTask {
        name,
        shutdown_tx,
        handle,
    }
}

/// Start the ride expiry sweep.
///
/// The flip only matches still-active rides, so overlapping runs and
/// concurrent owner finishes are harmless; a failed sweep is retried on
/// the next tick.
pub fn start_ride_expiry(
    repo: RideRepository,
    clock: Arc<dyn Clock>,
    interval_secs: u64,
) -> PeriodicTask {
    spawn_periodic("expire_rides", Duration::from_secs(interval_secs), move || {
        let repo = repo.clone();
        let clock = clock.clone();
        async move { repo.expire_rides(clock.now()).await }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_periodic_task_runs_until_stopped() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let task = spawn_periodic("counting", Duration::from_millis(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        task.stop(Duration::from_secs(1)).await;

        assert!(count.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_stop_before_first_tick_runs_nothing() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let task = spawn_periodic("idle", Duration::from_secs(3600), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(0)
            }
        });

        task.stop(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sweep_errors_do_not_kill_the_loop() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let task = spawn_periodic("failing", Duration::from_millis(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(DomainError::StorageUnavailable("connection refused".into()))
            }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        task.stop(Duration::from_secs(1)).await;

        assert!(count.load(Ordering::SeqCst) >= 2);
    }
}
