//! Status polling task
//!
//! Fetches a status sample on a fixed interval and hands it to a sink. A
//! failed fetch is logged and dropped; the next tick simply tries again.
//! There is no retry and no backoff. The fetch is awaited inside the loop,
//! so a slow response delays the next tick instead of overlapping it
//! (missed ticks are skipped, not bunched up).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sprout_api::{DeviceStatus, PlantService};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Counters kept by the polling task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollerStats {
    /// Fetches attempted
    pub polls: u64,
    /// Fetches that failed (transport or decode)
    pub failures: u64,
    /// Failures since the last successful fetch
    pub consecutive_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    polls: AtomicU64,
    failures: AtomicU64,
    consecutive_failures: AtomicU64,
}

/// Handle to the background polling loop
#[derive(Debug)]
pub struct StatusPoller {
    task_handle: JoinHandle<()>,
    shutdown_signal: Arc<AtomicBool>,
    counters: Arc<Counters>,
}

impl StatusPoller {
    /// Spawn the polling loop on `runtime`
    ///
    /// `sink` receives every decoded sample and returns false to stop the
    /// loop (the session is gone or closed).
    pub(crate) fn start<F>(
        runtime: &Handle,
        service: Arc<dyn PlantService>,
        interval: Duration,
        sink: F,
    ) -> Self
    where
        F: Fn(DeviceStatus) -> bool + Send + 'static,
    {
        let shutdown_signal = Arc::new(AtomicBool::new(false));
        let counters = Arc::new(Counters::default());

        let task_shutdown_signal = Arc::clone(&shutdown_signal);
        let task_counters = Arc::clone(&counters);

        let task_handle = runtime.spawn(async move {
            Self::polling_loop(service, interval, sink, task_shutdown_signal, task_counters)
                .await;
        });

        Self {
            task_handle,
            shutdown_signal,
            counters,
        }
    }

    async fn polling_loop<F>(
        service: Arc<dyn PlantService>,
        interval: Duration,
        sink: F,
        shutdown_signal: Arc<AtomicBool>,
        counters: Arc<Counters>,
    ) where
        F: Fn(DeviceStatus) -> bool,
    {
        info!("Starting status polling (interval: {:?})", interval);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if shutdown_signal.load(Ordering::Acquire) {
                break;
            }

            counters.polls.fetch_add(1, Ordering::Relaxed);

            match service.status().await {
                Ok(status) => {
                    counters.consecutive_failures.store(0, Ordering::Relaxed);

                    if shutdown_signal.load(Ordering::Acquire) || !sink(status) {
                        break;
                    }
                }
                Err(e) => {
                    counters.failures.fetch_add(1, Ordering::Relaxed);
                    let streak = counters.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!("Status poll failed ({} in a row), skipping tick: {}", streak, e);
                }
            }
        }

        info!("Status polling stopped");
    }

    pub fn stats(&self) -> PollerStats {
        PollerStats {
            polls: self.counters.polls.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            consecutive_failures: self.counters.consecutive_failures.load(Ordering::Relaxed),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task_handle.is_finished()
    }

    /// Stop the loop; a fetch in progress is abandoned
    pub fn stop(&self) {
        self.shutdown_signal.store(true, Ordering::Release);
        self.task_handle.abort();
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
