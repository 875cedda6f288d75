//! Background refresh loop driving a refreshable source off a
//! [`RefreshTimer`].

use super::timer::{RefreshError, RefreshTimer, RefreshTimerConfig};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::sleep;

/// Callback invoked when a refresh attempt fails.
pub type RefreshFailureCallback = Arc<dyn Fn(&RefreshError) + Send + Sync>;

/// A data source that can be refreshed in the background.
#[async_trait]
pub trait Refreshable: Send + Sync {
    /// Re-fetch the source's data. Returning an error schedules a
    /// backed-off retry instead of a regular interval.
    async fn refresh(&self) -> Result<(), RefreshError>;
}

/// Service that periodically refreshes a source, backing off on failure.
pub struct RefreshService {
    source: Arc<dyn Refreshable>,
    timer: Mutex<RefreshTimer>,
    shutdown_signal: Arc<RwLock<bool>>,
    failure_callback: Option<RefreshFailureCallback>,
}

impl RefreshService {
    /// Create a new refresh service for the given source.
    pub fn new(
        source: Arc<dyn Refreshable>,
        config: RefreshTimerConfig,
    ) -> Result<Self, RefreshError> {
        Ok(Self {
            source,
            timer: Mutex::new(RefreshTimer::new(config)?),
            shutdown_signal: Arc::new(RwLock::new(false)),
            failure_callback: None,
        })
    }

    /// Set a callback to be invoked when a refresh attempt fails.
    pub fn with_failure_callback(mut self, callback: RefreshFailureCallback) -> Self {
        self.failure_callback = Some(callback);
        self
    }

    /// Start the background refresh loop.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Signal the service to shut down.
    pub async fn shutdown(&self) {
        let mut shutdown = self.shutdown_signal.write().await;
        *shutdown = true;
    }

    /// Run one refresh attempt immediately, updating the schedule.
    pub async fn refresh_now(&self) -> Result<(), RefreshError> {
        match self.source.refresh().await {
            Ok(()) => {
                self.with_timer(|t| t.reset());
                log::debug!("refresh succeeded, next refresh after regular interval");
                Ok(())
            }
            Err(e) => {
                self.with_timer(|t| t.backoff());
                log::warn!("refresh failed, backing off: {e}");
                if let Some(callback) = &self.failure_callback {
                    callback(&e);
                }
                Err(e)
            }
        }
    }

    async fn run(&self) {
        // Bounded tick so the shutdown signal is observed promptly even
        // with long refresh intervals.
        const MAX_TICK: Duration = Duration::from_millis(500);

        loop {
            if *self.shutdown_signal.read().await {
                log::info!("refresh service shutting down");
                break;
            }

            let wait = self
                .with_timer(|t| t.until_next_refresh())
                .unwrap_or(MAX_TICK);
            sleep(wait.min(MAX_TICK)).await;

            let due = self.with_timer(|t| t.needs_refresh()).unwrap_or(false);
            if !due {
                continue;
            }

            if let Err(e) = self.refresh_now().await {
                log::error!("scheduled refresh attempt failed: {e}");
            }
        }
    }

    fn with_timer<R>(&self, f: impl FnOnce(&mut RefreshTimer) -> R) -> Option<R> {
        self.timer.lock().ok().map(|mut timer| f(&mut timer))
    }
}
