//! Periodic auto-refresh.
//!
//! At most one timer runs at a time. Starting again replaces the running
//! timer, and hiding the widget stops it until it is shown again. Stopping
//! only disarms the timer; a refresh already in flight still finishes.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Boxed future produced by a refresh task
pub type RefreshFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Work run on every tick
pub type RefreshTask = Arc<dyn Fn() -> RefreshFuture + Send + Sync>;

/// Runs a refresh task every `period` while started and visible.
pub struct AutoRefresh {
    period: Duration,
    task: RefreshTask,
    cancel_token: Mutex<Option<CancellationToken>>,
}

impl AutoRefresh {
    pub fn new(period: Duration, task: RefreshTask) -> Self {
        Self {
            period,
            task,
            cancel_token: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start ticking, replacing any running timer. The first tick fires one
    /// period from now. A zero period disables the timer.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(&self) {
        self.stop();
        if self.period.is_zero() {
            tracing::debug!("Auto-refresh disabled (zero period)");
            return;
        }

        let token = CancellationToken::new();
        *self.cancel_token.lock() = Some(token.clone());

        let period = self.period;
        let task = Arc::clone(&self.task);
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        tracing::debug!("Auto-refresh tick");
                        // A refresh that has fired always runs to completion.
                        task().await;
                    }
                }
            }
            tracing::debug!("Auto-refresh timer stopped");
        });
        tracing::info!("Auto-refresh every {:?}", period);
    }

    /// Disarm the running timer, if any.
    pub fn stop(&self) {
        if let Some(token) = self.cancel_token.lock().take() {
            token.cancel();
        }
    }

    /// Stop while hidden; restart when shown again.
    pub fn set_visible(&self, visible: bool) {
        if visible {
            self.start();
        } else {
            self.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.cancel_token.lock().is_some()
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.stop();
    }
}
