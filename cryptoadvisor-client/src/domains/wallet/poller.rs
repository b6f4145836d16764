//! Periodic balance refresh with request coalescing
//!
//! One scheduler per session owner. The loop runs as a single tokio task and
//! drives the in-flight refresh inside its own `select!`, so aborting the
//! task also drops the request and nothing can fire after
//! [`PollScheduler::stop`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use cryptoadvisor_model::OwnerId;
use log::{debug, info};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::store::{BalanceStore, RefreshOutcome};
use crate::common::{CrossDomainEvent, EventBus};
use crate::infra::errors::ApiError;

type RefreshFuture =
    Pin<Box<dyn Future<Output = Result<RefreshOutcome, ApiError>> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("Scheduler belongs to {expected}, cannot poll for {requested}")]
    OwnerMismatch {
        expected: OwnerId,
        requested: OwnerId,
    },

    #[error("Poll interval must be greater than zero")]
    InvalidInterval,
}

/// Counters since the scheduler was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub ticks: u64,
    pub refreshes_issued: u64,
    /// Ticks dropped because a refresh was still in flight.
    pub skipped: u64,
    pub failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    ticks: AtomicU64,
    refreshes_issued: AtomicU64,
    skipped: AtomicU64,
    failures: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> PollStats {
        PollStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            refreshes_issued: self.refreshes_issued.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug)]
pub struct PollScheduler {
    store: Arc<BalanceStore>,
    bus: Option<EventBus>,
    counters: Arc<Counters>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PollScheduler {
    pub fn new(store: Arc<BalanceStore>) -> Self {
        Self {
            store,
            bus: None,
            counters: Arc::new(Counters::default()),
            handle: Mutex::new(None),
        }
    }

    /// Publish background refresh failures on `bus`.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Begin refreshing every `interval`; the first refresh is issued
    /// immediately. Restarting replaces the running loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        &self,
        owner: &OwnerId,
        interval: Duration,
    ) -> Result<(), PollError> {
        if owner != self.store.owner() {
            return Err(PollError::OwnerMismatch {
                expected: self.store.owner().clone(),
                requested: owner.clone(),
            });
        }
        if interval.is_zero() {
            return Err(PollError::InvalidInterval);
        }

        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.store),
            self.bus.clone(),
            Arc::clone(&self.counters),
            interval,
        ));

        if let Some(previous) = self.handle.lock().replace(task) {
            debug!("[PollScheduler] Restarting loop for {}", owner);
            previous.abort();
        }
        info!(
            "[PollScheduler] Polling balance for {} every {:?}",
            owner, interval
        );
        Ok(())
    }

    /// Cancel the timer and any in-flight refresh, waiting until the loop
    /// has fully stopped. Safe to call repeatedly.
    pub async fn stop(&self) {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            handle.abort();
            // Cancelled is the expected outcome; a panic inside the loop is
            // already reported by the runtime.
            let _ = handle.await;
            info!("[PollScheduler] Stopped polling for {}", self.store.owner());
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn stats(&self) -> PollStats {
        self.counters.snapshot()
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}

async fn poll_loop(
    store: Arc<BalanceStore>,
    bus: Option<EventBus>,
    counters: Arc<Counters>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut in_flight: Option<RefreshFuture> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                counters.ticks.fetch_add(1, Ordering::Relaxed);
                if in_flight.is_some() || store.in_flight_refreshes() > 0 {
                    counters.skipped.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        "[PollScheduler] Refresh still in flight, skipping tick"
                    );
                    continue;
                }
                counters.refreshes_issued.fetch_add(1, Ordering::Relaxed);
                let store = Arc::clone(&store);
                in_flight =
                    Some(Box::pin(async move { store.refresh().await }));
            }
            result = drive(&mut in_flight) => {
                in_flight = None;
                if let Err(err) = result {
                    counters.failures.fetch_add(1, Ordering::Relaxed);
                    if let Some(bus) = &bus {
                        bus.emit(CrossDomainEvent::RefreshFailed {
                            owner: store.owner().clone(),
                            message: err.to_string(),
                        });
                    }
                }
            }
        }
    }
}

async fn drive(
    in_flight: &mut Option<RefreshFuture>,
) -> Result<RefreshOutcome, ApiError> {
    match in_flight {
        Some(refresh) => refresh.await,
        None => std::future::pending().await,
    }
}
