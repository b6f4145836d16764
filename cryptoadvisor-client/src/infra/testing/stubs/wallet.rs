use crate::infra::{errors::ApiError, services::wallet::WalletApi};

use async_trait::async_trait;
use cryptoadvisor_model::{MAX_BALANCE, OwnerId};
use parking_lot::Mutex;
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::sync::{Notify, oneshot};

/// In-memory wallet backend for tests.
///
/// Calls answer immediately from an owner → balance table unless they are
/// *held*; held calls park until the test releases them in any order, which
/// is how out-of-order network completion is simulated.
#[derive(Debug, Clone, Default)]
pub struct StubWalletApi {
    inner: Arc<StubInner>,
}

#[derive(Debug, Default)]
struct StubInner {
    state: Mutex<StubState>,
    changed: Notify,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[derive(Debug, Default)]
struct StubState {
    balances: HashMap<OwnerId, f64>,
    hold_fetches: bool,
    hold_deposits: bool,
    held_fetches: Vec<HeldCall>,
    held_deposits: Vec<HeldCall>,
    fetch_errors: VecDeque<ApiError>,
    deposit_errors: VecDeque<ApiError>,
    latency: Option<Duration>,
    fetch_calls: usize,
    deposit_calls: Vec<(OwnerId, f64)>,
}

#[derive(Debug)]
struct HeldCall {
    owner: OwnerId,
    respond: oneshot::Sender<Result<f64, ApiError>>,
}

enum Reply {
    Ready(Result<f64, ApiError>),
    Held(oneshot::Receiver<Result<f64, ApiError>>),
}

struct FlightGuard<'a>(&'a StubInner);

impl<'a> FlightGuard<'a> {
    fn enter(inner: &'a StubInner) -> Self {
        let now = inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        inner.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(inner)
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl StubWalletApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(self, owner: &OwnerId, value: f64) -> Self {
        self.set_balance(owner, value);
        self
    }

    pub fn set_balance(&self, owner: &OwnerId, value: f64) {
        self.inner.state.lock().balances.insert(owner.clone(), value);
    }

    pub fn balance(&self, owner: &OwnerId) -> f64 {
        self.inner
            .state
            .lock()
            .balances
            .get(owner)
            .copied()
            .unwrap_or(0.0)
    }

    /// Park every subsequent fetch until released.
    pub fn hold_fetches(&self, hold: bool) {
        self.inner.state.lock().hold_fetches = hold;
    }

    /// Park every subsequent deposit until released.
    pub fn hold_deposits(&self, hold: bool) {
        self.inner.state.lock().hold_deposits = hold;
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        self.inner.state.lock().latency = latency;
    }

    pub fn fail_next_fetch(&self, err: ApiError) {
        self.inner.state.lock().fetch_errors.push_back(err);
    }

    pub fn fail_next_deposit(&self, err: ApiError) {
        self.inner.state.lock().deposit_errors.push_back(err);
    }

    pub fn held_fetches(&self) -> usize {
        self.inner.state.lock().held_fetches.len()
    }

    pub fn held_deposits(&self) -> usize {
        self.inner.state.lock().held_deposits.len()
    }

    /// Resolve the held fetch at `index` (issue order among those still
    /// held). Returns false if there is no such call.
    pub fn release_fetch(
        &self,
        index: usize,
        result: Result<f64, ApiError>,
    ) -> bool {
        let call = {
            let mut state = self.inner.state.lock();
            if index >= state.held_fetches.len() {
                return false;
            }
            state.held_fetches.remove(index)
        };
        call.respond.send(result).is_ok()
    }

    /// Resolve the held deposit at `index`. A successful result also
    /// updates the stub's balance table.
    pub fn release_deposit(
        &self,
        index: usize,
        result: Result<f64, ApiError>,
    ) -> bool {
        let call = {
            let mut state = self.inner.state.lock();
            if index >= state.held_deposits.len() {
                return false;
            }
            let call = state.held_deposits.remove(index);
            if let Ok(new_balance) = &result {
                state.balances.insert(call.owner.clone(), *new_balance);
            }
            call
        };
        call.respond.send(result).is_ok()
    }

    pub async fn wait_for_held_fetches(&self, count: usize) {
        loop {
            let notified = self.inner.changed.notified();
            if self.held_fetches() >= count {
                return;
            }
            notified.await;
        }
    }

    pub async fn wait_for_held_deposits(&self, count: usize) {
        loop {
            let notified = self.inner.changed.notified();
            if self.held_deposits() >= count {
                return;
            }
            notified.await;
        }
    }

    pub fn fetch_calls(&self) -> usize {
        self.inner.state.lock().fetch_calls
    }

    pub fn deposit_calls(&self) -> Vec<(OwnerId, f64)> {
        self.inner.state.lock().deposit_calls.clone()
    }

    /// Calls currently executing (held, sleeping or resolving).
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// High-water mark of [`Self::in_flight`].
    pub fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    async fn settle(
        &self,
        latency: Option<Duration>,
        reply: Reply,
    ) -> Result<f64, ApiError> {
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match reply {
            Reply::Ready(result) => result,
            Reply::Held(rx) => rx.await.unwrap_or_else(|_| {
                Err(ApiError::Network("stub call dropped".into()))
            }),
        }
    }
}

#[async_trait]
impl WalletApi for StubWalletApi {
    async fn fetch_balance(&self, owner: &OwnerId) -> Result<f64, ApiError> {
        let _flight = FlightGuard::enter(&self.inner);
        let (latency, reply) = {
            let mut state = self.inner.state.lock();
            state.fetch_calls += 1;
            let reply = if let Some(err) = state.fetch_errors.pop_front() {
                Reply::Ready(Err(err))
            } else if state.hold_fetches {
                let (respond, rx) = oneshot::channel();
                state.held_fetches.push(HeldCall {
                    owner: owner.clone(),
                    respond,
                });
                Reply::Held(rx)
            } else {
                Reply::Ready(Ok(state
                    .balances
                    .get(owner)
                    .copied()
                    .unwrap_or(0.0)))
            };
            (state.latency, reply)
        };
        self.inner.changed.notify_waiters();
        self.settle(latency, reply).await
    }

    async fn deposit(
        &self,
        owner: &OwnerId,
        amount: f64,
    ) -> Result<f64, ApiError> {
        let _flight = FlightGuard::enter(&self.inner);
        let (latency, reply) = {
            let mut state = self.inner.state.lock();
            state.deposit_calls.push((owner.clone(), amount));
            let reply = if let Some(err) = state.deposit_errors.pop_front() {
                Reply::Ready(Err(err))
            } else if state.hold_deposits {
                let (respond, rx) = oneshot::channel();
                state.held_deposits.push(HeldCall {
                    owner: owner.clone(),
                    respond,
                });
                Reply::Held(rx)
            } else {
                let current =
                    state.balances.get(owner).copied().unwrap_or(0.0);
                if current + amount > MAX_BALANCE {
                    Reply::Ready(Err(ApiError::Rejected {
                        status: 400,
                        detail: format!(
                            "Solo puedes depositar ${} más",
                            MAX_BALANCE - current
                        ),
                    }))
                } else {
                    state.balances.insert(owner.clone(), current + amount);
                    Reply::Ready(Ok(current + amount))
                }
            };
            (state.latency, reply)
        };
        self.inner.changed.notify_waiters();
        self.settle(latency, reply).await
    }
}
