//! Single-writer balance store with sequence-numbered reconciliation
//!
//! Every mutation is stamped with a [`Sequence`] taken when it is *initiated*.
//! A network result is applied only if the sequence it was issued under is
//! not older than the one currently displayed, so the final value does not
//! depend on the order in which responses arrive.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cryptoadvisor_model::{Balance, OwnerId, Sequence};
use log::{debug, info, warn};
use parking_lot::{Mutex, ReentrantMutex};

use super::errors::{DepositRejection, WalletError};
use super::validator::DepositValidator;
use crate::common::{Listeners, Subscription};
use crate::infra::errors::ApiError;
use crate::infra::services::WalletApi;

/// Result of a [`BalanceStore::refresh`] that reached the remote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefreshOutcome {
    /// The fetched value is now the displayed balance.
    Applied(Balance),
    /// A newer mutation was applied while the fetch was in flight; the
    /// response was discarded.
    Stale { issued: Sequence, current: Sequence },
}

impl RefreshOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, RefreshOutcome::Applied(_))
    }
}

#[derive(Debug)]
struct StoreState {
    current: Balance,
    last_issued: Sequence,
    last_confirmed: Sequence,
    /// Deposits submitted and not yet answered.
    pending_deposits: BTreeSet<Sequence>,
    /// Deposits that were pending when the refresh behind `current` was
    /// issued. That refresh may predate them on the backend.
    overlapped: BTreeSet<Sequence>,
}

impl StoreState {
    fn allocate(&mut self) -> Sequence {
        self.last_issued = self.last_issued.next();
        self.last_issued
    }
}

/// Owns the balance of one user session.
///
/// Mutations go through [`apply_optimistic`](Self::apply_optimistic),
/// [`deposit`](Self::deposit) and [`refresh`](Self::refresh) only.
/// Subscribers are notified synchronously in the order mutations are applied.
pub struct BalanceStore {
    owner: OwnerId,
    api: Arc<dyn WalletApi>,
    validator: DepositValidator,
    state: Mutex<StoreState>,
    /// Held across mutate + notify so notifications from concurrent callers
    /// cannot interleave. Reentrant so a subscriber may mutate the store.
    delivery: ReentrantMutex<()>,
    listeners: Listeners<Balance>,
    errors: Listeners<ApiError>,
    in_flight: AtomicUsize,
}

impl fmt::Debug for BalanceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BalanceStore")
            .field("owner", &self.owner)
            .field("current", &self.state.lock().current)
            .field("listeners", &self.listeners.len())
            .field("in_flight", &self.in_flight_refreshes())
            .finish()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Clears a deposit's pending mark however `deposit` exits, including
/// cancellation.
struct PendingDeposit<'a> {
    state: &'a Mutex<StoreState>,
    sequence: Sequence,
}

impl Drop for PendingDeposit<'_> {
    fn drop(&mut self) {
        self.state.lock().pending_deposits.remove(&self.sequence);
    }
}

impl BalanceStore {
    /// Create a store seeded with `seed`, typically the persisted value at
    /// [`Sequence::ZERO`].
    pub fn new(owner: OwnerId, api: Arc<dyn WalletApi>, seed: Balance) -> Self {
        Self::with_validator(owner, api, seed, DepositValidator::default())
    }

    pub fn with_validator(
        owner: OwnerId,
        api: Arc<dyn WalletApi>,
        seed: Balance,
        validator: DepositValidator,
    ) -> Self {
        info!(
            "[BalanceStore] Session store for {} seeded with {:.2}",
            owner, seed.value
        );
        Self {
            owner,
            api,
            validator,
            state: Mutex::new(StoreState {
                current: seed,
                last_issued: seed.sequence,
                last_confirmed: seed.sequence,
                pending_deposits: BTreeSet::new(),
                overlapped: BTreeSet::new(),
            }),
            delivery: ReentrantMutex::new(()),
            listeners: Listeners::new(),
            errors: Listeners::new(),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn validator(&self) -> &DepositValidator {
        &self.validator
    }

    /// Currently displayed balance.
    pub fn value(&self) -> Balance {
        self.state.lock().current
    }

    /// Number of refreshes awaiting a response.
    pub fn in_flight_refreshes(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Called with the new balance after every applied mutation.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Balance) + Send + Sync + 'static,
    {
        self.listeners.add(callback)
    }

    /// Called with the error of every failed refresh.
    pub fn on_refresh_error<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ApiError) + Send + Sync + 'static,
    {
        self.errors.add(callback)
    }

    /// Validate and apply a deposit locally. The new value is visible to
    /// [`value`](Self::value) before this returns.
    pub fn apply_optimistic(
        &self,
        amount: f64,
    ) -> Result<Sequence, DepositRejection> {
        self.stage(amount, false)
    }

    /// Apply `amount` locally, registering it as a pending submission when
    /// `submitting` so concurrent refreshes know they may predate it.
    fn stage(
        &self,
        amount: f64,
        submitting: bool,
    ) -> Result<Sequence, DepositRejection> {
        let _delivery = self.delivery.lock();
        let balance = {
            let mut state = self.state.lock();
            self.validator.validate(state.current.value, amount)?;
            let sequence = state.allocate();
            let balance =
                Balance::optimistic(state.current.value + amount, sequence);
            state.current = balance;
            state.overlapped.clear();
            if submitting {
                state.pending_deposits.insert(sequence);
            }
            balance
        };
        debug!(
            "[BalanceStore] Optimistic +{:.2} -> {:.2} at {}",
            amount, balance.value, balance.sequence
        );
        self.listeners.notify(&balance);
        Ok(balance.sequence)
    }

    /// Fetch the authoritative balance and reconcile it.
    ///
    /// A failure leaves the displayed value untouched and is reported to the
    /// [`on_refresh_error`](Self::on_refresh_error) listeners.
    pub async fn refresh(&self) -> Result<RefreshOutcome, ApiError> {
        let (issued, overlapped) = {
            let mut state = self.state.lock();
            (state.allocate(), state.pending_deposits.clone())
        };
        let _flight = InFlight::enter(&self.in_flight);

        match self.api.fetch_balance(&self.owner).await {
            Ok(value) => {
                let outcome = self.reconcile(issued, value, overlapped);
                if let RefreshOutcome::Stale { issued, current } = outcome {
                    debug!(
                        "[BalanceStore] Discarding refresh issued at {} (displayed {})",
                        issued, current
                    );
                }
                Ok(outcome)
            }
            Err(err) => {
                warn!(
                    "[BalanceStore] Refresh for {} failed, keeping {:.2}: {}",
                    self.owner,
                    self.value().value,
                    err
                );
                self.errors.notify(&err);
                Err(err)
            }
        }
    }

    /// User-initiated deposit: apply optimistically, submit, then confirm
    /// with the backend's `new_balance` at the deposit's own sequence.
    ///
    /// The confirmation also replaces a value fetched by a refresh issued
    /// while this deposit was pending. Either way the caller gets the
    /// backend's `new_balance`.
    ///
    /// If submission fails the optimistic amount is reverted, unless a newer
    /// authoritative value has already replaced it, and the error is
    /// returned to the caller.
    pub async fn deposit(&self, amount: f64) -> Result<Balance, WalletError> {
        let sequence = self.stage(amount, true)?;
        let _pending = PendingDeposit {
            state: &self.state,
            sequence,
        };
        info!(
            "[BalanceStore] Submitting deposit of {:.2} for {} at {}",
            amount, self.owner, sequence
        );

        match self.api.deposit(&self.owner, amount).await {
            Ok(new_balance) => Ok(self.confirm_deposit(sequence, new_balance)),
            Err(err) => {
                warn!(
                    "[BalanceStore] Deposit of {:.2} for {} failed: {}",
                    amount, self.owner, err
                );
                self.revert(sequence, amount);
                Err(err.into())
            }
        }
    }

    fn reconcile(
        &self,
        issued: Sequence,
        value: f64,
        overlapped: BTreeSet<Sequence>,
    ) -> RefreshOutcome {
        let _delivery = self.delivery.lock();
        let outcome = {
            let mut state = self.state.lock();
            if issued < state.current.sequence {
                RefreshOutcome::Stale {
                    issued,
                    current: state.current.sequence,
                }
            } else {
                let balance = Balance::confirmed(value, issued);
                state.current = balance;
                state.last_confirmed = state.last_confirmed.max(issued);
                state.overlapped = overlapped;
                RefreshOutcome::Applied(balance)
            }
        };
        if let RefreshOutcome::Applied(balance) = &outcome {
            debug!(
                "[BalanceStore] Confirmed {:.2} at {}",
                balance.value, balance.sequence
            );
            self.listeners.notify(balance);
        }
        outcome
    }

    /// Apply a deposit's `new_balance`. Returns it to the caller even when a
    /// newer mutation keeps it off the display.
    fn confirm_deposit(&self, sequence: Sequence, value: f64) -> Balance {
        let _delivery = self.delivery.lock();
        let applied = {
            let mut state = self.state.lock();
            let current = state.current;
            let at = if sequence >= current.sequence {
                Some(sequence)
            } else if !current.is_optimistic()
                && state.overlapped.remove(&sequence)
            {
                // The displayed value came from a fetch that may not have
                // seen this deposit; the deposit response has.
                Some(current.sequence)
            } else {
                None
            };
            at.map(|at| {
                let balance = Balance::confirmed(value, at);
                state.current = balance;
                state.last_confirmed = state.last_confirmed.max(at);
                if at == sequence {
                    state.overlapped.clear();
                }
                balance
            })
        };
        match applied {
            Some(balance) => {
                debug!(
                    "[BalanceStore] Deposit {} confirmed {:.2} at {}",
                    sequence, balance.value, balance.sequence
                );
                self.listeners.notify(&balance);
                balance
            }
            None => {
                debug!(
                    "[BalanceStore] Deposit {} confirmed behind a newer \
                     mutation, keeping display",
                    sequence
                );
                Balance::confirmed(value, sequence)
            }
        }
    }

    fn revert(&self, sequence: Sequence, amount: f64) {
        let _delivery = self.delivery.lock();
        let reverted = {
            let mut state = self.state.lock();
            if state.last_confirmed > sequence {
                None
            } else {
                let next = state.allocate();
                let balance =
                    Balance::optimistic(state.current.value - amount, next);
                state.current = balance;
                state.overlapped.clear();
                Some(balance)
            }
        };
        match reverted {
            Some(balance) => {
                debug!(
                    "[BalanceStore] Reverted deposit {} -> {:.2} at {}",
                    sequence, balance.value, balance.sequence
                );
                self.listeners.notify(&balance);
            }
            None => debug!(
                "[BalanceStore] Deposit {} already superseded by a confirmed value",
                sequence
            ),
        }
    }
}
