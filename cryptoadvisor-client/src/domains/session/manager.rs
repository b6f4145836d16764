//! Session lifecycle: seed, poll, write-through, logout

use std::sync::Arc;
use std::time::Duration;

use cryptoadvisor_model::{Balance, OwnerId, SessionRecord};
use log::{info, warn};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::storage::SessionStorage;
use crate::common::{CrossDomainEvent, EventBus, Subscription};
use crate::domains::wallet::{BalanceStore, PollError, PollScheduler};
use crate::infra::services::WalletApi;

#[derive(Debug, Error)]
pub enum SessionError {
    /// No stored session; the caller should route to login.
    #[error("No active session - please login")]
    NotAuthenticated,

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Poll(#[from] PollError),
}

impl From<anyhow::Error> for SessionError {
    fn from(err: anyhow::Error) -> Self {
        SessionError::Storage(format!("{err:#}"))
    }
}

/// One logged-in user's balance store, poller and persisted seed.
///
/// Every applied balance mutation is published on the bus and written
/// through to storage by a background writer.
#[derive(Debug)]
pub struct Session {
    profile: SessionRecord,
    store: Arc<BalanceStore>,
    poller: PollScheduler,
    bus: EventBus,
    storage: SessionStorage,
    subscriptions: Mutex<Vec<Subscription>>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Begin a session for a freshly logged-in user and persist its record.
    pub async fn start(
        record: SessionRecord,
        api: Arc<dyn WalletApi>,
        storage: SessionStorage,
        bus: EventBus,
    ) -> Result<Self, SessionError> {
        storage.save(&record).await?;
        Ok(Self::open(record, api, storage, bus))
    }

    /// Continue the stored session, seeding the balance from the record.
    pub async fn resume(
        api: Arc<dyn WalletApi>,
        storage: SessionStorage,
        bus: EventBus,
    ) -> Result<Self, SessionError> {
        match storage.load().await? {
            Some(record) => Ok(Self::open(record, api, storage, bus)),
            None => Err(SessionError::NotAuthenticated),
        }
    }

    fn open(
        record: SessionRecord,
        api: Arc<dyn WalletApi>,
        storage: SessionStorage,
        bus: EventBus,
    ) -> Self {
        let owner = record.owner_id.clone();
        let store = Arc::new(BalanceStore::new(
            owner.clone(),
            api,
            Balance::seeded(record.wallet_balance),
        ));
        let poller =
            PollScheduler::new(Arc::clone(&store)).with_bus(bus.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(write_through(storage.clone(), rx));

        let publish = {
            let bus = bus.clone();
            let owner = owner.clone();
            store.subscribe(move |balance| {
                bus.emit(CrossDomainEvent::BalanceChanged {
                    owner: owner.clone(),
                    balance: *balance,
                });
            })
        };
        let persist = {
            let profile = record.clone();
            store.subscribe(move |balance: &Balance| {
                let mut snapshot = profile.clone();
                snapshot.wallet_balance = balance.value;
                snapshot.stored_at = chrono::Utc::now();
                // Closed only while shutting down.
                let _ = tx.send(snapshot);
            })
        };

        info!(
            "[Session] Started for {} with seed {:.2}",
            owner, record.wallet_balance
        );
        bus.emit(CrossDomainEvent::SessionStarted { owner });

        Self {
            profile: record,
            store,
            poller,
            bus,
            storage,
            subscriptions: Mutex::new(vec![publish, persist]),
            writer: Mutex::new(Some(writer)),
        }
    }

    pub fn owner(&self) -> &OwnerId {
        &self.profile.owner_id
    }

    /// Profile fields as they were when the session began.
    pub fn profile(&self) -> &SessionRecord {
        &self.profile
    }

    pub fn store(&self) -> &Arc<BalanceStore> {
        &self.store
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn poller(&self) -> &PollScheduler {
        &self.poller
    }

    pub fn start_polling(
        &self,
        interval: Duration,
    ) -> Result<(), SessionError> {
        self.poller.start(self.owner(), interval)?;
        Ok(())
    }

    /// Stop background work and flush pending writes, keeping the stored
    /// record for the next resume.
    pub async fn close(self) {
        self.shutdown().await;
        info!("[Session] Closed for {}", self.owner());
    }

    /// Logout: stop background work, clear persisted state and announce the
    /// end of the session.
    pub async fn end(self) -> Result<(), SessionError> {
        self.shutdown().await;
        self.storage.clear().await?;
        info!("[Session] Ended for {}", self.owner());
        self.bus.emit(CrossDomainEvent::SessionEnded {
            owner: self.owner().clone(),
        });
        Ok(())
    }

    async fn shutdown(&self) {
        self.poller.stop().await;
        // Dropping the store subscriptions closes the writer's channel.
        self.subscriptions.lock().clear();
        let writer = self.writer.lock().take();
        if let Some(writer) = writer
            && let Err(err) = writer.await
        {
            warn!("[Session] Session writer did not finish cleanly: {}", err);
        }
    }
}

async fn write_through(
    storage: SessionStorage,
    mut rx: mpsc::UnboundedReceiver<SessionRecord>,
) {
    while let Some(mut record) = rx.recv().await {
        // Only the newest snapshot matters.
        while let Ok(newer) = rx.try_recv() {
            record = newer;
        }
        if let Err(err) = storage.save(&record).await {
            warn!("[Session] Failed to persist balance: {:#}", err);
        }
    }
}
