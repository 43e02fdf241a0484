//! The store task: the single owner and writer of [`AppState`].

use std::sync::Arc;

use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::debug;

use crate::{
    action::Action,
    reducer::reduce,
    request::{RequestToken, TokenSource},
    state::AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("store task is no longer running")]
pub struct StoreClosed;

/// Owned state plus the reducer. Mutation requires `&mut Store`.
#[derive(Debug, Default)]
pub struct Store {
    state: AppState,
    applied: u64,
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Self { state, applied: 0 }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn dispatch(&mut self, action: Action) {
        debug!(action = action.name(), "applying action");
        reduce(&mut self.state, action);
        self.applied += 1;
    }

    pub fn into_state(self) -> AppState {
        self.state
    }
}

enum Envelope {
    Action(Action),
    Flush(oneshot::Sender<()>),
}

/// Cloneable access to a running store.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::UnboundedSender<Envelope>,
    snapshots: watch::Receiver<Arc<AppState>>,
    tokens: Arc<TokenSource>,
}

impl StoreHandle {
    /// Queues an action. Actions from one handle are applied in send order.
    pub fn dispatch(&self, action: Action) -> Result<(), StoreClosed> {
        let name = action.name();
        self.tx
            .send(Envelope::Action(action))
            .map_err(|_| StoreClosed)?;
        debug!(action = name, "queued action");
        Ok(())
    }

    /// Resolves once every action sent before it is applied and visible in [`StoreHandle::state`].
    pub async fn flush(&self) -> Result<(), StoreClosed> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Envelope::Flush(ack_tx))
            .map_err(|_| StoreClosed)?;
        ack_rx.await.map_err(|_| StoreClosed)
    }

    /// Latest published snapshot.
    pub fn state(&self) -> Arc<AppState> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.snapshots.clone()
    }

    pub fn next_token(&self) -> RequestToken {
        self.tokens.next()
    }
}

/// Moves `initial` into a new store task.
///
/// The task exits once every [`StoreHandle`] is dropped and yields the final state.
pub fn spawn_store(initial: AppState) -> (StoreHandle, JoinHandle<AppState>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshots) = watch::channel(Arc::new(initial.clone()));
    let handle = StoreHandle {
        tx,
        snapshots,
        tokens: Arc::new(TokenSource::default()),
    };

    let task = tokio::spawn(async move {
        let mut store = Store::new(initial);
        let mut acks = Vec::new();
        while let Some(first) = rx.recv().await {
            let mut next = Some(first);
            let before = store.applied();
            while let Some(envelope) = next.take() {
                match envelope {
                    Envelope::Action(action) => store.dispatch(action),
                    Envelope::Flush(ack) => acks.push(ack),
                }
                next = rx.try_recv().ok();
            }
            if store.applied() != before {
                snapshot_tx.send_replace(Arc::new(store.state().clone()));
            }
            for ack in acks.drain(..) {
                let _ = ack.send(());
            }
        }
        debug!(applied = store.applied(), "store task stopped");
        store.into_state()
    });

    (handle, task)
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
