//! Event-loop host for a store.
//!
//! Shares the store behind a mutex and runs its queued tasks on a tokio
//! runtime: immediately when work is enqueued, or when the next debounce
//! deadline passes. Callbacks still run with the store locked, so they must
//! not lock it again; forward through a channel instead.

use crate::error::StoreError;
use crate::store::Store;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tracing::{debug, error};

/// Store handle shared between the driver loop and its callers.
pub type SharedStore = Arc<Mutex<Store>>;

pub struct StoreDriver {
    store: SharedStore,
    wake: Arc<Notify>,
}

impl StoreDriver {
    /// Take ownership of a store and install the wake hook.
    pub fn new(mut store: Store) -> Self {
        let wake = Arc::new(Notify::new());
        let hook = wake.clone();
        store.set_wake_hook(move || hook.notify_one());
        Self {
            store: Arc::new(Mutex::new(store)),
            wake,
        }
    }

    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    /// Run ticks until `shutdown` turns true or its sender is dropped.
    ///
    /// Returns the first task error, leaving the remaining work queued.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), StoreError> {
        debug!("store driver started");
        loop {
            let deadline = {
                let mut store = self.store.lock();
                if let Err(err) = store.run_pending() {
                    error!(error = %err, "store task failed");
                    return Err(err);
                }
                store.next_deadline()
            };

            let sleep = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at.into()).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = self.wake.notified() => {}
                _ = sleep => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("store driver stopped");
        Ok(())
    }
}
