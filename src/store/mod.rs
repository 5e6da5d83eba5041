//! Store
//!
//! Owns the canonical string mapping and the ordered list of registered
//! providers. Provider-driven updates are merged into the mapping and reported
//! outward through one debounced callback; external replacements of the
//! mapping are reconciled against every provider on the next tick.
//!
//! Nothing runs on its own: deferred work sits in the store's task queue
//! until the host calls [`Store::run_pending`] (or hands the store to
//! [`crate::driver::StoreDriver`]).

mod provider;
pub(crate) mod scheduler;

pub use provider::ProviderCallback;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::schema::{Schema, SchemaConfig};
use crate::types::{ProviderId, State, Values};
use provider::Provider;
use scheduler::{Scheduler, Task};
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Callback receiving the full canonical mapping after provider updates.
pub type OutboundCallback = Box<dyn FnMut(&Values) + Send>;

pub struct Store {
    values: Values,
    providers: Vec<Provider>,
    next_id: u64,
    scheduler: Scheduler,
    callback: OutboundCallback,
    separator: String,
}

impl Store {
    /// Create a store with default configuration.
    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut(&Values) + Send + 'static,
    {
        Self::with_config(&StoreConfig::default(), callback)
    }

    pub fn with_config<F>(config: &StoreConfig, callback: F) -> Self
    where
        F: FnMut(&Values) + Send + 'static,
    {
        Self {
            values: Values::new(),
            providers: Vec::new(),
            next_id: 1,
            scheduler: Scheduler::new(config.debounce()),
            callback: Box::new(callback),
            separator: config.separator.clone(),
        }
    }

    /// Register a provider and schedule its initial sync.
    ///
    /// Fails without side effects if any prefixed key of the new schema is
    /// already owned by a registered provider.
    pub fn register<F>(
        &mut self,
        config: SchemaConfig,
        callback: F,
    ) -> Result<ProviderId, StoreError>
    where
        F: FnMut(&State) + Send + 'static,
    {
        let schema = Schema::new(config, &self.separator)?;

        for existing in &self.providers {
            if let Some(key) = schema.conflicts(&existing.schema) {
                warn!(key = %key, existing = %existing.id, "rejected conflicting provider");
                return Err(StoreError::RegistrationConflict { key });
            }
        }

        let id = ProviderId(self.next_id);
        self.next_id += 1;
        debug!(
            provider = %id,
            keys = schema.len(),
            prefix = ?schema.prefix(),
            "registered provider"
        );
        self.providers
            .push(Provider::new(id, schema, Box::new(callback)));
        self.scheduler.defer(Task::InitialSync(id), Instant::now());
        Ok(id)
    }

    /// Remove a provider. Returns false if the id was not registered.
    pub fn unregister(&mut self, id: ProviderId) -> bool {
        let before = self.providers.len();
        self.providers.retain(|p| p.id != id);
        let removed = self.providers.len() != before;
        if removed {
            debug!(provider = %id, "unregistered provider");
        }
        removed
    }

    pub fn is_registered(&self, id: ProviderId) -> bool {
        self.providers.iter().any(|p| p.id == id)
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    fn provider_mut(&mut self, id: ProviderId) -> Result<&mut Provider, StoreError> {
        self.providers
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::UnregisteredProvider(id))
    }

    /// Apply typed state coming from a provider.
    ///
    /// The values are encoded into the canonical mapping and merged into the
    /// provider's own state; the outbound callback is (re)scheduled. On error
    /// the store is left untouched.
    pub fn update_provider(&mut self, id: ProviderId, state: State) -> Result<(), StoreError> {
        let provider = self.provider_mut(id)?;
        let pairs = provider.encode(&state)?;
        provider.absorb(state);

        trace!(provider = %id, keys = pairs.len(), "merging provider update");
        self.values.extend(pairs);
        self.scheduler.schedule_flush(Instant::now());
        Ok(())
    }

    /// Replace the canonical mapping and schedule reconciliation of every provider.
    pub fn update(&mut self, values: Values) {
        trace!(keys = values.len(), "replacing canonical values");
        self.values = values;
        self.scheduler.defer(Task::ReconcileAll, Instant::now());
    }

    /// Current canonical mapping.
    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Last-known typed state of a provider.
    pub fn provider_state(&self, id: ProviderId) -> Option<&State> {
        self.providers.iter().find(|p| p.id == id).map(|p| &p.state)
    }

    /// Whether any live task (including a not-yet-due flush) is queued.
    pub fn has_pending(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// Earliest instant at which queued work becomes runnable.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Install a hook called whenever work is enqueued.
    pub fn set_wake_hook<F>(&mut self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.scheduler.set_wake_hook(Box::new(hook));
    }

    /// Run one tick: every task due now, in submission order.
    pub fn run_pending(&mut self) -> Result<usize, StoreError> {
        self.run_pending_at(Instant::now())
    }

    /// Run one tick as of `now`. Returns how many tasks ran.
    ///
    /// Syncs and reconciliations queued before the call always run; `now`
    /// only decides which debounced flushes are due. Tasks enqueued while
    /// this tick runs wait for the next one. If a task fails, the tasks after
    /// it are put back at the head of the queue and the error is returned.
    /// A failing reconciliation still visits every provider first.
    pub fn run_pending_at(&mut self, now: Instant) -> Result<usize, StoreError> {
        let mut tasks = self.scheduler.take_due(now).into_iter();
        let mut ran = 0;
        while let Some(task) = tasks.next() {
            if let Err(err) = self.run_task(task) {
                self.scheduler.requeue_front(tasks.collect(), now);
                return Err(err);
            }
            ran += 1;
        }
        Ok(ran)
    }

    fn run_task(&mut self, task: Task) -> Result<(), StoreError> {
        match task {
            Task::InitialSync(id) => {
                let values = &self.values;
                match self.providers.iter_mut().find(|p| p.id == id) {
                    Some(provider) => {
                        provider.notify(values)?;
                    }
                    None => trace!(provider = %id, "skipping sync for unregistered provider"),
                }
            }
            Task::ReconcileAll => {
                let values = &self.values;
                let mut first_err = None;
                for provider in self.providers.iter_mut() {
                    if let Err(err) = provider.notify(values) {
                        warn!(provider = %provider.id, error = %err, "reconciliation failed");
                        first_err.get_or_insert(err);
                    }
                }
                if let Some(err) = first_err {
                    return Err(err);
                }
            }
            Task::Flush { generation } => {
                if self.scheduler.claim_flush(generation) {
                    debug!(keys = self.values.len(), "flushing canonical values");
                    (self.callback)(&self.values);
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("values", &self.values)
            .field(
                "providers",
                &self.providers.iter().map(|p| p.id).collect::<Vec<_>>(),
            )
            .field("separator", &self.separator)
            .finish()
    }
}
