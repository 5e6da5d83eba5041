//! Single-threaded task queue with one cancel-and-reschedule debounce slot.

use crate::types::ProviderId;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Deferred work the store runs on a later tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Task {
    /// First reconciliation of a freshly registered provider.
    InitialSync(ProviderId),
    /// Reconcile every registered provider against the canonical mapping.
    ReconcileAll,
    /// Debounced outbound notification; stale once `generation` is superseded.
    Flush { generation: u64 },
}

#[derive(Debug)]
struct Entry {
    task: Task,
    due: Instant,
}

impl Entry {
    /// Only flushes wait for their deadline; other work is due on the next tick.
    fn is_due(&self, now: Instant) -> bool {
        match self.task {
            Task::Flush { .. } => self.due <= now,
            _ => true,
        }
    }
}

/// Hook invoked whenever a task is enqueued, so a host loop can wake up.
pub(crate) type WakeHook = Box<dyn Fn() + Send + Sync>;

pub(crate) struct Scheduler {
    queue: VecDeque<Entry>,
    debounce: Duration,
    generation: u64,
    pending_flush: Option<u64>,
    wake: Option<WakeHook>,
}

impl Scheduler {
    pub(crate) fn new(debounce: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            debounce,
            generation: 0,
            pending_flush: None,
            wake: None,
        }
    }

    pub(crate) fn set_wake_hook(&mut self, hook: WakeHook) {
        self.wake = Some(hook);
    }

    /// Enqueue a task due immediately (next tick).
    pub(crate) fn defer(&mut self, task: Task, now: Instant) {
        self.push(Entry { task, due: now });
    }

    /// Cancel any pending flush and schedule a new one after the debounce delay.
    pub(crate) fn schedule_flush(&mut self, now: Instant) {
        self.generation += 1;
        self.pending_flush = Some(self.generation);
        let generation = self.generation;
        self.push(Entry {
            task: Task::Flush { generation },
            due: now + self.debounce,
        });
    }

    fn push(&mut self, entry: Entry) {
        self.queue.push_back(entry);
        if let Some(wake) = &self.wake {
            wake();
        }
    }

    fn is_live(&self, task: &Task) -> bool {
        match task {
            Task::Flush { generation } => self.pending_flush == Some(*generation),
            _ => true,
        }
    }

    /// Remove and return every task due at `now`, in FIFO order.
    ///
    /// Only entries present when the call starts are considered. Cancelled
    /// flushes are dropped; flushes not yet due keep their place in the queue.
    /// Non-flush tasks are due whatever `now` is.
    pub(crate) fn take_due(&mut self, now: Instant) -> Vec<Task> {
        let mut ready = Vec::new();
        let mut waiting = VecDeque::new();
        for entry in std::mem::take(&mut self.queue) {
            if !self.is_live(&entry.task) {
                continue;
            }
            if entry.is_due(now) {
                ready.push(entry.task);
            } else {
                waiting.push_back(entry);
            }
        }
        self.queue = waiting;
        ready
    }

    /// Put tasks that were taken but not run back at the head of the queue.
    pub(crate) fn requeue_front(&mut self, tasks: Vec<Task>, now: Instant) {
        for task in tasks.into_iter().rev() {
            self.queue.push_front(Entry { task, due: now });
        }
    }

    /// Claim a flush for firing; false if it was superseded meanwhile.
    pub(crate) fn claim_flush(&mut self, generation: u64) -> bool {
        if self.pending_flush == Some(generation) {
            self.pending_flush = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn has_pending(&self) -> bool {
        self.queue.iter().any(|e| self.is_live(&e.task))
    }

    /// Earliest instant at which some live task becomes runnable.
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.queue
            .iter()
            .filter(|e| self.is_live(&e.task))
            .map(|e| e.due)
            .min()
    }
}
