//! Per-identifier event workers with deferred end-of-clip delivery

use super::{AnimEvent, EventTiming};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Runs events of one identifier against a host context `C`
pub trait EventWorker<C>: Send + Sync {
    /// Identifier of the events this worker handles
    fn event_id(&self) -> &str;

    /// Apply the event's effect
    fn run(&self, event: &AnimEvent, context: &mut C);
}

/// What happened to a dispatched event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ran,
    /// Queued until [`WorkerRegistry::run_pending`]
    Deferred,
    /// No worker is registered for the identifier
    NoWorker,
}

/// Counts of a batch dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchSummary {
    pub ran: usize,
    pub deferred: usize,
    pub missing: usize,
}

/// Explicit identifier-to-worker table, filled at startup
pub struct WorkerRegistry<C> {
    workers: HashMap<String, Arc<dyn EventWorker<C>>>,
    pending: Vec<AnimEvent>,
}

impl<C> Default for WorkerRegistry<C> {
    fn default() -> Self {
        Self {
            workers: HashMap::new(),
            pending: Vec::new(),
        }
    }
}

impl<C> std::fmt::Debug for WorkerRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.workers.keys().collect();
        ids.sort();
        f.debug_struct("WorkerRegistry")
            .field("workers", &ids)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl<C> WorkerRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a worker under its identifier, replacing any previous one
    pub fn register(&mut self, worker: Arc<dyn EventWorker<C>>) -> Option<Arc<dyn EventWorker<C>>> {
        let id = worker.event_id().to_string();
        let previous = self.workers.insert(id.clone(), worker);
        if previous.is_some() {
            warn!("Replacing event worker for '{}'", id);
        }
        previous
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn EventWorker<C>>> {
        self.workers.get(id)
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Run an event now, or queue it when it is timed for the clip end
    pub fn dispatch(&mut self, event: &AnimEvent, context: &mut C) -> DispatchOutcome {
        let Some(worker) = self.workers.get(event.identifier()) else {
            warn!("No event worker registered for '{}' ({})", event.identifier(), event);
            return DispatchOutcome::NoWorker;
        };

        if event.timing == Some(EventTiming::AtEnd) {
            debug!("Deferring {} until the clip ends", event);
            self.pending.push(event.clone());
            return DispatchOutcome::Deferred;
        }

        worker.run(event, context);
        DispatchOutcome::Ran
    }

    /// Dispatch a batch, typically the events of one playback window
    pub fn dispatch_all<'a, I>(&mut self, events: I, context: &mut C) -> DispatchSummary
    where
        I: IntoIterator<Item = &'a AnimEvent>,
    {
        let mut summary = DispatchSummary::default();
        for event in events {
            match self.dispatch(event, context) {
                DispatchOutcome::Ran => summary.ran += 1,
                DispatchOutcome::Deferred => summary.deferred += 1,
                DispatchOutcome::NoWorker => summary.missing += 1,
            }
        }
        summary
    }

    /// Events waiting for the clip end
    pub fn pending(&self) -> &[AnimEvent] {
        &self.pending
    }

    /// Run and clear every deferred event; returns how many ran
    pub fn run_pending(&mut self, context: &mut C) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let mut ran = 0;
        for event in &pending {
            if let Some(worker) = self.workers.get(event.identifier()) {
                worker.run(event, context);
                ran += 1;
            }
        }
        ran
    }

    /// Drop deferred events without running them
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }
}
