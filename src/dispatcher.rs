//! Coalescing visibility dispatcher.
//!
//! The [`VisibilityDispatcher`] sits between an [`IntersectionService`] and the
//! host's change handlers. Batches from the service may arrive at any rate;
//! the dispatcher turns them into at most one dispatch pass per frame:
//!
//! 1. A batch arrives. Any dispatch still waiting for its frame is cancelled.
//! 2. A new dispatch is scheduled on the next frame of the [`FrameScheduler`].
//! 3. When the frame runs, every event of that batch is handed, in order, to
//!    the handler of its region. Events for regions that were unwatched in the
//!    meantime are skipped.
//!
//! A batch that is superseded before its frame runs is dropped entirely; only
//! the latest batch is ever dispatched.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use gosub_lazy::config::ObserverConfig;
//! use gosub_lazy::observer::InMemoryIntersectionService;
//! use gosub_lazy::scheduler::ManualFrameScheduler;
//! use gosub_lazy::{RegionId, VisibilityDispatcher, VisibilityEvent};
//!
//! let scheduler = Rc::new(ManualFrameScheduler::new());
//! let service = InMemoryIntersectionService::new();
//! let dispatcher = VisibilityDispatcher::new(
//!     ObserverConfig::default(),
//!     scheduler.clone(),
//!     service.clone(),
//! );
//!
//! let region = RegionId::new();
//! dispatcher.watch(region, |ev: &VisibilityEvent| println!("visible: {}", ev.is_visible));
//!
//! service.notify(vec![VisibilityEvent::visible(region)]);
//! assert!(dispatcher.has_pending_dispatch());
//!
//! scheduler.run_frame();
//! assert_eq!(dispatcher.stats().events_delivered, 1);
//! ```
//!
//! # Re-entrancy
//!
//! Handlers may call back into the dispatcher (`watch`, `unwatch`, even
//! `disconnect`). The running pass keeps iterating the batch it captured; no
//! registry borrow is held while a handler runs. A panicking handler unwinds
//! to the caller of the frame, leaving the dispatcher ready for the next batch.

use crate::config::ObserverConfig;
use crate::event::VisibilityEvent;
use crate::observer::{BatchSink, IntersectionService};
use crate::region::RegionId;
use crate::registry::{CallbackRegistry, ChangeHandler};
use crate::scheduler::{FrameScheduler, FrameToken};
use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

/// Counters describing what the dispatcher has done so far.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchStats {
    /// Non-empty batches received from the service
    pub batches_received: u64,
    /// Batches whose dispatch was cancelled by a newer batch
    pub batches_superseded: u64,
    /// Dispatch passes that ran
    pub passes_run: u64,
    /// Events handed to a handler
    pub events_delivered: u64,
    /// Events whose region was no longer watched when the pass ran
    pub events_skipped: u64,
}

pub(crate) struct DispatcherState {
    config: ObserverConfig,
    registry: RefCell<CallbackRegistry>,
    service: RefCell<Box<dyn IntersectionService>>,
    scheduler: Rc<dyn FrameScheduler>,
    /// Dispatch waiting for its frame
    pending: Cell<Option<FrameToken>>,
    /// Bumped for every scheduled dispatch; a pass only runs if it is still current
    generation: Cell<u64>,
    stats: Cell<DispatchStats>,
}

impl DispatcherState {
    pub(crate) fn on_raw_batch(&self, this: &Weak<DispatcherState>, events: Vec<VisibilityEvent>) {
        if events.is_empty() {
            log::trace!("ignoring empty visibility batch");
            return;
        }

        self.update_stats(|s| s.batches_received += 1);

        if let Some(token) = self.pending.take() {
            self.scheduler.cancel(token);
            self.update_stats(|s| s.batches_superseded += 1);
            log::debug!("visibility dispatch {:?} superseded by a newer batch", token);
        }

        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        let target = this.clone();
        let token = self.scheduler.schedule(Box::new(move || {
            if let Some(state) = target.upgrade() {
                state.dispatch(generation, events);
            }
        }));
        self.pending.set(Some(token));
    }

    fn dispatch(&self, generation: u64, events: Vec<VisibilityEvent>) {
        if generation != self.generation.get() {
            log::debug!("skipping stale visibility dispatch (generation {})", generation);
            return;
        }
        self.pending.set(None);
        self.update_stats(|s| s.passes_run += 1);

        for event in &events {
            let handler = self.registry.borrow().get(event.region);
            match handler {
                Some(handler) => {
                    self.update_stats(|s| s.events_delivered += 1);
                    handler(event);
                }
                None => {
                    self.update_stats(|s| s.events_skipped += 1);
                    log::trace!("{} is no longer watched, skipping event", event.region);
                }
            }
        }
    }

    fn cancel_pending(&self) {
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel(token);
        }
        // Any task that escaped cancellation is now stale
        self.generation.set(self.generation.get() + 1);
    }

    fn update_stats(&self, f: impl FnOnce(&mut DispatchStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

impl Drop for DispatcherState {
    fn drop(&mut self) {
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel(token);
        }
    }
}

/// Watches regions through an [`IntersectionService`] and calls their change
/// handlers at most once per frame with the latest batch of events.
///
/// Cloning is cheap; clones share the same registry and pending dispatch, so a
/// handler can capture a clone to unwatch itself.
#[derive(Clone)]
pub struct VisibilityDispatcher {
    state: Rc<DispatcherState>,
}

impl Debug for VisibilityDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityDispatcher")
            .field("config", &self.state.config)
            .field("watched", &self.watched_count())
            .field("pending", &self.has_pending_dispatch())
            .finish_non_exhaustive()
    }
}

impl VisibilityDispatcher {
    /// Creates a dispatcher and connects `service` to it with `config`.
    pub fn new<S>(config: ObserverConfig, scheduler: Rc<dyn FrameScheduler>, mut service: S) -> Self
    where
        S: IntersectionService + 'static,
    {
        let state = Rc::new_cyclic(|this: &Weak<DispatcherState>| {
            service.connect(&config, BatchSink::new(this.clone()));

            DispatcherState {
                config,
                registry: RefCell::new(CallbackRegistry::new()),
                service: RefCell::new(Box::new(service)),
                scheduler,
                pending: Cell::new(None),
                generation: Cell::new(0),
                stats: Cell::new(DispatchStats::default()),
            }
        });

        Self { state }
    }

    /// Starts watching `region`, calling `handler` with every visibility change
    /// that is dispatched for it. Watching a region again replaces its handler;
    /// the service is only asked to observe it once.
    pub fn watch<F>(&self, region: RegionId, handler: F)
    where
        F: Fn(&VisibilityEvent) + 'static,
    {
        self.watch_shared(region, Rc::new(handler));
    }

    /// Like [`watch`](Self::watch), for a handler that is already shared.
    pub fn watch_shared(&self, region: RegionId, handler: ChangeHandler) {
        let replaced = self.state.registry.borrow_mut().set(region, handler);

        if replaced.is_none() {
            self.state.service.borrow_mut().observe(region);
        } else {
            log::trace!("replaced change handler of {}", region);
        }
    }

    /// Stops watching `region`. Unknown regions are ignored.
    pub fn unwatch(&self, region: RegionId) {
        let removed = self.state.registry.borrow_mut().delete(region);

        if removed.is_some() {
            self.state.service.borrow_mut().unobserve(region);
        }
    }

    /// Unwatches every region, drops any pending dispatch and disconnects the
    /// service. The dispatcher can not be reconnected afterwards, but `watch`
    /// keeps working on the registry side.
    pub fn disconnect(&self) {
        let regions = self.state.registry.borrow_mut().clear();
        self.state.cancel_pending();

        let mut service = self.state.service.borrow_mut();
        for region in regions {
            service.unobserve(region);
        }
        service.disconnect();
    }

    pub fn is_watched(&self, region: RegionId) -> bool {
        self.state.registry.borrow().contains(region)
    }

    pub fn watched_count(&self) -> usize {
        self.state.registry.borrow().len()
    }

    /// True while a batch is waiting for its frame.
    pub fn has_pending_dispatch(&self) -> bool {
        self.state.pending.get().is_some()
    }

    pub fn config(&self) -> &ObserverConfig {
        &self.state.config
    }

    pub fn stats(&self) -> DispatchStats {
        self.state.stats.get()
    }
}
