//! Viewport intersection services.
//!
//! The geometry of "is this region visible" is not computed by this crate. An
//! [`IntersectionService`] does that work (a browser's `IntersectionObserver`,
//! a compositor, a test fake) and reports changes in batches through the
//! [`BatchSink`] it was connected with.
//!
//! # Available types
//!
//! - [`IntersectionService`] — Trait for anything that can watch regions.
//! - [`BatchSink`] — Where a service delivers its batches of [`VisibilityEvent`]s.
//! - [`InMemoryIntersectionService`] — In-process service driven by the host.

mod in_memory;

pub use in_memory::InMemoryIntersectionService;

use crate::config::ObserverConfig;
use crate::dispatcher::DispatcherState;
use crate::event::VisibilityEvent;
use crate::region::RegionId;
use std::fmt::Debug;
use std::rc::Weak;

pub trait IntersectionService {
    /// Called once by the dispatcher before any region is observed.
    fn connect(&mut self, config: &ObserverConfig, sink: BatchSink);

    /// Starts reporting visibility changes for `region`.
    fn observe(&mut self, region: RegionId);

    /// Stops reporting visibility changes for `region`.
    fn unobserve(&mut self, region: RegionId);

    /// Stops reporting altogether.
    fn disconnect(&mut self) {}
}

/// Handle through which an [`IntersectionService`] hands batches to its
/// dispatcher. Does not keep the dispatcher alive; deliveries after the
/// dispatcher is gone are dropped.
#[derive(Clone)]
pub struct BatchSink {
    target: Weak<DispatcherState>,
}

impl Debug for BatchSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchSink")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl BatchSink {
    pub(crate) fn new(target: Weak<DispatcherState>) -> Self {
        Self { target }
    }

    /// Delivers everything that changed since the previous batch, oldest first.
    pub fn deliver(&self, events: Vec<VisibilityEvent>) {
        match self.target.upgrade() {
            Some(state) => state.on_raw_batch(&self.target, events),
            None => log::debug!("dropping batch of {} event(s): dispatcher is gone", events.len()),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.target.strong_count() > 0
    }
}
