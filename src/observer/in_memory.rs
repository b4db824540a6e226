use super::{BatchSink, IntersectionService};
use crate::config::ObserverConfig;
use crate::event::VisibilityEvent;
use crate::region::RegionId;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

#[derive(Default, Debug)]
struct ServiceState {
    config: Option<ObserverConfig>,
    sink: Option<BatchSink>,
    observed: HashSet<RegionId>,
    observe_calls: usize,
}

/// In-process intersection service. The host (or a test) decides what is
/// visible and reports it with [`notify`](Self::notify).
///
/// Clones share state, so keep one clone around after handing the other to
/// the dispatcher.
#[derive(Clone, Default, Debug)]
pub struct InMemoryIntersectionService {
    state: Rc<RefCell<ServiceState>>,
}

impl InMemoryIntersectionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports a batch of changes. Events for regions that are not observed are
    /// dropped, and nothing is delivered when no event is left or the service is
    /// not connected. Returns the number of events delivered.
    pub fn notify(&self, events: Vec<VisibilityEvent>) -> usize {
        let (sink, events) = {
            let state = self.state.borrow();
            let Some(sink) = state.sink.clone() else {
                log::debug!("in-memory service is not connected, dropping {} event(s)", events.len());
                return 0;
            };
            let events: Vec<VisibilityEvent> = events
                .into_iter()
                .filter(|ev| state.observed.contains(&ev.region))
                .collect();
            (sink, events)
        };

        let delivered = events.len();
        if delivered > 0 {
            // State borrow is released; the sink may call straight back into us
            sink.deliver(events);
        }
        delivered
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().sink.is_some()
    }

    /// Configuration the service was connected with.
    pub fn config(&self) -> Option<ObserverConfig> {
        self.state.borrow().config.clone()
    }

    pub fn is_observed(&self, region: RegionId) -> bool {
        self.state.borrow().observed.contains(&region)
    }

    pub fn observed_count(&self) -> usize {
        self.state.borrow().observed.len()
    }

    /// Total number of `observe` calls received, duplicates included.
    pub fn observe_calls(&self) -> usize {
        self.state.borrow().observe_calls
    }
}

impl IntersectionService for InMemoryIntersectionService {
    fn connect(&mut self, config: &ObserverConfig, sink: BatchSink) {
        let mut state = self.state.borrow_mut();
        state.config = Some(config.clone());
        state.sink = Some(sink);
    }

    fn observe(&mut self, region: RegionId) {
        let mut state = self.state.borrow_mut();
        state.observe_calls += 1;
        state.observed.insert(region);
    }

    fn unobserve(&mut self, region: RegionId) {
        self.state.borrow_mut().observed.remove(&region);
    }

    fn disconnect(&mut self) {
        let mut state = self.state.borrow_mut();
        state.observed.clear();
        state.sink = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_connected_drops_everything() {
        let mut service = InMemoryIntersectionService::new();
        let region = RegionId::new();
        service.observe(region);

        assert!(!service.is_connected());
        assert_eq!(service.notify(vec![VisibilityEvent::visible(region)]), 0);
    }

    #[test]
    fn tracks_observed_regions() {
        let mut service = InMemoryIntersectionService::new();
        let handle = service.clone();
        let a = RegionId::new();
        let b = RegionId::new();

        service.observe(a);
        service.observe(b);
        service.observe(a);
        service.unobserve(b);

        assert!(handle.is_observed(a));
        assert!(!handle.is_observed(b));
        assert_eq!(handle.observed_count(), 1);
        assert_eq!(handle.observe_calls(), 3);

        service.disconnect();
        assert_eq!(handle.observed_count(), 0);
    }
}
