use crate::event::VisibilityEvent;
use crate::region::RegionId;
use std::collections::HashMap;
use std::fmt::Debug;
use std::rc::Rc;

/// Callback invoked with a [`VisibilityEvent`] for the region it is registered for.
///
/// Handlers are shared (`Rc`) so a dispatch pass can hold on to one while the
/// handler itself mutates the registry (for instance by unwatching its region).
pub type ChangeHandler = Rc<dyn Fn(&VisibilityEvent)>;

/// Maps watched regions to their change handler. Holds ids only, never the
/// regions themselves.
#[derive(Default)]
pub struct CallbackRegistry {
    handlers: HashMap<RegionId, ChangeHandler>,
}

impl Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("regions", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the handler for `region`, returning the one it replaced.
    pub fn set(&mut self, region: RegionId, handler: ChangeHandler) -> Option<ChangeHandler> {
        self.handlers.insert(region, handler)
    }

    /// Removes the handler for `region`. Unknown regions are ignored.
    pub fn delete(&mut self, region: RegionId) -> Option<ChangeHandler> {
        self.handlers.remove(&region)
    }

    pub fn get(&self, region: RegionId) -> Option<ChangeHandler> {
        self.handlers.get(&region).cloned()
    }

    pub fn contains(&self, region: RegionId) -> bool {
        self.handlers.contains_key(&region)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// All registered regions, in no particular order.
    pub fn regions(&self) -> Vec<RegionId> {
        self.handlers.keys().copied().collect()
    }

    /// Removes every entry and returns the regions that were registered.
    pub fn clear(&mut self) -> Vec<RegionId> {
        self.handlers.drain().map(|(region, _)| region).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recording(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> ChangeHandler {
        let log = log.clone();
        Rc::new(move |_ev: &VisibilityEvent| log.borrow_mut().push(tag))
    }

    #[test]
    fn set_then_get_returns_handler() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut reg = CallbackRegistry::new();
        let region = RegionId::new();

        assert!(reg.set(region, recording(&log, "h1")).is_none());
        let handler = reg.get(region).expect("handler registered");
        handler(&VisibilityEvent::visible(region));

        assert_eq!(*log.borrow(), vec!["h1"]);
    }

    #[test]
    fn set_overwrites_previous_handler() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut reg = CallbackRegistry::new();
        let region = RegionId::new();

        reg.set(region, recording(&log, "h1"));
        assert!(reg.set(region, recording(&log, "h2")).is_some());
        assert_eq!(reg.len(), 1);

        reg.get(region).unwrap()(&VisibilityEvent::hidden(region));
        assert_eq!(*log.borrow(), vec!["h2"]);
    }

    #[test]
    fn delete_unknown_region_is_noop() {
        let mut reg = CallbackRegistry::new();
        assert!(reg.delete(RegionId::new()).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn last_operation_wins() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut reg = CallbackRegistry::new();
        let a = RegionId::new();
        let b = RegionId::new();

        reg.set(a, recording(&log, "a1"));
        reg.set(b, recording(&log, "b1"));
        reg.delete(a);
        reg.set(b, recording(&log, "b2"));
        reg.delete(b);
        reg.set(a, recording(&log, "a2"));

        assert!(!reg.contains(b));
        assert!(reg.get(b).is_none());
        reg.get(a).unwrap()(&VisibilityEvent::visible(a));
        assert_eq!(*log.borrow(), vec!["a2"]);
        assert_eq!(reg.regions(), vec![a]);
    }

    #[test]
    fn handler_outlives_its_entry() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut reg = CallbackRegistry::new();
        let region = RegionId::new();

        reg.set(region, recording(&log, "h1"));
        let held = reg.get(region).unwrap();
        reg.delete(region);

        held(&VisibilityEvent::visible(region));
        assert_eq!(*log.borrow(), vec!["h1"]);
    }

    #[test]
    fn clear_returns_all_regions() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut reg = CallbackRegistry::new();
        let a = RegionId::new();
        let b = RegionId::new();
        reg.set(a, recording(&log, "a"));
        reg.set(b, recording(&log, "b"));

        let mut cleared = reg.clear();
        cleared.sort();
        let mut expected = vec![a, b];
        expected.sort();

        assert_eq!(cleared, expected);
        assert!(reg.is_empty());
    }
}
