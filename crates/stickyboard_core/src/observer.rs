//! Synchronous observer registry.
//!
//! Observers are called in subscription order, on the caller's thread, right
//! after the change they observe has been committed.

use std::collections::BTreeMap;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

/// Ordered set of boxed observer callbacks of one shape.
pub struct ObserverList<F: ?Sized> {
    next_id: u64,
    observers: BTreeMap<ObserverId, Box<F>>,
}

impl<F: ?Sized> Default for ObserverList<F> {
    fn default() -> Self {
        Self {
            next_id: 0,
            observers: BTreeMap::new(),
        }
    }
}

impl<F: ?Sized> ObserverList<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<F>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.insert(id, observer);
        id
    }

    /// Returns whether the observer was registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Iterates observers in subscription order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<F>> + '_ {
        self.observers.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::ObserverList;

    type Callback = dyn FnMut(&mut Vec<&'static str>);

    #[test]
    fn observers_run_in_subscription_order_until_removed() {
        let mut list: ObserverList<Callback> = ObserverList::new();
        let first = list.subscribe(Box::new(|log| log.push("first")));
        list.subscribe(Box::new(|log| log.push("second")));

        let mut log = Vec::new();
        for observer in list.iter_mut() {
            observer(&mut log);
        }
        assert_eq!(log, vec!["first", "second"]);

        assert!(list.unsubscribe(first));
        assert!(!list.unsubscribe(first));
        assert_eq!(list.len(), 1);
    }
}
