//! Bounded, de-duplicated event history
//!
//! Newest-first, capped at a fixed size. Eviction is by capacity only: the
//! oldest entry beyond the cap is dropped silently.

use std::collections::{HashMap, VecDeque};

use crate::core::{CanonicalEvent, EventId};

/// Default number of visible events
pub const DEFAULT_CAPACITY: usize = 50;

/// Outcome of a single admission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Prepended to the buffer
    Admitted,
    /// Id already present; buffer unchanged
    Duplicate,
}

#[derive(Debug, Clone)]
pub struct EventBuffer {
    /// Front is newest
    events: VecDeque<CanonicalEvent>,
    /// Id -> number of buffered entries with that id. A snapshot may repeat ids.
    index: HashMap<EventId, usize>,
    capacity: usize,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    /// Discard everything and install `events` in the given order, truncated to the cap
    pub fn replace_all<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = CanonicalEvent>,
    {
        self.events.clear();
        self.index.clear();

        for event in events.into_iter().take(self.capacity) {
            *self.index.entry(event.id.clone()).or_insert(0) += 1;
            self.events.push_back(event);
        }
    }

    /// Prepend `event` unless its id is already buffered. First seen wins.
    pub fn admit_one(&mut self, event: CanonicalEvent) -> Admission {
        if self.index.contains_key(&event.id) {
            return Admission::Duplicate;
        }

        self.index.insert(event.id.clone(), 1);
        self.events.push_front(event);

        while self.events.len() > self.capacity {
            if let Some(evicted) = self.events.pop_back() {
                self.forget(&evicted.id);
            }
        }

        Admission::Admitted
    }

    fn forget(&mut self, id: &EventId) {
        if let Some(count) = self.index.get_mut(id) {
            *count -= 1;
            if *count == 0 {
                self.index.remove(id);
            }
        }
    }

    #[inline]
    pub fn contains(&self, id: &EventId) -> bool {
        self.index.contains_key(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Newest first
    pub fn iter(&self) -> impl Iterator<Item = &CanonicalEvent> {
        self.events.iter()
    }

    /// Copy of the contents, newest first
    pub fn to_vec(&self) -> Vec<CanonicalEvent> {
        self.events.iter().cloned().collect()
    }
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RiskBand;
    use crate::test_utils::event;
    use proptest::prelude::*;

    fn ids(buffer: &EventBuffer) -> Vec<String> {
        buffer.iter().map(|e| e.id.to_string()).collect()
    }

    #[test]
    fn test_admit_prepends() {
        let mut buffer = EventBuffer::new(3);
        assert_eq!(buffer.admit_one(event("a")), Admission::Admitted);
        assert_eq!(buffer.admit_one(event("b")), Admission::Admitted);
        assert_eq!(ids(&buffer), vec!["b", "a"]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut buffer = EventBuffer::new(3);
        for id in ["a", "b", "c", "d"] {
            buffer.admit_one(event(id));
        }
        assert_eq!(ids(&buffer), vec!["d", "c", "b"]);
        assert!(!buffer.contains(&EventId::from("a")));

        // evicted id can come back
        assert_eq!(buffer.admit_one(event("a")), Admission::Admitted);
        assert_eq!(ids(&buffer), vec!["a", "d", "c"]);
    }

    #[test]
    fn test_duplicate_keeps_first_seen_fields() {
        let mut buffer = EventBuffer::new(5);
        buffer.admit_one(event("a"));

        let mut changed = event("a");
        changed.risk_band = RiskBand::Low;
        changed.fraud_probability = 0.01;

        assert_eq!(buffer.admit_one(changed), Admission::Duplicate);
        assert_eq!(buffer.len(), 1);
        let kept = buffer.iter().next().unwrap();
        assert_eq!(kept.risk_band, RiskBand::High);
        assert_eq!(kept.fraud_probability, 0.9);
    }

    #[test]
    fn test_duplicate_detected_anywhere() {
        let mut buffer = EventBuffer::new(5);
        for id in ["a", "b", "c"] {
            buffer.admit_one(event(id));
        }
        assert_eq!(buffer.admit_one(event("a")), Admission::Duplicate);
        assert_eq!(ids(&buffer), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_replace_all_keeps_server_order_and_truncates() {
        let mut buffer = EventBuffer::new(2);
        buffer.admit_one(event("old"));
        buffer.replace_all(vec![event("x"), event("y"), event("z")]);

        assert_eq!(ids(&buffer), vec!["x", "y"]);
        assert!(!buffer.contains(&EventId::from("old")));
        assert!(!buffer.contains(&EventId::from("z")));
        assert_eq!(buffer.admit_one(event("y")), Admission::Duplicate);
    }

    #[test]
    fn test_replace_all_with_repeated_ids() {
        let mut buffer = EventBuffer::new(3);
        buffer.replace_all(vec![event("a"), event("b"), event("a")]);
        assert_eq!(buffer.len(), 3);

        // evicting one copy of "a" leaves the other indexed
        buffer.admit_one(event("c"));
        assert_eq!(ids(&buffer), vec!["c", "a", "b"]);
        assert_eq!(buffer.admit_one(event("a")), Admission::Duplicate);
    }

    #[test]
    fn test_replace_all_empty_clears() {
        let mut buffer = EventBuffer::default();
        buffer.admit_one(event("a"));
        buffer.replace_all(Vec::new());
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), DEFAULT_CAPACITY);
    }

    proptest! {
        #[test]
        fn prop_unique_admissions_keep_newest(n in 0usize..200, cap in 1usize..60) {
            let mut buffer = EventBuffer::new(cap);
            for i in 0..n {
                prop_assert_eq!(buffer.admit_one(event(&i.to_string())), Admission::Admitted);
            }

            prop_assert_eq!(buffer.len(), n.min(cap));
            let expected: Vec<String> = (0..n).rev().take(cap).map(|i| i.to_string()).collect();
            prop_assert_eq!(ids(&buffer), expected);
        }

        #[test]
        fn prop_never_exceeds_cap_or_holds_duplicates(
            stream in proptest::collection::vec(0u8..20, 0..300),
            cap in 1usize..25,
        ) {
            let mut buffer = EventBuffer::new(cap);
            for id in stream {
                buffer.admit_one(event(&id.to_string()));
                prop_assert!(buffer.len() <= cap);
            }

            let mut seen = ids(&buffer);
            let total = seen.len();
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), total);
        }
    }
}
