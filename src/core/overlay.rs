//! Local analyst-action overlay
//!
//! Records approve/escalate/block decisions made by an operator, keyed by
//! event id. Lives outside the event buffer: buffered events are never
//! rewritten, the overlay is applied at read time.
//!
//! Ids are keyed by their text form, so `"7"` and `7` name the same event.
//! The oldest entries are evicted once the overlay is full.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

use super::event::{AnalystAction, CanonicalEvent, EventId};

/// Default number of recorded actions kept
pub const DEFAULT_OVERLAY_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct Entries {
    actions: HashMap<String, AnalystAction>,
    /// Insertion order, oldest first
    order: VecDeque<String>,
}

#[derive(Debug)]
pub struct ActionOverlay {
    entries: RwLock<Entries>,
    capacity: usize,
}

/// Event paired with its overlay state, for display
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayEvent<'a> {
    #[serde(flatten)]
    pub event: &'a CanonicalEvent,
    /// Action recorded locally, if any
    pub local_action: Option<AnalystAction>,
    /// Local action if present, else whatever the feed reported
    pub effective_action: Option<AnalystAction>,
}

impl ActionOverlay {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_OVERLAY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            capacity: capacity.max(1),
        }
    }

    /// Record (or replace) the local action for an event
    pub fn record(&self, id: &EventId, action: AnalystAction) -> Option<AnalystAction> {
        let key = id.to_string();
        let mut entries = self.entries.write();

        let previous = entries.actions.insert(key.clone(), action);
        if previous.is_none() {
            entries.order.push_back(key);
            while entries.order.len() > self.capacity {
                if let Some(oldest) = entries.order.pop_front() {
                    entries.actions.remove(&oldest);
                }
            }
        }
        previous
    }

    pub fn get(&self, id: &EventId) -> Option<AnalystAction> {
        self.entries.read().actions.get(&id.to_string()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.read().actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().actions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pair each event with its overlay entry. Order is preserved.
    pub fn apply<'a>(&self, events: &'a [CanonicalEvent]) -> Vec<DisplayEvent<'a>> {
        let entries = self.entries.read();
        events
            .iter()
            .map(|event| {
                let local_action = entries.actions.get(&event.id.to_string()).copied();
                DisplayEvent {
                    event,
                    local_action,
                    effective_action: local_action.or(event.analyst_action),
                }
            })
            .collect()
    }
}

impl Default for ActionOverlay {
    fn default() -> Self {
        Self::new()
    }
}
