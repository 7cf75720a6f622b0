//! Branchable event history.
//!
//! A [`StateHistory`] is an initial state plus an append-only sequence of
//! sealed events. Branching copies only the `Arc` handles, so every child
//! shares its parent's events and initial state.

use std::sync::Arc;

use super::{Event, SystemState};

/// Initial state plus the events applied so far.
#[derive(Debug, Clone, Default)]
pub struct StateHistory {
    initial: Arc<SystemState>,
    events: Vec<Arc<Event>>,
}

impl StateHistory {
    /// Creates an empty history over an initial state.
    pub fn new(initial: SystemState) -> Self {
        Self {
            initial: Arc::new(initial),
            events: Vec::new(),
        }
    }

    /// Creates a history that shares `initial`.
    pub fn from_shared(initial: Arc<SystemState>) -> Self {
        Self {
            initial,
            events: Vec::new(),
        }
    }

    /// New history = this history + `event`. `self` is unchanged.
    pub fn branch(&self, event: Arc<Event>) -> Self {
        let mut events = Vec::with_capacity(self.events.len() + 1);
        events.extend(self.events.iter().cloned());
        events.push(event);
        Self {
            initial: Arc::clone(&self.initial),
            events,
        }
    }

    /// New history with the most recent event replaced by `event`.
    ///
    /// Used when post-run extension rewrites the final event. Returns an
    /// unchanged copy when the history is empty.
    pub fn replace_last(&self, event: Arc<Event>) -> Self {
        let mut events = self.events.clone();
        if let Some(last) = events.last_mut() {
            *last = event;
        }
        Self {
            initial: Arc::clone(&self.initial),
            events,
        }
    }

    /// Initial state.
    pub fn initial_state(&self) -> &SystemState {
        &self.initial
    }

    /// State after the most recent event, or the initial state.
    pub fn last_state(&self) -> &SystemState {
        self.events
            .last()
            .map(|e| e.state())
            .unwrap_or(&self.initial)
    }

    /// Most recent event.
    pub fn last_event(&self) -> Option<&Arc<Event>> {
        self.events.last()
    }

    /// Most recent event in which `asset_id` took part.
    pub fn last_event_for(&self, asset_id: &str) -> Option<&Arc<Event>> {
        self.events.iter().rev().find(|e| e.contains(asset_id))
    }

    /// How many times `task_id` was performed by any asset.
    pub fn times_completed(&self, task_id: &str) -> usize {
        self.events
            .iter()
            .flat_map(|e| e.tasks())
            .filter(|t| t.id == task_id)
            .count()
    }

    /// How many times `asset_id` performed `task_id`.
    pub fn times_completed_by(&self, asset_id: &str, task_id: &str) -> usize {
        self.events
            .iter()
            .filter_map(|e| e.assignment(asset_id))
            .filter(|a| a.task_id() == Some(task_id))
            .count()
    }

    /// Events in order.
    pub fn events(&self) -> &[Arc<Event>] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no event has been applied.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether `asset_id` has not taken part in any event.
    pub fn is_empty_for(&self, asset_id: &str) -> bool {
        self.last_event_for(asset_id).is_none()
    }
}
