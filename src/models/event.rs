//! Events: one time step's assignments across assets.
//!
//! An event records, for every asset that took part in a step, which task it
//! performed (or that it idled) and over which window, together with the
//! system state that results. Capability predicates read and write the event
//! while it is being checked; once it passes it is sealed behind an `Arc`
//! and never changes again.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{SystemState, Task};

/// One asset's part in an event.
///
/// Invariant: `event_start_ms <= task_start_ms <= task_end_ms <= event_end_ms`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Task performed, `None` when the asset idles.
    pub task: Option<Arc<Task>>,
    /// Event window start (ms).
    pub event_start_ms: i64,
    /// Event window end (ms).
    pub event_end_ms: i64,
    /// Task start (ms).
    pub task_start_ms: i64,
    /// Task end (ms).
    pub task_end_ms: i64,
}

impl Assignment {
    /// Creates an assignment whose task spans `[task_start_ms, task_end_ms]`
    /// inside `[event_start_ms, event_end_ms]`.
    pub fn new(
        task: Option<Arc<Task>>,
        event_start_ms: i64,
        event_end_ms: i64,
        task_start_ms: i64,
        task_end_ms: i64,
    ) -> Self {
        Self {
            task,
            event_start_ms,
            event_end_ms,
            task_start_ms,
            task_end_ms,
        }
    }

    /// Whether the asset idles.
    pub fn is_idle(&self) -> bool {
        self.task.is_none()
    }

    /// Task id, if any.
    pub fn task_id(&self) -> Option<&str> {
        self.task.as_deref().map(|t| t.id.as_str())
    }

    /// Whether the time-ordering invariant holds.
    pub fn is_within_bounds(&self) -> bool {
        self.event_start_ms <= self.task_start_ms
            && self.task_start_ms <= self.task_end_ms
            && self.task_end_ms <= self.event_end_ms
    }

    /// Task duration (ms).
    pub fn task_duration_ms(&self) -> i64 {
        self.task_end_ms - self.task_start_ms
    }
}

/// Assignments for every participating asset plus the resulting state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    assignments: BTreeMap<String, Assignment>,
    state: SystemState,
}

impl Event {
    /// Creates an empty event over `state`.
    pub fn new(state: SystemState) -> Self {
        Self {
            assignments: BTreeMap::new(),
            state,
        }
    }

    /// Builder: adds an asset's assignment.
    pub fn with_assignment(mut self, asset_id: impl Into<String>, assignment: Assignment) -> Self {
        self.assignments.insert(asset_id.into(), assignment);
        self
    }

    /// Adds or replaces an asset's assignment.
    pub fn assign(&mut self, asset_id: impl Into<String>, assignment: Assignment) {
        self.assignments.insert(asset_id.into(), assignment);
    }

    /// Assignment for an asset.
    pub fn assignment(&self, asset_id: &str) -> Option<&Assignment> {
        self.assignments.get(asset_id)
    }

    /// Mutable assignment for an asset.
    pub fn assignment_mut(&mut self, asset_id: &str) -> Option<&mut Assignment> {
        self.assignments.get_mut(asset_id)
    }

    /// Whether an asset takes part in this event.
    pub fn contains(&self, asset_id: &str) -> bool {
        self.assignments.contains_key(asset_id)
    }

    /// Assignments ordered by asset id.
    pub fn assignments(&self) -> impl Iterator<Item = (&str, &Assignment)> {
        self.assignments.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Tasks performed (idle assignments excluded), ordered by asset id.
    pub fn tasks(&self) -> impl Iterator<Item = &Arc<Task>> {
        self.assignments.values().filter_map(|a| a.task.as_ref())
    }

    /// Number of participating assets.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Whether no asset takes part.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Earliest event start across assets.
    pub fn event_start_ms(&self) -> Option<i64> {
        self.assignments.values().map(|a| a.event_start_ms).min()
    }

    /// Latest event end across assets.
    pub fn event_end_ms(&self) -> Option<i64> {
        self.assignments.values().map(|a| a.event_end_ms).max()
    }

    /// State after this event.
    pub fn state(&self) -> &SystemState {
        &self.state
    }

    /// Mutable state, for capability predicates.
    pub fn state_mut(&mut self) -> &mut SystemState {
        &mut self.state
    }

    /// Checks the time-ordering invariant for one asset.
    ///
    /// Assets without an assignment are trivially in bounds.
    pub fn check_bounds(&self, asset_id: &str) -> bool {
        self.assignments
            .get(asset_id)
            .is_none_or(Assignment::is_within_bounds)
    }

    /// Checks the time-ordering invariant for every asset.
    pub fn all_within_bounds(&self) -> bool {
        self.assignments.values().all(Assignment::is_within_bounds)
    }

    /// Seals the event for sharing between histories.
    pub fn seal(self) -> Arc<Event> {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskType;

    fn imaging() -> Arc<Task> {
        Arc::new(Task::new("T1", TaskType::Imaging))
    }

    #[test]
    fn test_event_assignments() {
        let event = Event::new(SystemState::new())
            .with_assignment("sat2", Assignment::new(None, 0, 1000, 0, 0))
            .with_assignment("sat1", Assignment::new(Some(imaging()), 0, 1000, 200, 800));

        assert_eq!(event.len(), 2);
        let ids: Vec<&str> = event.assignments().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["sat1", "sat2"]);
        assert_eq!(event.tasks().count(), 1);
        assert_eq!(event.assignment("sat1").unwrap().task_duration_ms(), 600);
        assert!(event.assignment("sat2").unwrap().is_idle());
        assert_eq!(event.event_start_ms(), Some(0));
        assert_eq!(event.event_end_ms(), Some(1000));
    }

    #[test]
    fn test_check_bounds() {
        let mut event = Event::new(SystemState::new())
            .with_assignment("sat1", Assignment::new(Some(imaging()), 0, 1000, 0, 1000));
        assert!(event.check_bounds("sat1"));
        assert!(event.check_bounds("absent"));

        event.assignment_mut("sat1").unwrap().task_end_ms = 1500;
        assert!(!event.check_bounds("sat1"));

        let a = event.assignment_mut("sat1").unwrap();
        a.event_end_ms = 1500;
        assert!(event.check_bounds("sat1"));

        event.assignment_mut("sat1").unwrap().task_start_ms = -1;
        assert!(!event.check_bounds("sat1"));
    }

    #[test]
    fn test_all_within_bounds() {
        let mut event = Event::new(SystemState::new())
            .with_assignment("sat1", Assignment::new(Some(imaging()), 0, 1000, 0, 1000))
            .with_assignment("sat2", Assignment::new(None, 0, 1000, 0, 0));
        assert!(event.all_within_bounds());
        assert!(Event::default().all_within_bounds());

        event.assignment_mut("sat2").unwrap().task_end_ms = 6000;
        assert!(event.check_bounds("sat1"));
        assert!(!event.all_within_bounds());
    }

    #[test]
    fn test_empty_event() {
        let event = Event::default();
        assert!(event.is_empty());
        assert_eq!(event.event_start_ms(), None);
    }
}
