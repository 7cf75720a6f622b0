//! Schedule (search-tree node) model.
//!
//! A schedule is one path from the root of the search tree: an event
//! history, the score the evaluator gave it, a lineage id for debugging and
//! a content hash for reproducibility checks. Branching a schedule never
//! modifies it; the child shares the parent's events.
//!
//! # Lineage Ids
//! The root is `"0"`. A child of `"0.1"` created in the next step is
//! `"0.1.<n>"`. Schedules that survive a step without branching are padded
//! with `".0"` so the number of segments tracks the step count.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{Assignment, Event, StateHistory, StateKind, StateValue, SystemState};
use crate::hashing::ContentHash;

/// Lineage id of the root schedule.
pub const ROOT_ID: &str = "0";

/// A candidate plan: a history plus its score and identity.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Lineage id.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Score assigned by the last evaluation.
    pub score: f64,
    /// Step at which this schedule was created.
    pub step: usize,
    history: StateHistory,
    content_hash: ContentHash,
}

impl Schedule {
    /// Creates the empty root schedule over an initial state.
    pub fn root(initial: SystemState) -> Self {
        Self::from_history(ROOT_ID, StateHistory::new(initial))
    }

    /// Wraps an existing history. The content hash is recomputed.
    pub fn from_history(id: impl Into<String>, history: StateHistory) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            score: 0.0,
            step: 0,
            content_hash: ContentHash::of_history(&history),
            history,
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// New child schedule with `event` appended.
    pub fn branch(&self, id: impl Into<String>, event: Arc<Event>, step: usize) -> Self {
        let content_hash = ContentHash::compute(&self.content_hash, &event);
        Self {
            id: id.into(),
            name: self.name.clone(),
            score: 0.0,
            step,
            history: self.history.branch(event),
            content_hash,
        }
    }

    /// The event history.
    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    /// Content hash of the history.
    pub fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }

    /// Whether this is an empty (baseline) schedule.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// How many times `task_id` appears across all events.
    pub fn task_count(&self, task_id: &str) -> usize {
        self.history.times_completed(task_id)
    }

    /// All of an asset's assignments, in chronological order.
    pub fn assignments_for_asset(&self, asset_id: &str) -> Vec<&Assignment> {
        self.history
            .events()
            .iter()
            .filter_map(|e| e.assignment(asset_id))
            .collect()
    }

    /// Latest event end across all events (ms). `None` for an empty schedule.
    pub fn horizon_ms(&self) -> Option<i64> {
        self.history
            .events()
            .iter()
            .filter_map(|e| e.event_end_ms())
            .max()
    }

    /// Time series of every state variable in the final state.
    pub fn state_series(&self) -> StateSeries {
        StateSeries::from_state(self.history.last_state())
    }
}

/// Serializable time series of a state, one entry per variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSeries {
    /// Variables ordered by name, then kind.
    pub variables: Vec<VariableSeries>,
}

/// Samples of a single variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSeries {
    /// Scoped variable name (`"<asset>.<variable>"`).
    pub name: String,
    /// Value kind.
    pub kind: StateKind,
    /// `(time_ms, value)` pairs in time order.
    pub samples: Vec<Sample>,
}

/// One time-stamped value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Time (ms).
    pub time_ms: i64,
    /// Value.
    pub value: StateValue,
}

impl StateSeries {
    /// Extracts every profile of `state`.
    pub fn from_state(state: &SystemState) -> Self {
        let variables = state
            .iter()
            .map(|(key, profile)| VariableSeries {
                name: key.name.clone(),
                kind: key.kind,
                samples: profile
                    .iter()
                    .map(|(time_ms, value)| Sample {
                        time_ms,
                        value: value.clone(),
                    })
                    .collect(),
            })
            .collect();
        Self { variables }
    }

    /// Series for a variable name.
    pub fn get(&self, name: &str) -> Option<&VariableSeries> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether there are no variables.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
