//! State constraints.
//!
//! A constraint bounds one state variable written by a capability node. It
//! is checked after every node in the graph has passed, against the maximum
//! value the variable takes over the event window.
//!
//! # Reference
//! Brucker (2007), "Scheduling Algorithms", Ch. 2

use serde::{Deserialize, Serialize};

use super::StateKey;

/// Comparison applied by a [`Constraint`]. Each variant names the condition
/// under which the schedule is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Reject when `max > threshold`.
    FailIfHigher,
    /// Reject when `max >= threshold`.
    FailIfHigherOrEqual,
    /// Reject when `max < threshold`.
    FailIfLower,
    /// Reject when `max <= threshold`.
    FailIfLowerOrEqual,
    /// Reject when `max == threshold`.
    FailIfEqual,
    /// Reject when `max != threshold`.
    FailIfNotEqual,
}

impl ConstraintKind {
    /// Whether `value` passes against `threshold`.
    pub fn accepts(self, value: f64, threshold: f64) -> bool {
        match self {
            ConstraintKind::FailIfHigher => value <= threshold,
            ConstraintKind::FailIfHigherOrEqual => value < threshold,
            ConstraintKind::FailIfLower => value >= threshold,
            ConstraintKind::FailIfLowerOrEqual => value > threshold,
            ConstraintKind::FailIfEqual => value != threshold,
            ConstraintKind::FailIfNotEqual => value == threshold,
        }
    }
}

/// A bound on one capability node's output variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Constraint name, for diagnostics.
    pub name: String,
    /// Capability node whose output is constrained.
    pub node_id: String,
    /// Constrained variable. Must be a scalar kind.
    pub key: StateKey,
    /// Comparison.
    pub kind: ConstraintKind,
    /// Threshold the maximum is compared with.
    pub threshold: f64,
}

impl Constraint {
    /// Creates a constraint.
    pub fn new(
        name: impl Into<String>,
        node_id: impl Into<String>,
        key: StateKey,
        kind: ConstraintKind,
        threshold: f64,
    ) -> Self {
        Self {
            name: name.into(),
            node_id: node_id.into(),
            key,
            kind,
            threshold,
        }
    }

    /// Rejects schedules whose variable exceeds `limit`.
    pub fn fail_if_higher(
        name: impl Into<String>,
        node_id: impl Into<String>,
        key: StateKey,
        limit: f64,
    ) -> Self {
        Self::new(name, node_id, key, ConstraintKind::FailIfHigher, limit)
    }

    /// Rejects schedules whose variable falls below `limit`.
    pub fn fail_if_lower(
        name: impl Into<String>,
        node_id: impl Into<String>,
        key: StateKey,
        limit: f64,
    ) -> Self {
        Self::new(name, node_id, key, ConstraintKind::FailIfLower, limit)
    }

    /// Whether the observed window maximum passes.
    pub fn accepts(&self, max_value: f64) -> bool {
        self.kind.accepts(max_value, self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_kinds() {
        use ConstraintKind::*;
        assert!(FailIfHigher.accepts(10.0, 10.0));
        assert!(!FailIfHigher.accepts(10.1, 10.0));
        assert!(!FailIfHigherOrEqual.accepts(10.0, 10.0));
        assert!(FailIfLower.accepts(10.0, 10.0));
        assert!(!FailIfLower.accepts(9.9, 10.0));
        assert!(!FailIfLowerOrEqual.accepts(10.0, 10.0));
        assert!(!FailIfEqual.accepts(3.0, 3.0));
        assert!(FailIfEqual.accepts(3.5, 3.0));
        assert!(FailIfNotEqual.accepts(3.0, 3.0));
        assert!(!FailIfNotEqual.accepts(3.5, 3.0));
    }

    #[test]
    fn test_constraint_builder() {
        let c = Constraint::fail_if_higher(
            "storage_cap",
            "sat1.camera",
            StateKey::int("sat1.num_images_stored"),
            8.0,
        );
        assert_eq!(c.kind, ConstraintKind::FailIfHigher);
        assert_eq!(c.node_id, "sat1.camera");
        assert!(c.accepts(8.0));
        assert!(!c.accepts(9.0));
    }

    #[test]
    fn test_constraint_serde() {
        let c = Constraint::fail_if_lower("min_power", "sat1.power", StateKey::double("sat1.p"), 0.0);
        let json = serde_json::to_string(&c).unwrap();
        let back: Constraint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
