//! Error types.
//!
//! Two tiers, matching how failures are handled during the search:
//!
//! - [`SchedulerError`]: fatal. Indicates defective input (malformed
//!   accesses, invalid parameters, a broken capability graph) and aborts
//!   the run.
//! - [`CapabilityError`]: contained. Raised by a single capability
//!   predicate; the checker logs it and treats that node as infeasible for
//!   the one proposed event.

use thiserror::Error;

use crate::models::StateKind;
use crate::validation::ValidationError;

/// Fatal scheduling errors.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Access window with `start >= end`.
    #[error("malformed access for asset '{asset_id}': start {start_ms} ms is not before end {end_ms} ms")]
    MalformedAccess {
        asset_id: String,
        start_ms: i64,
        end_ms: i64,
    },

    /// Access window that does not overlap the event it was assigned to.
    #[error(
        "access for asset '{asset_id}' [{start_ms}, {end_ms}] ms lies outside event window [{event_start_ms}, {event_end_ms}] ms"
    )]
    AccessOutsideEvent {
        asset_id: String,
        start_ms: i64,
        end_ms: i64,
        event_start_ms: i64,
        event_end_ms: i64,
    },

    /// Scenario parameters that cannot drive a search.
    #[error("invalid scheduler parameters: {0}")]
    InvalidParameters(String),

    /// Constraint bound to a variable it cannot be evaluated against.
    #[error("invalid constraint '{name}': {reason}")]
    InvalidConstraint { name: String, reason: String },

    /// A dependency edge or constraint names a node that is not in the graph.
    #[error("unknown capability node '{0}'")]
    UnknownNode(String),

    /// Model-build checks failed.
    #[error("system validation failed with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),
}

/// Result alias for fatal scheduling errors.
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Failure raised inside a capability predicate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CapabilityError {
    /// The predicate read a state variable that has no samples.
    #[error("missing state variable '{0}'")]
    MissingState(String),

    /// The stored value kind does not match what the predicate expects.
    #[error("state variable '{key}' holds {found:?}, expected {expected:?}")]
    TypeMismatch {
        key: String,
        expected: StateKind,
        found: StateKind,
    },

    /// The asset has no assignment in the proposed event.
    #[error("asset '{0}' has no assignment in the proposed event")]
    NoAssignment(String),

    /// Model-specific failure.
    #[error("{0}")]
    Model(String),
}
