//! Mission task planning for the U-Engine ecosystem.
//!
//! Plans feasible sequences of asset → task assignments over a discretized
//! timeline. Every assignment must pass a graph of capability checks and
//! per-task repetition limits; candidate plans are scored by a pluggable
//! evaluator and the best survive.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Task`, `Asset`, `Access`, `SystemState`,
//!   `Event`, `StateHistory`, `Schedule`, `Constraint`
//! - **`capability`**: The `Capability` predicate trait, capability graph,
//!   and built-in predicates
//! - **`checker`**: Feasibility checking of proposed events
//! - **`scheduler`**: Beam search, candidate generation, cropping
//! - **`hashing`**: Deterministic content hashes and the audit log
//! - **`evaluator`**: Schedule scoring
//! - **`system`**, **`config`**: Problem definition and scenario parameters
//! - **`validation`**: Model-build checks (duplicate IDs, DAG cycles, references)
//!
//! # Architecture
//!
//! Schedules are paths in a search tree. Branching shares the parent's
//! events and copy-on-write state, so the tree costs one event per node.
//! Checking a candidate touches only its own event; the only shared
//! mutable resource is the optional hash audit log.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4

pub mod capability;
pub mod checker;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod hashing;
pub mod models;
pub mod scheduler;
pub mod system;
pub mod validation;

pub use error::{CapabilityError, Result, SchedulerError};
