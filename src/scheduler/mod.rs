//! Time-stepped schedule-tree search.
//!
//! Provides the beam-search [`Scheduler`] and the pieces it is built from:
//! access providers, candidate generation with time deconfliction, and
//! population cropping.
//!
//! # Algorithm
//!
//! Each step expands every live schedule by every combination of open
//! accesses, filters the results through deconfliction and the
//! feasibility checker, and merges the survivors into the population. The
//! population is bounded by cropping to the best-scoring schedules, so the
//! search is a bounded-width beam, not an exhaustive one.
//!
//! # References
//!
//! - Lowerre (1976), "The HARPY Speech Recognition System" (beam search)
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4

mod access;
mod beam;
mod context;
pub mod crop;
pub mod deconflict;

pub use access::{AccessProvider, ExhaustiveAccess, PregeneratedAccesses};
pub use beam::{Scheduler, StepStats};
pub use context::{CancelToken, SearchContext};
