//! Mission planning domain models.
//!
//! Provides the data types the search operates on: what can be done
//! ([`Task`], [`Access`]), who does it ([`Asset`]), what happened
//! ([`Event`], [`StateHistory`]), and the candidate plans built from them
//! ([`Schedule`]).
//!
//! # Domain Mappings
//!
//! | u-mission | Space | Airborne | Ground |
//! |-----------|-------|----------|--------|
//! | Asset | Satellite | UAV | Ground station |
//! | Task | Image target | Survey leg | Downlink pass |
//! | Access | Visibility window | Line of sight | Contact window |
//! | Event | Time step | Time step | Time step |

mod access;
mod asset;
mod constraint;
mod event;
mod history;
mod schedule;
mod state;
mod task;

pub use access::Access;
pub use asset::Asset;
pub use constraint::{Constraint, ConstraintKind};
pub use event::{Assignment, Event};
pub use history::StateHistory;
pub use schedule::{Sample, Schedule, StateSeries, VariableSeries, ROOT_ID};
pub use state::{Profile, StateKey, StateKind, StateValue, SystemState};
pub use task::{Target, Task, TaskType};
