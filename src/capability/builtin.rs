//! Built-in capability predicates.
//!
//! # Catalog
//!
//! - [`AlwaysFeasible`]: accepts everything
//! - [`PowerBudget`]: energy bookkeeping for recharge/transmit/imaging
//! - [`ImageStorage`]: onboard image counter with a hard cap
//! - [`FnCapability`]: closure adapter for ad-hoc predicates
//!
//! State written by these predicates is scoped to the asset, e.g.
//! `sat1.checker_power`.

use std::fmt;
use std::sync::Arc;

use super::Capability;
use crate::error::CapabilityError;
use crate::models::{Event, StateKey, StateKind, StateValue, TaskType};
use crate::system::Environment;

/// Default offset (ms) after task start at which predicates record updates.
pub const DEFAULT_UPDATE_OFFSET_MS: i64 = 100;

/// Accepts every event without touching state.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFeasible;

impl Capability for AlwaysFeasible {
    fn name(&self) -> &str {
        "always"
    }

    fn can_perform(
        &self,
        _asset_id: &str,
        _event: &mut Event,
        _environment: &Environment,
    ) -> Result<bool, CapabilityError> {
        Ok(true)
    }
}

/// Energy budget.
///
/// Reads the last value of `<asset>.<variable>` and, depending on the task
/// type, adds `recharge` or subtracts the task's cost, writing the new level
/// at `task_start + update_offset_ms`. Rejects when a recharge would exceed
/// `max_power` or a cost would take the level below `min_power`. Idle
/// assignments pass untouched; custom task types are rejected.
#[derive(Debug, Clone)]
pub struct PowerBudget {
    /// Energy gained by a recharge task.
    pub recharge: f64,
    /// Upper bound on stored energy.
    pub max_power: f64,
    /// Lower bound on stored energy.
    pub min_power: f64,
    /// Energy used by transmit and comm tasks.
    pub transmit_cost: f64,
    /// Energy used by imaging tasks.
    pub imaging_cost: f64,
    /// Unscoped variable name.
    pub variable: String,
    /// Offset of the written sample from task start (ms).
    pub update_offset_ms: i64,
}

impl PowerBudget {
    /// Creates a budget with the given recharge amount and capacity.
    pub fn new(recharge: f64, max_power: f64) -> Self {
        Self {
            recharge,
            max_power,
            min_power: 0.0,
            transmit_cost: 0.0,
            imaging_cost: 0.0,
            variable: "checker_power".to_string(),
            update_offset_ms: DEFAULT_UPDATE_OFFSET_MS,
        }
    }

    /// Sets the lower bound.
    pub fn with_min_power(mut self, min_power: f64) -> Self {
        self.min_power = min_power;
        self
    }

    /// Sets the transmit cost.
    pub fn with_transmit_cost(mut self, cost: f64) -> Self {
        self.transmit_cost = cost;
        self
    }

    /// Sets the imaging cost.
    pub fn with_imaging_cost(mut self, cost: f64) -> Self {
        self.imaging_cost = cost;
        self
    }

    /// Sets the variable name.
    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = variable.into();
        self
    }

    /// State key for an asset.
    pub fn key(&self, asset_id: &str) -> StateKey {
        StateKey::scoped(asset_id, &self.variable, StateKind::Double)
    }
}

impl Capability for PowerBudget {
    fn name(&self) -> &str {
        "power"
    }

    fn can_perform(
        &self,
        asset_id: &str,
        event: &mut Event,
        _environment: &Environment,
    ) -> Result<bool, CapabilityError> {
        let assignment = event
            .assignment(asset_id)
            .ok_or_else(|| CapabilityError::NoAssignment(asset_id.to_string()))?;
        let Some(task) = assignment.task.clone() else {
            return Ok(true);
        };
        let update_ms = assignment.task_start_ms + self.update_offset_ms;

        let key = self.key(asset_id);
        let level = event.state().last_scalar(&key)?;

        let next = match task.task_type {
            TaskType::Recharge => {
                let next = level + self.recharge;
                if next > self.max_power {
                    return Ok(false);
                }
                next
            }
            TaskType::Transmit | TaskType::Comm => level - self.transmit_cost,
            TaskType::Imaging => level - self.imaging_cost,
            TaskType::Custom(_) => return Ok(false),
        };
        if next < self.min_power {
            return Ok(false);
        }

        event
            .state_mut()
            .add_value(&key, update_ms, StateValue::Double(next))?;
        Ok(true)
    }
}

/// Onboard image counter.
///
/// Imaging tasks increment `<asset>.<variable>` (an `Int`) and are rejected
/// once `max_images` are stored. Other tasks pass untouched.
#[derive(Debug, Clone)]
pub struct ImageStorage {
    /// Storage capacity.
    pub max_images: i64,
    /// Unscoped variable name.
    pub variable: String,
    /// Offset of the written sample from task start (ms).
    pub update_offset_ms: i64,
}

impl ImageStorage {
    /// Creates a counter with the given capacity.
    pub fn new(max_images: i64) -> Self {
        Self {
            max_images,
            variable: "num_images_stored".to_string(),
            update_offset_ms: DEFAULT_UPDATE_OFFSET_MS,
        }
    }

    /// Sets the variable name.
    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = variable.into();
        self
    }

    /// State key for an asset.
    pub fn key(&self, asset_id: &str) -> StateKey {
        StateKey::scoped(asset_id, &self.variable, StateKind::Int)
    }
}

impl Capability for ImageStorage {
    fn name(&self) -> &str {
        "camera"
    }

    fn can_perform(
        &self,
        asset_id: &str,
        event: &mut Event,
        _environment: &Environment,
    ) -> Result<bool, CapabilityError> {
        let assignment = event
            .assignment(asset_id)
            .ok_or_else(|| CapabilityError::NoAssignment(asset_id.to_string()))?;
        let is_imaging = assignment
            .task
            .as_deref()
            .is_some_and(|t| t.task_type == TaskType::Imaging);
        if !is_imaging {
            return Ok(true);
        }
        let update_ms = assignment.task_start_ms + self.update_offset_ms;

        let key = self.key(asset_id);
        let stored = match event.state().last_value(&key) {
            Some((_, StateValue::Int(n))) => *n,
            Some((_, other)) => {
                return Err(CapabilityError::TypeMismatch {
                    key: key.name.clone(),
                    expected: StateKind::Int,
                    found: other.kind(),
                })
            }
            None => return Err(CapabilityError::MissingState(key.name.clone())),
        };
        if stored >= self.max_images {
            return Ok(false);
        }

        event
            .state_mut()
            .add_value(&key, update_ms, StateValue::Int(stored + 1))?;
        Ok(true)
    }
}

type PredicateFn =
    dyn Fn(&str, &mut Event, &Environment) -> Result<bool, CapabilityError> + Send + Sync;

/// Closure adapter.
///
/// ```
/// use u_mission::capability::builtin::FnCapability;
///
/// let never = FnCapability::new("never", |_, _, _| Ok(false));
/// ```
#[derive(Clone)]
pub struct FnCapability {
    name: String,
    predicate: Arc<PredicateFn>,
}

impl FnCapability {
    /// Wraps a closure.
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&str, &mut Event, &Environment) -> Result<bool, CapabilityError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }
}

impl fmt::Debug for FnCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCapability")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Capability for FnCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_perform(
        &self,
        asset_id: &str,
        event: &mut Event,
        environment: &Environment,
    ) -> Result<bool, CapabilityError> {
        (self.predicate)(asset_id, event, environment)
    }
}
