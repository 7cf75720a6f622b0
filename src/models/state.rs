//! State model: typed variables, time-value profiles, and system state.
//!
//! A [`SystemState`] maps each [`StateKey`] to a [`Profile`] of time-ordered
//! samples. Profiles are held behind `Arc` so that branching a state
//! ([`SystemState::fork`]) shares every profile with the parent; the first
//! write to a profile on the child copies it (`Arc::make_mut`), so a child
//! can never alter its parent's history.
//!
//! # Time Representation
//! Sample times are in milliseconds relative to the scenario epoch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::CapabilityError;

/// Value kind of a state variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StateKind {
    /// Integer counter.
    Int,
    /// Real-valued quantity.
    Double,
    /// Flag.
    Bool,
    /// Dense row-major matrix.
    Matrix,
    /// Attitude quaternion `[w, x, y, z]`.
    Quaternion,
    /// Dense vector.
    Vector,
}

impl StateKind {
    /// Whether values of this kind project onto a single real number.
    pub fn is_scalar(self) -> bool {
        matches!(self, StateKind::Int | StateKind::Double | StateKind::Bool)
    }
}

/// Identity of a state variable: name + kind.
///
/// Names are conventionally scoped to an asset as `"<asset>.<variable>"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateKey {
    /// Fully scoped variable name.
    pub name: String,
    /// Value kind.
    pub kind: StateKind,
}

impl StateKey {
    /// Creates a key.
    pub fn new(name: impl Into<String>, kind: StateKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Creates a key scoped to an asset (`"<asset>.<variable>"`).
    pub fn scoped(asset_id: &str, variable: &str, kind: StateKind) -> Self {
        Self::new(format!("{asset_id}.{variable}"), kind)
    }

    /// Integer key.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, StateKind::Int)
    }

    /// Double key.
    pub fn double(name: impl Into<String>) -> Self {
        Self::new(name, StateKind::Double)
    }

    /// Boolean key.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, StateKind::Bool)
    }

    /// Vector key.
    pub fn vector(name: impl Into<String>) -> Self {
        Self::new(name, StateKind::Vector)
    }

    /// Owning asset, when the name is scoped.
    pub fn asset_id(&self) -> Option<&str> {
        self.name.split_once('.').map(|(asset, _)| asset)
    }
}

/// A single state value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateValue {
    Int(i64),
    Double(f64),
    Bool(bool),
    Matrix(Vec<Vec<f64>>),
    Quaternion([f64; 4]),
    Vector(Vec<f64>),
}

impl StateValue {
    /// Kind of this value.
    pub fn kind(&self) -> StateKind {
        match self {
            StateValue::Int(_) => StateKind::Int,
            StateValue::Double(_) => StateKind::Double,
            StateValue::Bool(_) => StateKind::Bool,
            StateValue::Matrix(_) => StateKind::Matrix,
            StateValue::Quaternion(_) => StateKind::Quaternion,
            StateValue::Vector(_) => StateKind::Vector,
        }
    }

    /// Scalar projection (`true` = 1.0). `None` for non-scalar kinds.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            StateValue::Int(v) => Some(*v as f64),
            StateValue::Double(v) => Some(*v),
            StateValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Euclidean magnitude. Frobenius norm for matrices, absolute value for scalars.
    pub fn magnitude(&self) -> f64 {
        match self {
            StateValue::Matrix(rows) => rows
                .iter()
                .flat_map(|r| r.iter())
                .map(|v| v * v)
                .sum::<f64>()
                .sqrt(),
            StateValue::Quaternion(q) => q.iter().map(|v| v * v).sum::<f64>().sqrt(),
            StateValue::Vector(v) => v.iter().map(|x| x * x).sum::<f64>().sqrt(),
            scalar => scalar.as_scalar().map(f64::abs).unwrap_or(0.0),
        }
    }
}

/// Time-ordered, sparse samples of one variable.
///
/// Adding a sample at a time that already has one replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    samples: Vec<(i64, StateValue)>,
}

impl Profile {
    /// Creates an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: adds a sample.
    pub fn with_sample(mut self, time_ms: i64, value: StateValue) -> Self {
        self.add(time_ms, value);
        self
    }

    /// Inserts a sample, keeping time order.
    pub fn add(&mut self, time_ms: i64, value: StateValue) {
        match self.samples.binary_search_by_key(&time_ms, |(t, _)| *t) {
            Ok(idx) => self.samples[idx].1 = value,
            Err(idx) => self.samples.insert(idx, (time_ms, value)),
        }
    }

    /// Value in effect at `time_ms` (latest sample at or before it).
    pub fn value_at(&self, time_ms: i64) -> Option<&StateValue> {
        let idx = self.samples.partition_point(|(t, _)| *t <= time_ms);
        idx.checked_sub(1).map(|i| &self.samples[i].1)
    }

    /// Latest sample.
    pub fn last(&self) -> Option<(i64, &StateValue)> {
        self.samples.last().map(|(t, v)| (*t, v))
    }

    /// Maximum scalar value over `[start_ms, end_ms]`.
    ///
    /// Includes the value in effect at `start_ms` plus every sample inside
    /// the window. `None` if nothing scalar is in effect.
    pub fn max_over(&self, start_ms: i64, end_ms: i64) -> Option<f64> {
        let carried = self.value_at(start_ms).and_then(StateValue::as_scalar);
        self.samples
            .iter()
            .filter(|(t, _)| *t > start_ms && *t <= end_ms)
            .filter_map(|(_, v)| v.as_scalar())
            .chain(carried)
            .reduce(f64::max)
    }

    /// Samples in time order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &StateValue)> {
        self.samples.iter().map(|(t, v)| (*t, v))
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Full state of the system: every variable's profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemState {
    profiles: BTreeMap<StateKey, Arc<Profile>>,
}

impl SystemState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: adds an initial sample. The key's kind is taken from `value`.
    pub fn with_value(mut self, name: impl Into<String>, time_ms: i64, value: StateValue) -> Self {
        let key = StateKey::new(name, value.kind());
        self.profile_mut(&key).add(time_ms, value);
        self
    }

    /// Branches this state. Profiles are shared until written.
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Adds a sample, checking the value kind against the key.
    pub fn add_value(
        &mut self,
        key: &StateKey,
        time_ms: i64,
        value: StateValue,
    ) -> Result<(), CapabilityError> {
        if key.kind != value.kind() {
            return Err(CapabilityError::TypeMismatch {
                key: key.name.clone(),
                expected: key.kind,
                found: value.kind(),
            });
        }
        self.profile_mut(key).add(time_ms, value);
        Ok(())
    }

    /// Profile for a key.
    pub fn profile(&self, key: &StateKey) -> Option<&Profile> {
        self.profiles.get(key).map(Arc::as_ref)
    }

    fn profile_mut(&mut self, key: &StateKey) -> &mut Profile {
        Arc::make_mut(self.profiles.entry(key.clone()).or_default())
    }

    /// Latest sample for a key.
    pub fn last_value(&self, key: &StateKey) -> Option<(i64, &StateValue)> {
        self.profile(key).and_then(Profile::last)
    }

    /// Value in effect at a time.
    pub fn value_at(&self, key: &StateKey, time_ms: i64) -> Option<&StateValue> {
        self.profile(key).and_then(|p| p.value_at(time_ms))
    }

    /// Latest value as a scalar, for predicates that require one.
    pub fn last_scalar(&self, key: &StateKey) -> Result<f64, CapabilityError> {
        let (_, value) = self
            .last_value(key)
            .ok_or_else(|| CapabilityError::MissingState(key.name.clone()))?;
        value.as_scalar().ok_or(CapabilityError::TypeMismatch {
            key: key.name.clone(),
            expected: key.kind,
            found: value.kind(),
        })
    }

    /// All keys, ordered by name then kind.
    pub fn keys(&self) -> impl Iterator<Item = &StateKey> {
        self.profiles.keys()
    }

    /// Key/profile pairs, ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &Profile)> {
        self.profiles.iter().map(|(k, p)| (k, p.as_ref()))
    }

    /// Whether a key has a profile.
    pub fn contains(&self, key: &StateKey) -> bool {
        self.profiles.contains_key(key)
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether there are no variables.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
