//! Access providers.
//!
//! Visibility geometry is computed elsewhere; the scheduler asks an
//! [`AccessProvider`] which accesses are open at each step.
//! [`ExhaustiveAccess`] offers every asset every task for the whole step,
//! for systems whose assets can act at any time. [`PregeneratedAccesses`]
//! serves a precomputed list.

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::{Result, SchedulerError};
use crate::models::{Access, Asset, Task};

/// Source of access windows.
pub trait AccessProvider: Send + Sync + Debug {
    /// Accesses open during `[time_ms, time_ms + step_ms)`.
    fn available_accesses(
        &self,
        assets: &[Asset],
        tasks: &[Arc<Task>],
        time_ms: i64,
        step_ms: i64,
    ) -> Vec<Access>;

    /// Checks the provider's data once, before the first step.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Every asset can perform every task over the whole step.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustiveAccess {
    include_idle: bool,
}

impl ExhaustiveAccess {
    /// Creates a provider without idle accesses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also offers each asset an idle access.
    pub fn with_idle(mut self) -> Self {
        self.include_idle = true;
        self
    }
}

impl AccessProvider for ExhaustiveAccess {
    fn available_accesses(
        &self,
        assets: &[Asset],
        tasks: &[Arc<Task>],
        time_ms: i64,
        step_ms: i64,
    ) -> Vec<Access> {
        let end_ms = time_ms + step_ms;
        let per_asset = tasks.len() + usize::from(self.include_idle);
        let mut out = Vec::with_capacity(assets.len() * per_asset);
        for asset in assets {
            out.extend(
                tasks
                    .iter()
                    .map(|t| Access::new(asset.id.clone(), Arc::clone(t), time_ms, end_ms)),
            );
            if self.include_idle {
                out.push(Access::idle(asset.id.clone(), time_ms, end_ms));
            }
        }
        out
    }
}

/// Serves accesses computed ahead of time, filtered to those overlapping
/// the current step.
#[derive(Debug, Clone, Default)]
pub struct PregeneratedAccesses {
    accesses: Vec<Access>,
}

impl PregeneratedAccesses {
    /// Wraps a precomputed list.
    pub fn new(accesses: Vec<Access>) -> Self {
        Self { accesses }
    }

    /// All accesses.
    pub fn accesses(&self) -> &[Access] {
        &self.accesses
    }
}

impl AccessProvider for PregeneratedAccesses {
    fn available_accesses(
        &self,
        _assets: &[Asset],
        _tasks: &[Arc<Task>],
        time_ms: i64,
        step_ms: i64,
    ) -> Vec<Access> {
        self.accesses
            .iter()
            .filter(|a| a.overlaps(time_ms, time_ms + step_ms))
            .cloned()
            .collect()
    }

    /// Fails on the first malformed access, whether or not any step would
    /// ever serve it.
    fn validate(&self) -> Result<()> {
        match self.accesses.iter().find(|a| !a.is_well_formed()) {
            Some(a) => Err(SchedulerError::MalformedAccess {
                asset_id: a.asset_id.clone(),
                start_ms: a.start_ms,
                end_ms: a.end_ms,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskType;

    fn tasks() -> Vec<Arc<Task>> {
        vec![
            Arc::new(Task::new("T1", TaskType::Imaging)),
            Arc::new(Task::new("T2", TaskType::Comm)),
        ]
    }

    #[test]
    fn test_exhaustive() {
        let assets = vec![Asset::new("sat1"), Asset::new("sat2")];
        let plain = ExhaustiveAccess::new().available_accesses(&assets, &tasks(), 0, 1000);
        assert_eq!(plain.len(), 4);
        assert!(plain.iter().all(|a| a.start_ms == 0 && a.end_ms == 1000));
        assert!(plain.iter().all(|a| !a.is_idle()));

        let idle = ExhaustiveAccess::new()
            .with_idle()
            .available_accesses(&assets, &tasks(), 0, 1000);
        assert_eq!(idle.len(), 6);
        assert_eq!(idle.iter().filter(|a| a.is_idle()).count(), 2);
    }

    #[test]
    fn test_pregenerated_filters_by_step() {
        let t = tasks();
        let provider = PregeneratedAccesses::new(vec![
            Access::new("sat1", t[0].clone(), 0, 5000),
            Access::new("sat1", t[1].clone(), 4000, 20_000),
            Access::new("sat2", t[0].clone(), 30_000, 40_000),
        ]);

        assert_eq!(provider.available_accesses(&[], &t, 0, 3000).len(), 1);
        assert_eq!(provider.available_accesses(&[], &t, 3000, 3000).len(), 2);
        assert_eq!(provider.available_accesses(&[], &t, 20_000, 10_000).len(), 0);
        assert_eq!(provider.accesses().len(), 3);
        assert!(provider.validate().is_ok());
    }

    #[test]
    fn test_pregenerated_rejects_malformed() {
        let t = tasks();
        let provider = PregeneratedAccesses::new(vec![
            Access::new("sat1", t[0].clone(), 0, 5000),
            Access::new("sat2", t[1].clone(), 90_000, 80_000),
        ]);
        // Never served by any step, still reported.
        assert_eq!(provider.available_accesses(&[], &t, 0, 60_000).len(), 1);
        assert!(matches!(
            provider.validate(),
            Err(SchedulerError::MalformedAccess { asset_id, .. }) if asset_id == "sat2"
        ));
        assert!(ExhaustiveAccess::new().validate().is_ok());
    }
}
