//! Schedule scoring.
//!
//! The search is agnostic to how schedules are valued; it only needs a
//! number where higher is better. [`TargetValueEvaluator`] sums the value
//! of every target served; [`FnEvaluator`] adapts a closure.

use std::fmt;
use std::sync::Arc;

use crate::models::Schedule;

/// Scores a schedule. Higher is better.
///
/// Implementations must be deterministic and free of side effects on
/// shared state; the scheduler may call them any number of times.
pub trait Evaluator: Send + Sync + fmt::Debug {
    /// Score of `schedule`.
    fn evaluate(&self, schedule: &Schedule) -> f64;
}

/// Sum of target values over every task performed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetValueEvaluator;

impl Evaluator for TargetValueEvaluator {
    fn evaluate(&self, schedule: &Schedule) -> f64 {
        schedule
            .history()
            .events()
            .iter()
            .flat_map(|e| e.tasks())
            .map(|t| t.value())
            .sum()
    }
}

/// Closure adapter.
#[derive(Clone)]
pub struct FnEvaluator {
    f: Arc<dyn Fn(&Schedule) -> f64 + Send + Sync>,
}

impl FnEvaluator {
    /// Wraps a closure.
    pub fn new(f: impl Fn(&Schedule) -> f64 + Send + Sync + 'static) -> Self {
        Self { f: Arc::new(f) }
    }
}

impl fmt::Debug for FnEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEvaluator").finish_non_exhaustive()
    }
}

impl Evaluator for FnEvaluator {
    fn evaluate(&self, schedule: &Schedule) -> f64 {
        (self.f)(schedule)
    }
}
