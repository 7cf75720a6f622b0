//! Scenario parameters.
//!
//! [`SchedulerParams`] deserializes from any serde format; missing fields
//! take their defaults. Times are milliseconds; [`SchedulerParams::from_seconds`]
//! converts scenario files that count in seconds.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};

/// Search horizon and population limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerParams {
    /// First step time (ms).
    pub sim_start_ms: i64,
    /// The loop runs while `current < sim_end_ms`.
    pub sim_end_ms: i64,
    /// Step length (ms).
    pub step_ms: i64,
    /// Population size that triggers cropping.
    pub max_schedules: usize,
    /// Population size cropping reduces to, baseline included.
    pub crop_to: usize,
    /// Extend each returned schedule's last event to `sim_end_ms`.
    pub extend_to_end: bool,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            sim_start_ms: 0,
            sim_end_ms: 60_000,
            step_ms: 12_000,
            max_schedules: 10,
            crop_to: 5,
            extend_to_end: false,
        }
    }
}

impl SchedulerParams {
    /// Creates parameters over `[start_ms, end_ms)` with the given step.
    pub fn new(sim_start_ms: i64, sim_end_ms: i64, step_ms: i64) -> Self {
        Self {
            sim_start_ms,
            sim_end_ms,
            step_ms,
            ..Default::default()
        }
    }

    /// Creates parameters from times in seconds, rounded to the nearest ms.
    pub fn from_seconds(start_s: f64, end_s: f64, step_s: f64) -> Self {
        let ms = |s: f64| (s * 1000.0).round() as i64;
        Self::new(ms(start_s), ms(end_s), ms(step_s))
    }

    /// Sets the population limits.
    pub fn with_limits(mut self, max_schedules: usize, crop_to: usize) -> Self {
        self.max_schedules = max_schedules;
        self.crop_to = crop_to;
        self
    }

    /// Enables extension of final events to the end of the run.
    pub fn with_extend_to_end(mut self, extend: bool) -> Self {
        self.extend_to_end = extend;
        self
    }

    /// Number of steps the loop will run.
    pub fn step_count(&self) -> usize {
        if self.step_ms <= 0 || self.sim_end_ms <= self.sim_start_ms {
            return 0;
        }
        let span = self.sim_end_ms - self.sim_start_ms;
        ((span + self.step_ms - 1) / self.step_ms) as usize
    }

    /// Checks that the parameters can drive a search.
    pub fn validate(&self) -> Result<()> {
        if self.step_ms <= 0 {
            return Err(SchedulerError::InvalidParameters(format!(
                "step must be positive, got {} ms",
                self.step_ms
            )));
        }
        if self.sim_end_ms < self.sim_start_ms {
            return Err(SchedulerError::InvalidParameters(format!(
                "end {} ms precedes start {} ms",
                self.sim_end_ms, self.sim_start_ms
            )));
        }
        if self.max_schedules == 0 {
            return Err(SchedulerError::InvalidParameters(
                "max_schedules must be at least 1".into(),
            ));
        }
        if self.crop_to > self.max_schedules {
            return Err(SchedulerError::InvalidParameters(format!(
                "crop_to ({}) exceeds max_schedules ({})",
                self.crop_to, self.max_schedules
            )));
        }
        Ok(())
    }
}
