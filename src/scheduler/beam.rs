//! Time-stepped beam search over schedule trees.
//!
//! # Algorithm
//!
//! Starting from a single empty schedule, for each step while
//! `current < sim_end`:
//!
//! 1. Crop the population if it exceeds `max_schedules`.
//! 2. Ask the access provider which accesses are open and take their
//!    cartesian product.
//! 3. Expand every schedule by every combination that passes time
//!    deconfliction.
//! 4. Keep the candidates the feasibility checker accepts.
//! 5. Score and rank the new generation.
//! 6. Prepend it to the population. Older schedules stay; each schedule is
//!    a full path from the root.
//!
//! After the last step the population is cropped once more, rescored, and
//! returned best first.
//!
//! # Complexity
//! Per step O(P × C × N) where P = population (bounded by `max_schedules`),
//! C = combinations, N = capability nodes.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::crop::{crop_to_max, rank};
use super::deconflict::{check_access, generate_combinations, time_deconfliction};
use super::{AccessProvider, CancelToken, ExhaustiveAccess, SearchContext};
use crate::checker::{check_schedule, extend_schedule};
use crate::config::SchedulerParams;
use crate::error::{Result, SchedulerError};
use crate::evaluator::Evaluator;
use crate::hashing::HashAuditLog;
use crate::models::{Schedule, SystemState, Task};
use crate::system::System;
use crate::validation;

/// Counters for one step of the search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepStats {
    /// Step index.
    pub step: usize,
    /// Step start (ms).
    pub time_ms: i64,
    /// Schedules removed by cropping at the start of the step.
    pub cropped: usize,
    /// Access combinations generated.
    pub combinations: usize,
    /// Schedule × combination pairs that passed deconfliction.
    pub candidates: usize,
    /// Pairs rejected by deconfliction.
    pub rejected_by_deconfliction: usize,
    /// Candidates rejected by the feasibility checker.
    pub rejected_by_checker: usize,
    /// New schedules added.
    pub generated: usize,
    /// Schedules carried over from earlier steps.
    pub carried_over: usize,
}

/// Beam-search scheduler.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use u_mission::capability::{builtin::AlwaysFeasible, CapabilityNode};
/// use u_mission::config::SchedulerParams;
/// use u_mission::evaluator::TargetValueEvaluator;
/// use u_mission::models::{Asset, SystemState, Target, Task, TaskType};
/// use u_mission::scheduler::Scheduler;
/// use u_mission::system::System;
///
/// let system = System::new()
///     .with_asset(Asset::new("sat1"))
///     .with_node(CapabilityNode::new("sat1.bus", "sat1", AlwaysFeasible));
/// let tasks = vec![Arc::new(
///     Task::new("T1", TaskType::Imaging).with_target(Target::new("seoul", 3.0)),
/// )];
///
/// let mut scheduler = Scheduler::new(SchedulerParams::new(0, 36_000, 12_000), TargetValueEvaluator);
/// let schedules = scheduler
///     .generate_schedules(&system, &tasks, SystemState::new())
///     .unwrap();
/// assert_eq!(schedules[0].score, 3.0);
/// ```
#[derive(Debug)]
pub struct Scheduler {
    params: SchedulerParams,
    evaluator: Arc<dyn Evaluator>,
    access_provider: Arc<dyn AccessProvider>,
    cancel: Option<CancelToken>,
    audit: Option<Arc<HashAuditLog>>,
    stats: Vec<StepStats>,
}

impl Scheduler {
    /// Creates a scheduler with exhaustive access and no idle option.
    pub fn new(params: SchedulerParams, evaluator: impl Evaluator + 'static) -> Self {
        Self {
            params,
            evaluator: Arc::new(evaluator),
            access_provider: Arc::new(ExhaustiveAccess::new()),
            cancel: None,
            audit: None,
            stats: Vec::new(),
        }
    }

    /// Sets the access provider.
    pub fn with_access_provider(mut self, provider: impl AccessProvider + 'static) -> Self {
        self.access_provider = Arc::new(provider);
        self
    }

    /// Sets a cancellation token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Records hashes of every generation to `log`.
    pub fn with_audit_log(mut self, log: Arc<HashAuditLog>) -> Self {
        self.audit = Some(log);
        self
    }

    /// Parameters.
    pub fn params(&self) -> &SchedulerParams {
        &self.params
    }

    /// Per-step counters from the last run.
    pub fn stats(&self) -> &[StepStats] {
        &self.stats
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Runs the search and returns every surviving schedule, best first.
    ///
    /// # Errors
    /// Invalid parameters, a system that fails validation, duplicate task
    /// ids, or a malformed access from the provider.
    pub fn generate_schedules(
        &mut self,
        system: &System,
        tasks: &[Arc<Task>],
        initial_state: SystemState,
    ) -> Result<Vec<Schedule>> {
        self.params.validate()?;
        system.validate()?;
        validation::validate_tasks(tasks).map_err(SchedulerError::Validation)?;
        self.access_provider.validate()?;

        self.stats.clear();
        let evaluator = Arc::clone(&self.evaluator);
        let mut ctx = SearchContext::new(self.params.sim_start_ms, self.params.step_ms);
        let mut population = vec![Schedule::root(initial_state)];

        while ctx.current_time_ms < self.params.sim_end_ms {
            if self.is_cancelled() {
                info!(step = ctx.step, "search cancelled");
                break;
            }
            let cropped = crop_to_max(&mut population, evaluator.as_ref(), &self.params);

            let accesses = self.access_provider.available_accesses(
                &system.assets,
                tasks,
                ctx.current_time_ms,
                ctx.step_ms,
            );
            for access in &accesses {
                check_access(access, ctx.current_time_ms, ctx.step_ms)?;
            }
            let combinations = generate_combinations(&system.assets, &accesses);

            let (candidates, rejected_by_deconfliction) =
                time_deconfliction(&population, &combinations, &mut ctx)?;
            let candidate_count = candidates.len();

            let mut generation = Vec::with_capacity(candidate_count);
            let mut rejected_by_checker = 0;
            for mut candidate in candidates {
                if check_schedule(system, &mut candidate)? {
                    generation.push(candidate.seal(ctx.step));
                } else {
                    debug!(id = %candidate.id, "candidate infeasible");
                    rejected_by_checker += 1;
                }
            }

            for schedule in generation.iter_mut() {
                schedule.score = evaluator.evaluate(schedule);
            }
            rank(&mut generation);
            if let Some(log) = &self.audit {
                log.record(ctx.step, "EvalAll", generation.iter().map(Schedule::content_hash));
            }

            let stats = StepStats {
                step: ctx.step,
                time_ms: ctx.current_time_ms,
                cropped,
                combinations: combinations.len(),
                candidates: candidate_count,
                rejected_by_deconfliction,
                rejected_by_checker,
                generated: generation.len(),
                carried_over: population.len(),
            };

            for schedule in population.iter_mut() {
                ctx.pad_lineage(&mut schedule.id);
            }
            generation.append(&mut population);
            population = generation;

            info!(
                step = stats.step,
                time_ms = stats.time_ms,
                generated = stats.generated,
                carried_over = stats.carried_over,
                population = population.len(),
                "step complete"
            );
            self.stats.push(stats);
            ctx.advance();
        }

        crop_to_max(&mut population, evaluator.as_ref(), &self.params);
        if self.params.extend_to_end {
            population = population
                .iter()
                .map(|s| extend_schedule(system, s, self.params.sim_end_ms).0)
                .collect();
        }
        for schedule in population.iter_mut() {
            schedule.score = evaluator.evaluate(schedule);
        }
        rank(&mut population);
        if let Some(log) = &self.audit {
            log.record(ctx.step, "Final", population.iter().map(Schedule::content_hash));
        }
        Ok(population)
    }
}
