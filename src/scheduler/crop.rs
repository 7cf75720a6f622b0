//! Population cropping.
//!
//! When the live population grows past `max_schedules`, it is scored and
//! cut back to `crop_to` schedules. One empty (baseline) schedule always
//! survives, so the search can still start fresh branches from the root;
//! the cut therefore keeps the best `crop_to - 1` non-empty schedules plus
//! the baseline, and the result never exceeds `max(crop_to, 1)`.

use std::cmp::Ordering;

use tracing::debug;

use crate::config::SchedulerParams;
use crate::evaluator::Evaluator;
use crate::models::Schedule;

/// Total order used for ranking: score descending, then content hash
/// ascending, then id. Independent of the order schedules were produced in.
pub fn compare_schedules(a: &Schedule, b: &Schedule) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.content_hash().cmp(b.content_hash()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sorts best first. See [`compare_schedules`].
pub fn rank(schedules: &mut [Schedule]) {
    schedules.sort_by(compare_schedules);
}

/// Crops `population` in place if it exceeds `params.max_schedules`.
///
/// Returns the number of schedules discarded. The baseline is appended
/// after the ranked survivors.
pub fn crop_to_max(
    population: &mut Vec<Schedule>,
    evaluator: &dyn Evaluator,
    params: &SchedulerParams,
) -> usize {
    if population.len() <= params.max_schedules {
        return 0;
    }
    let before = population.len();

    let baseline_index = population.iter().position(Schedule::is_empty);
    let baseline = baseline_index.map(|i| population.remove(i));

    for schedule in population.iter_mut() {
        schedule.score = evaluator.evaluate(schedule);
    }
    rank(population);

    let keep = match baseline {
        Some(_) => params.crop_to.saturating_sub(1),
        None => params.crop_to.max(1),
    };
    population.truncate(keep);
    population.extend(baseline);

    let cropped = before - population.len();
    debug!(before, after = population.len(), cropped, "cropped population");
    cropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{FnEvaluator, TargetValueEvaluator};
    use crate::models::{Assignment, Event, SystemState, Target, Task, TaskType};
    use std::sync::Arc;

    fn valued(id: &str, value: f64) -> Schedule {
        let task = Arc::new(
            Task::new(format!("T-{id}"), TaskType::Imaging).with_target(Target::new(id, value)),
        );
        let event = Event::new(SystemState::new())
            .with_assignment("sat1", Assignment::new(Some(task), 0, 10, 0, 10));
        Schedule::root(SystemState::new()).branch(id, event.seal(), 0)
    }

    fn population(values: &[f64]) -> Vec<Schedule> {
        let mut pop: Vec<Schedule> = values
            .iter()
            .enumerate()
            .map(|(i, v)| valued(&format!("0.{}", i + 1), *v))
            .collect();
        pop.push(Schedule::root(SystemState::new()));
        pop
    }

    #[test]
    fn test_no_crop_under_limit() {
        let mut pop = population(&[1.0, 2.0]);
        let params = SchedulerParams::default().with_limits(3, 2);
        assert_eq!(crop_to_max(&mut pop, &TargetValueEvaluator, &params), 0);
        assert_eq!(pop.len(), 3);
    }

    #[test]
    fn test_crop_keeps_best_and_baseline() {
        let mut pop = population(&[1.0, 5.0, 3.0, 4.0, 2.0]);
        let params = SchedulerParams::default().with_limits(4, 3);

        assert_eq!(crop_to_max(&mut pop, &TargetValueEvaluator, &params), 3);
        assert_eq!(pop.len(), 3);
        assert_eq!(pop[0].score, 5.0);
        assert_eq!(pop[1].score, 4.0);
        assert!(pop[2].is_empty());
    }

    #[test]
    fn test_crop_bound() {
        for crop_to in 0..6 {
            let mut pop = population(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
            let params = SchedulerParams::default().with_limits(6, crop_to);
            crop_to_max(&mut pop, &TargetValueEvaluator, &params);
            assert!(pop.len() <= crop_to.max(1), "crop_to={crop_to} len={}", pop.len());
            assert!(pop.iter().any(Schedule::is_empty));
        }
    }

    #[test]
    fn test_ties_broken_by_hash() {
        let flat = FnEvaluator::new(|_| 1.0);
        let params = SchedulerParams::default().with_limits(2, 2);

        let mut forward = population(&[1.0, 2.0, 3.0]);
        let mut backward = forward.clone();
        backward.reverse();

        crop_to_max(&mut forward, &flat, &params);
        crop_to_max(&mut backward, &flat, &params);
        let f: Vec<&str> = forward.iter().map(|s| s.id.as_str()).collect();
        let b: Vec<&str> = backward.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(f, b);
    }

    #[test]
    fn test_rank_order() {
        let mut pop = population(&[2.0, 9.0]);
        for s in pop.iter_mut() {
            s.score = TargetValueEvaluator.evaluate(s);
        }
        rank(&mut pop);
        let scores: Vec<f64> = pop.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![9.0, 2.0, 0.0]);
    }
}
