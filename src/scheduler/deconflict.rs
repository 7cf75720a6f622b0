//! Candidate generation and time deconfliction.
//!
//! # Algorithm
//!
//! 1. Group the open accesses by asset and take the cartesian product,
//!    one access per asset ([`generate_combinations`]).
//! 2. For every surviving schedule × combination, reject combinations that
//!    would start an asset that is still busy or push a task past its
//!    repetition limit ([`can_add_tasks`]).
//! 3. Turn each accepted combination into a proposed [`Event`] over the
//!    step window ([`build_event`]).
//!
//! # Complexity
//! The product has `Π_a |accesses(a)|` members, i.e. `(tasks + 1)^assets`
//! with exhaustive access and idle enabled.

use std::collections::BTreeMap;

use tracing::debug;

use super::SearchContext;
use crate::checker::Candidate;
use crate::error::{Result, SchedulerError};
use crate::models::{Access, Assignment, Asset, Event, Schedule, StateHistory, Task};

/// Cartesian product of open accesses, one per asset.
///
/// Assets are visited in the given order; assets with no open access are
/// left out of every combination. Returns an empty list when no asset has
/// an access. Accesses for unknown assets are ignored.
pub fn generate_combinations(assets: &[Asset], accesses: &[Access]) -> Vec<Vec<Access>> {
    let groups: Vec<Vec<&Access>> = assets
        .iter()
        .map(|asset| {
            accesses
                .iter()
                .filter(|a| a.asset_id == asset.id)
                .collect::<Vec<_>>()
        })
        .filter(|group| !group.is_empty())
        .collect();

    if groups.is_empty() {
        return Vec::new();
    }

    let mut combos: Vec<Vec<Access>> = vec![Vec::with_capacity(groups.len())];
    for group in &groups {
        let mut next = Vec::with_capacity(combos.len() * group.len());
        for prefix in &combos {
            for access in group {
                let mut combo = prefix.clone();
                combo.push((*access).clone());
                next.push(combo);
            }
        }
        combos = next;
    }
    combos
}

/// Whether `candidate` may be appended to `history` at `current_ms`.
///
/// Rejects when any asset's most recent event ends after `current_ms`, or
/// when any task would exceed its `max_times_to_perform` counting both past
/// events and this candidate. Idle accesses never count. Pure.
pub fn can_add_tasks(history: &StateHistory, candidate: &[Access], current_ms: i64) -> bool {
    for access in candidate {
        let busy_until = history
            .last_event_for(&access.asset_id)
            .and_then(|e| e.assignment(&access.asset_id))
            .map(|a| a.event_end_ms);
        if busy_until.is_some_and(|end| end > current_ms) {
            return false;
        }
    }

    let mut counts: BTreeMap<&str, (&Task, usize)> = BTreeMap::new();
    for task in candidate.iter().filter_map(|a| a.task.as_deref()) {
        counts.entry(task.id.as_str()).or_insert((task, 0)).1 += 1;
    }
    counts.values().all(|(task, new)| {
        history.times_completed(&task.id) + new <= task.max_times_to_perform as usize
    })
}

/// Checks that an access is well formed and overlaps `[current_ms, current_ms + step_ms]`.
pub fn check_access(access: &Access, current_ms: i64, step_ms: i64) -> Result<()> {
    if !access.is_well_formed() {
        return Err(SchedulerError::MalformedAccess {
            asset_id: access.asset_id.clone(),
            start_ms: access.start_ms,
            end_ms: access.end_ms,
        });
    }
    let event_end_ms = current_ms + step_ms;
    if access.end_ms <= current_ms || access.start_ms >= event_end_ms {
        return Err(SchedulerError::AccessOutsideEvent {
            asset_id: access.asset_id.clone(),
            start_ms: access.start_ms,
            end_ms: access.end_ms,
            event_start_ms: current_ms,
            event_end_ms,
        });
    }
    Ok(())
}

/// Builds the proposed event for `candidate` over `[current_ms, current_ms + step_ms]`.
///
/// Task times are the access window clipped to the step; idle accesses get
/// a zero-length task at `current_ms`. The event state is a fork of the
/// history's last state.
pub fn build_event(
    history: &StateHistory,
    candidate: &[Access],
    current_ms: i64,
    step_ms: i64,
) -> Result<Event> {
    let event_end_ms = current_ms + step_ms;
    let mut event = Event::new(history.last_state().fork());
    for access in candidate {
        check_access(access, current_ms, step_ms)?;
        let (task_start_ms, task_end_ms) = if access.is_idle() {
            (current_ms, current_ms)
        } else {
            (
                access.start_ms.max(current_ms),
                access.end_ms.min(event_end_ms),
            )
        };
        event.assign(
            access.asset_id.clone(),
            Assignment::new(
                access.task.clone(),
                current_ms,
                event_end_ms,
                task_start_ms,
                task_end_ms,
            ),
        );
    }
    Ok(event)
}

/// Expands every schedule by every combination that passes [`can_add_tasks`].
///
/// Returns the candidates and how many pairs were rejected.
pub fn time_deconfliction<'a>(
    population: &'a [Schedule],
    combinations: &[Vec<Access>],
    ctx: &mut SearchContext,
) -> Result<(Vec<Candidate<'a>>, usize)> {
    let mut candidates = Vec::new();
    let mut rejected = 0;
    for schedule in population {
        for combo in combinations {
            if !can_add_tasks(schedule.history(), combo, ctx.current_time_ms) {
                rejected += 1;
                continue;
            }
            let event = build_event(schedule.history(), combo, ctx.current_time_ms, ctx.step_ms)?;
            let id = ctx.next_child_id(&schedule.id);
            candidates.push(Candidate::new(id, schedule, event));
        }
    }
    debug!(
        step = ctx.step,
        candidates = candidates.len(),
        rejected,
        "time deconfliction"
    );
    Ok((candidates, rejected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SystemState, TaskType};
    use std::sync::Arc;

    fn task(id: &str, max: u32) -> Arc<Task> {
        Arc::new(Task::new(id, TaskType::Imaging).with_max_times(max))
    }

    fn assets(ids: &[&str]) -> Vec<Asset> {
        ids.iter().map(|id| Asset::new(*id)).collect()
    }

    fn history_with(candidate: &[Access], current: i64, step: i64) -> StateHistory {
        let root = StateHistory::new(SystemState::new());
        let event = build_event(&root, candidate, current, step).unwrap();
        root.branch(event.seal())
    }

    #[test]
    fn test_combinations_product() {
        let t1 = task("T1", 1);
        let t2 = task("T2", 1);
        let accesses = vec![
            Access::new("sat1", t1.clone(), 0, 10),
            Access::new("sat1", t2.clone(), 0, 10),
            Access::idle("sat1", 0, 10),
            Access::new("sat2", t1, 0, 10),
            Access::idle("sat2", 0, 10),
        ];
        let combos = generate_combinations(&assets(&["sat1", "sat2"]), &accesses);
        assert_eq!(combos.len(), 6);
        assert!(combos.iter().all(|c| c.len() == 2));
        assert!(combos.iter().all(|c| c[0].asset_id == "sat1" && c[1].asset_id == "sat2"));
    }

    #[test]
    fn test_combinations_skip_assets_without_access() {
        let accesses = vec![Access::new("sat2", task("T1", 1), 0, 10)];
        let combos = generate_combinations(&assets(&["sat1", "sat2", "sat3"]), &accesses);
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0].len(), 1);

        assert!(generate_combinations(&assets(&["sat1"]), &[]).is_empty());
        assert!(generate_combinations(&[], &accesses).is_empty());
    }

    #[test]
    fn test_repetition_limit() {
        let t = task("T1", 1);
        let root = StateHistory::default();
        assert!(can_add_tasks(&root, &[Access::new("sat1", t.clone(), 0, 10)], 0));

        // Two assets taking the same task at once exceeds the cap.
        let double = [
            Access::new("sat1", t.clone(), 0, 10),
            Access::new("sat2", t.clone(), 0, 10),
        ];
        assert!(!can_add_tasks(&root, &double, 0));

        // Already performed once.
        let h = history_with(&[Access::new("sat1", t.clone(), 0, 10)], 0, 10);
        assert!(!can_add_tasks(&h, &[Access::new("sat2", t.clone(), 10, 20)], 10));
        assert!(can_add_tasks(&h, &[Access::idle("sat1", 10, 20)], 10));
    }

    #[test]
    fn test_zero_cap_never_addable() {
        let t = task("T0", 0);
        assert!(!can_add_tasks(
            &StateHistory::default(),
            &[Access::new("sat1", t, 0, 10)],
            0
        ));
    }

    #[test]
    fn test_busy_asset() {
        let t = task("T1", 5);
        let h = history_with(&[Access::new("sat1", t.clone(), 0, 10)], 0, 10);
        // Event runs to 10: busy before, free at 10.
        assert!(!can_add_tasks(&h, &[Access::idle("sat1", 5, 10)], 5));
        assert!(can_add_tasks(&h, &[Access::idle("sat1", 10, 20)], 10));
        // Other assets are unaffected.
        assert!(can_add_tasks(&h, &[Access::new("sat2", t, 5, 10)], 5));
    }

    #[test]
    fn test_can_add_tasks_is_pure() {
        let t = task("T1", 2);
        let h = history_with(&[Access::new("sat1", t.clone(), 0, 10)], 0, 10);
        let candidate = [Access::new("sat1", t.clone(), 10, 20), Access::idle("sat2", 10, 20)];
        let first = can_add_tasks(&h, &candidate, 10);
        for _ in 0..10 {
            assert_eq!(can_add_tasks(&h, &candidate, 10), first);
        }
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_build_event_clips_to_step() {
        let t = task("T1", 1);
        let root = StateHistory::default();
        let event = build_event(
            &root,
            &[
                Access::new("sat1", t.clone(), 500, 3000),
                Access::new("sat2", t.clone(), 1200, 1800),
                Access::idle("sat3", 0, 5000),
            ],
            1000,
            1000,
        )
        .unwrap();

        let a1 = event.assignment("sat1").unwrap();
        assert_eq!((a1.task_start_ms, a1.task_end_ms), (1000, 2000));
        assert_eq!((a1.event_start_ms, a1.event_end_ms), (1000, 2000));
        let a2 = event.assignment("sat2").unwrap();
        assert_eq!((a2.task_start_ms, a2.task_end_ms), (1200, 1800));
        let a3 = event.assignment("sat3").unwrap();
        assert_eq!((a3.task_start_ms, a3.task_end_ms), (1000, 1000));
        assert!(["sat1", "sat2", "sat3"].iter().all(|a| event.check_bounds(a)));
    }

    #[test]
    fn test_build_event_rejects_bad_access() {
        let t = task("T1", 1);
        let root = StateHistory::default();
        assert!(matches!(
            build_event(&root, &[Access::new("sat1", t.clone(), 500, 500)], 0, 1000),
            Err(SchedulerError::MalformedAccess { .. })
        ));
        assert!(matches!(
            build_event(&root, &[Access::new("sat1", t.clone(), 2000, 3000)], 0, 1000),
            Err(SchedulerError::AccessOutsideEvent { .. })
        ));
        assert!(matches!(
            build_event(&root, &[Access::new("sat1", t, 0, 1000)], 1000, 1000),
            Err(SchedulerError::AccessOutsideEvent { .. })
        ));
    }

    #[test]
    fn test_time_deconfliction_ids() {
        let t = task("T1", 1);
        let population = vec![Schedule::root(SystemState::new())];
        let combos = vec![
            vec![Access::new("sat1", t.clone(), 0, 10)],
            vec![Access::idle("sat1", 0, 10)],
        ];
        let mut ctx = SearchContext::new(0, 10);
        let (candidates, rejected) = time_deconfliction(&population, &combos, &mut ctx).unwrap();
        assert_eq!(rejected, 0);
        let ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["0.1", "0.2"]);
    }
}
