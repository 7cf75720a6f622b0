//! Feasibility checker.
//!
//! Walks the capability graph for one proposed event. Each node moves
//! through [`NodeStatus`]: `Unevaluated → Evaluating → Passed | Failed`.
//! A node's predicate runs only after all of its dependencies passed; the
//! first failure short-circuits the whole check. The status table lives in
//! an [`EvaluationPass`] created fresh for every call, so checks of
//! different candidates never observe each other.
//!
//! Predicate errors are contained: they are logged and count as a failure
//! of that node for that event only.

use tracing::{debug, warn};

use crate::capability::CapabilityNode;
use crate::error::{Result, SchedulerError};
use crate::models::{Event, Schedule};
use crate::system::System;

/// Evaluation state of one capability node within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Unevaluated,
    Evaluating,
    Passed,
    Failed,
}

/// Per-check memo of node statuses, indexed like the capability graph.
#[derive(Debug, Clone)]
pub struct EvaluationPass {
    status: Vec<NodeStatus>,
}

impl EvaluationPass {
    /// All nodes unevaluated.
    pub fn new(node_count: usize) -> Self {
        Self {
            status: vec![NodeStatus::Unevaluated; node_count],
        }
    }

    /// Status of a node.
    pub fn status(&self, index: usize) -> NodeStatus {
        self.status
            .get(index)
            .copied()
            .unwrap_or(NodeStatus::Unevaluated)
    }

    fn set(&mut self, index: usize, status: NodeStatus) {
        if let Some(slot) = self.status.get_mut(index) {
            *slot = status;
        }
    }

    /// Number of nodes whose predicate ran (passed or failed).
    pub fn evaluated_count(&self) -> usize {
        self.status
            .iter()
            .filter(|s| matches!(s, NodeStatus::Passed | NodeStatus::Failed))
            .count()
    }
}

/// A proposed child: a parent schedule plus the event that would extend it.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    /// Lineage id the child will carry.
    pub id: String,
    /// Schedule being extended.
    pub parent: &'a Schedule,
    /// Proposed event. Predicates mutate its state during the check.
    pub event: Event,
}

impl<'a> Candidate<'a> {
    /// Creates a candidate.
    pub fn new(id: impl Into<String>, parent: &'a Schedule, event: Event) -> Self {
        Self {
            id: id.into(),
            parent,
            event,
        }
    }

    /// Seals the event and branches the parent.
    pub fn seal(self, step: usize) -> Schedule {
        self.parent.branch(self.id, self.event.seal(), step)
    }
}

/// Checks one node, recursing into unevaluated dependencies first.
///
/// Nodes whose asset has no assignment in `event` pass without running.
/// Fails with [`SchedulerError::UnknownNode`] on a dangling dependency or an
/// index outside the graph.
pub fn check_dependent(
    system: &System,
    index: usize,
    event: &mut Event,
    pass: &mut EvaluationPass,
) -> Result<bool> {
    match pass.status(index) {
        NodeStatus::Passed => return Ok(true),
        NodeStatus::Failed | NodeStatus::Evaluating => return Ok(false),
        NodeStatus::Unevaluated => {}
    }
    let graph = &system.capabilities;
    let node = graph
        .nodes()
        .get(index)
        .ok_or_else(|| SchedulerError::UnknownNode(format!("#{index}")))?;

    if !event.contains(&node.asset_id) {
        pass.set(index, NodeStatus::Passed);
        return Ok(true);
    }
    pass.set(index, NodeStatus::Evaluating);

    for dep in &node.dependencies {
        let dep_index = graph
            .index_of(dep)
            .ok_or_else(|| SchedulerError::UnknownNode(dep.clone()))?;
        let passed = match pass.status(dep_index) {
            NodeStatus::Unevaluated => check_dependent(system, dep_index, event, pass)?,
            NodeStatus::Passed => true,
            NodeStatus::Failed | NodeStatus::Evaluating => false,
        };
        if !passed {
            debug!(node = %node.id, dependency = %dep, "dependency failed");
            pass.set(index, NodeStatus::Failed);
            return Ok(false);
        }
    }

    let passed = run_predicate(system, node, event);
    pass.set(
        index,
        if passed {
            NodeStatus::Passed
        } else {
            NodeStatus::Failed
        },
    );
    Ok(passed)
}

fn run_predicate(system: &System, node: &CapabilityNode, event: &mut Event) -> bool {
    let passed = match node
        .predicate
        .can_perform(&node.asset_id, event, &system.environment)
    {
        Ok(passed) => passed,
        Err(e) => {
            warn!(node = %node.id, asset = %node.asset_id, error = %e, "capability predicate failed");
            false
        }
    };
    if passed && !event.all_within_bounds() {
        warn!(
            node = %node.id,
            asset = %node.asset_id,
            "capability moved task times outside the event window"
        );
        return false;
    }
    passed
}

/// Checks a proposed event against the whole system.
///
/// Nodes referenced by constraints run first, then the rest in graph order;
/// the first failing node fails the event. If every node passes, each
/// constraint is applied to the maximum of its variable over the owning
/// asset's event window. An event with no assignments is trivially
/// feasible.
pub fn check_event(system: &System, event: &mut Event) -> Result<bool> {
    if event.is_empty() {
        return Ok(true);
    }
    let graph = &system.capabilities;
    let mut pass = EvaluationPass::new(graph.len());

    let mut constrained = Vec::with_capacity(system.constraints.len());
    for c in &system.constraints {
        let index = graph
            .index_of(&c.node_id)
            .ok_or_else(|| SchedulerError::UnknownNode(c.node_id.clone()))?;
        if !constrained.contains(&index) {
            constrained.push(index);
        }
    }
    let rest = (0..graph.len()).filter(|i| !constrained.contains(i));
    let order: Vec<usize> = constrained.iter().copied().chain(rest).collect();

    for index in order {
        if pass.status(index) == NodeStatus::Unevaluated
            && !check_dependent(system, index, event, &mut pass)?
        {
            return Ok(false);
        }
    }

    for c in &system.constraints {
        let asset_id = graph
            .get(&c.node_id)
            .map(|n| n.asset_id.as_str())
            .unwrap_or_default();
        let window = match event.assignment(asset_id) {
            Some(a) => Some((a.event_start_ms, a.event_end_ms)),
            None => event.event_start_ms().zip(event.event_end_ms()),
        };
        let max = window.and_then(|(start, end)| {
            event
                .state()
                .profile(&c.key)
                .and_then(|p| p.max_over(start, end))
        });
        match max {
            Some(value) if c.accepts(value) => {}
            Some(value) => {
                debug!(constraint = %c.name, value, threshold = c.threshold, "constraint violated");
                return Ok(false);
            }
            None => {
                debug!(constraint = %c.name, variable = %c.key.name, "constraint variable has no data");
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Checks a candidate's proposed event. See [`check_event`].
pub fn check_schedule(system: &System, candidate: &mut Candidate<'_>) -> Result<bool> {
    check_event(system, &mut candidate.event)
}

/// Runs every participating node's `can_extend` on `event`.
///
/// Returns `false` if any node refused or errored; all nodes still run.
pub fn extend_event(system: &System, event: &mut Event, to_ms: i64) -> bool {
    let mut extended = true;
    for node in system.capabilities.nodes() {
        if !event.contains(&node.asset_id) {
            continue;
        }
        match node
            .predicate
            .can_extend(&node.asset_id, event, &system.environment, to_ms)
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(node = %node.id, to_ms, "cannot extend to end of run");
                extended = false;
            }
            Err(e) => {
                warn!(node = %node.id, to_ms, error = %e, "cannot extend to end of run");
                extended = false;
            }
        }
    }
    extended
}

/// Extends a schedule's final event to `to_ms`.
///
/// Returns the extended copy and whether every node accepted. The content
/// hash is unchanged because task times are not touched. Empty schedules
/// are returned as is.
pub fn extend_schedule(system: &System, schedule: &Schedule, to_ms: i64) -> (Schedule, bool) {
    let Some(last) = schedule.history().last_event() else {
        return (schedule.clone(), true);
    };
    let mut event = Event::clone(last);
    let extended = extend_event(system, &mut event, to_ms);

    let history = schedule.history().replace_last(event.seal());
    let mut out =
        Schedule::from_history(schedule.id.clone(), history).with_name(schedule.name.clone());
    out.score = schedule.score;
    out.step = schedule.step;
    (out, extended)
}
