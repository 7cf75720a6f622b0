//! Capability nodes and the capability graph.
//!
//! A capability node models one subsystem of one asset (power, camera,
//! antenna) as a feasibility predicate over a proposed [`Event`]. Nodes may
//! depend on other nodes; a node's predicate only runs once all of its
//! dependencies have passed for the same event. The dependency edges must
//! form a DAG, which [`crate::validation::validate_system`] checks before
//! any search starts.
//!
//! Predicates implement [`Capability`]. Built-in predicates live in
//! [`builtin`]; anything else (user models, closures) plugs in through the
//! same trait.

pub mod builtin;

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::CapabilityError;
use crate::models::Event;
use crate::system::Environment;

/// A feasibility predicate for one subsystem.
///
/// Predicates read the proposed event's state and may write new samples to
/// it. They may also adjust the asset's task/event times, as long as the
/// result stays inside the event window; the checker rejects the event
/// otherwise.
pub trait Capability: Send + Sync + Debug {
    /// Predicate name (e.g., "power", "camera").
    fn name(&self) -> &str;

    /// Whether `asset_id` can perform its assignment in `event`.
    ///
    /// `Err` means the predicate could not be evaluated; the checker treats
    /// it as `false` for this event only.
    fn can_perform(
        &self,
        asset_id: &str,
        event: &mut Event,
        environment: &Environment,
    ) -> Result<bool, CapabilityError>;

    /// Extends the asset's part of `event` to `to_ms`.
    ///
    /// The default moves the asset's event end out to `to_ms` when it is
    /// earlier and accepts.
    fn can_extend(
        &self,
        asset_id: &str,
        event: &mut Event,
        _environment: &Environment,
        to_ms: i64,
    ) -> Result<bool, CapabilityError> {
        let assignment = event
            .assignment_mut(asset_id)
            .ok_or_else(|| CapabilityError::NoAssignment(asset_id.to_string()))?;
        if assignment.event_end_ms < to_ms {
            assignment.event_end_ms = to_ms;
        }
        Ok(true)
    }
}

/// One node of the capability graph.
#[derive(Debug, Clone)]
pub struct CapabilityNode {
    /// Unique node identifier.
    pub id: String,
    /// Asset this node belongs to.
    pub asset_id: String,
    /// Ids of the nodes that must pass first, in evaluation order.
    pub dependencies: Vec<String>,
    /// Feasibility predicate.
    pub predicate: Arc<dyn Capability>,
}

impl CapabilityNode {
    /// Creates a node with no dependencies.
    pub fn new(
        id: impl Into<String>,
        asset_id: impl Into<String>,
        predicate: impl Capability + 'static,
    ) -> Self {
        Self::from_shared(id, asset_id, Arc::new(predicate))
    }

    /// Creates a node around an already shared predicate.
    pub fn from_shared(
        id: impl Into<String>,
        asset_id: impl Into<String>,
        predicate: Arc<dyn Capability>,
    ) -> Self {
        Self {
            id: id.into(),
            asset_id: asset_id.into(),
            dependencies: Vec::new(),
            predicate,
        }
    }

    /// Adds a dependency edge.
    pub fn with_dependency(mut self, node_id: impl Into<String>) -> Self {
        self.dependencies.push(node_id.into());
        self
    }

    /// Whether the node has no dependencies.
    pub fn is_leaf(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Predicate name.
    pub fn name(&self) -> &str {
        self.predicate.name()
    }
}

/// All capability nodes of a system, indexed by id.
#[derive(Debug, Clone, Default)]
pub struct CapabilityGraph {
    nodes: Vec<CapabilityNode>,
    index: HashMap<String, usize>,
}

impl CapabilityGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: adds a node.
    pub fn with_node(mut self, node: CapabilityNode) -> Self {
        self.add(node);
        self
    }

    /// Adds a node. If the id is already taken the first node keeps the id
    /// lookup; validation reports the duplicate.
    pub fn add(&mut self, node: CapabilityNode) {
        self.index.entry(node.id.clone()).or_insert(self.nodes.len());
        self.nodes.push(node);
    }

    /// Node by id.
    pub fn get(&self, id: &str) -> Option<&CapabilityNode> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    /// Position of a node in [`nodes`](Self::nodes).
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[CapabilityNode] {
        &self.nodes
    }

    /// Nodes owned by an asset.
    pub fn nodes_for_asset<'a>(
        &'a self,
        asset_id: &'a str,
    ) -> impl Iterator<Item = &'a CapabilityNode> + 'a {
        self.nodes.iter().filter(move |n| n.asset_id == asset_id)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
