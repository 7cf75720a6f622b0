//! Model-build checks for mission systems.
//!
//! Run once before any search. Detects:
//! - Duplicate asset, node, and task IDs
//! - Capability nodes owned by unknown assets
//! - Dependency edges and constraints naming unknown nodes
//! - Constraints on non-scalar variables
//! - Circular capability dependencies (DAG validation)
//!
//! The checker assumes every one of these holds.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use crate::models::Task;
use crate::system::System;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A capability node belongs to an asset that doesn't exist.
    InvalidAssetReference,
    /// A dependency edge names a node that doesn't exist.
    InvalidDependency,
    /// A constraint names a node that doesn't exist.
    InvalidConstraintReference,
    /// A constraint is bound to a matrix/vector/quaternion variable.
    NonScalarConstraint,
    /// Capability graph contains a cycle.
    CyclicDependency,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a system.
///
/// Checks:
/// 1. No duplicate asset IDs
/// 2. No duplicate capability node IDs
/// 3. Every node belongs to an existing asset
/// 4. Every dependency points to an existing node
/// 5. Every constraint points to an existing node and a scalar variable
/// 6. No circular capability dependencies
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_system(system: &System) -> ValidationResult {
    let mut errors = Vec::new();

    let mut asset_ids = HashSet::new();
    for a in &system.assets {
        if !asset_ids.insert(a.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate asset ID: {}", a.id),
            ));
        }
    }

    let mut node_ids = HashSet::new();
    for node in system.capabilities.nodes() {
        if !node_ids.insert(node.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate capability node ID: {}", node.id),
            ));
        }
        if !asset_ids.contains(node.asset_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidAssetReference,
                format!(
                    "Capability node '{}' belongs to unknown asset '{}'",
                    node.id, node.asset_id
                ),
            ));
        }
    }

    for node in system.capabilities.nodes() {
        for dep in &node.dependencies {
            if !node_ids.contains(dep.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidDependency,
                    format!(
                        "Capability node '{}' depends on unknown node '{}'",
                        node.id, dep
                    ),
                ));
            }
        }
    }

    for c in &system.constraints {
        if !node_ids.contains(c.node_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidConstraintReference,
                format!(
                    "Constraint '{}' references unknown node '{}'",
                    c.name, c.node_id
                ),
            ));
        }
        if !c.key.kind.is_scalar() {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonScalarConstraint,
                format!(
                    "Constraint '{}' is bound to non-scalar variable '{}' ({:?})",
                    c.name, c.key.name, c.key.kind
                ),
            ));
        }
    }

    if let Some(cycle_err) = detect_cycles(system) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates the task set handed to the scheduler: task IDs must be unique.
pub fn validate_tasks(tasks: &[Arc<Task>]) -> ValidationResult {
    let mut seen = HashSet::new();
    let errors: Vec<ValidationError> = tasks
        .iter()
        .filter(|t| !seen.insert(t.id.as_str()))
        .map(|t| {
            ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate task ID: {}", t.id),
            )
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects cycles in the capability graph using DFS.
///
/// # Algorithm
/// Topological sort via DFS. If a back-edge is found (visiting a node
/// currently in the recursion stack), a cycle exists. Edges point from a
/// node to its dependencies.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
fn detect_cycles(system: &System) -> Option<ValidationError> {
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut all_ids: Vec<&str> = Vec::new();

    for node in system.capabilities.nodes() {
        all_ids.push(&node.id);
        adj.entry(node.id.as_str())
            .or_default()
            .extend(node.dependencies.iter().map(String::as_str));
    }

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for &node in &all_ids {
        if !visited.contains(node) && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("Circular dependency detected involving capability node '{node}'"),
            ));
        }
    }

    None
}

fn has_cycle_dfs<'a>(
    node: &'a str,
    adj: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    in_stack: &mut HashSet<&'a str>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(node) {
        for &next in neighbors {
            if in_stack.contains(next) {
                return true; // Back edge → cycle
            }
            if !visited.contains(next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(node);
    false
}
