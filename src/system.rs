//! The system being planned for: assets, their capability graph,
//! constraints, and the environment predicates run in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::capability::{CapabilityGraph, CapabilityNode};
use crate::error::{Result, SchedulerError};
use crate::models::{Asset, Constraint};
use crate::validation;

/// Read-only context handed to every capability predicate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Scenario name.
    pub name: String,
    /// Named scalar parameters (e.g., solar flux, ground station elevation mask).
    pub parameters: BTreeMap<String, f64>,
}

impl Environment {
    /// Creates a named environment.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Sets a parameter.
    pub fn with_parameter(mut self, key: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Parameter value.
    pub fn parameter(&self, key: &str) -> Option<f64> {
        self.parameters.get(key).copied()
    }
}

/// Assets plus everything the checker needs to judge their events.
#[derive(Debug, Clone, Default)]
pub struct System {
    /// Assets, in declaration order.
    pub assets: Vec<Asset>,
    /// Capability graph over all assets.
    pub capabilities: CapabilityGraph,
    /// Constraints checked after the graph passes.
    pub constraints: Vec<Constraint>,
    /// Environment handed to predicates.
    pub environment: Environment,
}

impl System {
    /// Creates an empty system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an asset.
    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.assets.push(asset);
        self
    }

    /// Replaces the capability graph.
    pub fn with_capabilities(mut self, capabilities: CapabilityGraph) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Adds a capability node.
    pub fn with_node(mut self, node: CapabilityNode) -> Self {
        self.capabilities.add(node);
        self
    }

    /// Adds a constraint.
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Sets the environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Asset by id.
    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Runs [`validation::validate_system`].
    pub fn validate(&self) -> Result<()> {
        validation::validate_system(self).map_err(SchedulerError::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::builtin::AlwaysFeasible;

    #[test]
    fn test_system_builder() {
        let system = System::new()
            .with_asset(Asset::new("sat1"))
            .with_node(CapabilityNode::new("sat1.power", "sat1", AlwaysFeasible))
            .with_environment(Environment::new("LEO").with_parameter("solar_flux", 1361.0));

        assert!(system.asset("sat1").is_some());
        assert!(system.asset("sat2").is_none());
        assert_eq!(system.capabilities.len(), 1);
        assert_eq!(system.environment.parameter("solar_flux"), Some(1361.0));
        assert!(system.validate().is_ok());
    }

    #[test]
    fn test_validate_wraps_errors() {
        let system = System::new().with_node(CapabilityNode::new("n", "ghost", AlwaysFeasible));
        match system.validate() {
            Err(SchedulerError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
