//! Asset model.
//!
//! Assets are the vehicles that perform tasks: satellites, aircraft, ground
//! stations. An asset owns no behavior itself; its capability nodes live in
//! the system's capability graph and refer back to it by id.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An asset that tasks can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique asset identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Domain-specific metadata.
    pub attributes: HashMap<String, String>,
}

impl Asset {
    /// Creates a new asset.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            attributes: HashMap::new(),
        }
    }

    /// Sets the asset name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a domain-specific attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Scoped state variable name for this asset (`"<asset>.<variable>"`).
    pub fn state_name(&self, variable: &str) -> String {
        format!("{}.{}", self.id, variable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_builder() {
        let a = Asset::new("sat1")
            .with_name("Imaging Satellite 1")
            .with_attribute("orbit", "LEO");

        assert_eq!(a.id, "sat1");
        assert_eq!(a.name, "Imaging Satellite 1");
        assert_eq!(a.attributes.get("orbit"), Some(&"LEO".to_string()));
        assert_eq!(a.state_name("checker_power"), "sat1.checker_power");
    }
}
