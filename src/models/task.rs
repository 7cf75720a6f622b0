//! Task and target model.
//!
//! A task is something an asset can be asked to do during a step: image a
//! target, downlink data, recharge. Tasks are loaded once, never mutated,
//! and shared between every schedule as `Arc<Task>`.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// A task that may be assigned to an asset.
///
/// Equality and hashing use `id` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Task classification. Capabilities branch on it.
    pub task_type: TaskType,
    /// What the task is performed on.
    pub target: Target,
    /// How many times this task may appear across one schedule's history.
    /// `0` means the task can never be scheduled.
    pub max_times_to_perform: u32,
    /// Domain-specific key-value metadata.
    pub attributes: HashMap<String, String>,
}

/// Task classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    /// Collect an image of the target.
    Imaging,
    /// Communicate with a ground station.
    Comm,
    /// Recharge onboard energy storage.
    Recharge,
    /// Transmit stored data.
    Transmit,
    /// Domain-specific type.
    Custom(String),
}

impl TaskType {
    /// Short label used in logs and exports.
    pub fn label(&self) -> &str {
        match self {
            TaskType::Imaging => "IMAGING",
            TaskType::Comm => "COMM",
            TaskType::Recharge => "RECHARGE",
            TaskType::Transmit => "TRANSMIT",
            TaskType::Custom(name) => name,
        }
    }
}

/// The object a task acts on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Unique target identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Value earned each time a task on this target is performed.
    pub value: f64,
}

impl Target {
    /// Creates a target with the given value.
    pub fn new(id: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            value,
        }
    }

    /// Sets the target name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Task {
    /// Creates a task that may be performed once.
    ///
    /// The target defaults to a zero-value target named after the task.
    pub fn new(id: impl Into<String>, task_type: TaskType) -> Self {
        let id = id.into();
        Self {
            target: Target::new(id.clone(), 0.0),
            id,
            name: String::new(),
            task_type,
            max_times_to_perform: 1,
            attributes: HashMap::new(),
        }
    }

    /// Sets the task name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the target.
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Sets the repetition limit.
    pub fn with_max_times(mut self, max_times: u32) -> Self {
        self.max_times_to_perform = max_times;
        self
    }

    /// Adds a domain-specific attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Value earned by performing this task once.
    pub fn value(&self) -> f64 {
        self.target.value
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_builder() {
        let task = Task::new("T1", TaskType::Imaging)
            .with_name("Image Seoul")
            .with_target(Target::new("seoul", 5.0).with_name("Seoul"))
            .with_max_times(3)
            .with_attribute("priority", "high");

        assert_eq!(task.id, "T1");
        assert_eq!(task.name, "Image Seoul");
        assert_eq!(task.task_type, TaskType::Imaging);
        assert_eq!(task.max_times_to_perform, 3);
        assert_eq!(task.value(), 5.0);
        assert_eq!(task.target.name, "Seoul");
        assert_eq!(task.attributes.get("priority"), Some(&"high".to_string()));
    }

    #[test]
    fn test_task_defaults() {
        let task = Task::new("T1", TaskType::Recharge);
        assert_eq!(task.max_times_to_perform, 1);
        assert_eq!(task.target.id, "T1");
        assert_eq!(task.value(), 0.0);
    }

    #[test]
    fn test_task_equality_by_id() {
        let a = Task::new("T1", TaskType::Imaging).with_max_times(1);
        let b = Task::new("T1", TaskType::Comm).with_max_times(9);
        let c = Task::new("T2", TaskType::Imaging);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_task_type_label() {
        assert_eq!(TaskType::Transmit.label(), "TRANSMIT");
        assert_eq!(TaskType::Custom("SCAN".into()).label(), "SCAN");
    }

    #[test]
    fn test_task_serde() {
        let task = Task::new("T1", TaskType::Custom("SCAN".into()));
        let json = serde_json::to_string(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back.task_type, TaskType::Custom("SCAN".into()));
    }
}
