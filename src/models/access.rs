//! Access windows.
//!
//! An access is a time interval during which an asset can perform a task.
//! Window geometry (orbits, line of sight) is computed outside this crate;
//! the scheduler only consumes the resulting intervals.

use std::fmt;
use std::sync::Arc;

use super::Task;

/// An interval `[start_ms, end_ms]` during which `asset_id` can perform `task`.
///
/// `task == None` is the explicit "do nothing" access.
#[derive(Debug, Clone, PartialEq)]
pub struct Access {
    /// Asset that can act.
    pub asset_id: String,
    /// Task that can be performed, or `None` for idle.
    pub task: Option<Arc<Task>>,
    /// Window start (ms).
    pub start_ms: i64,
    /// Window end (ms).
    pub end_ms: i64,
}

impl Access {
    /// Creates an access for a task.
    pub fn new(asset_id: impl Into<String>, task: Arc<Task>, start_ms: i64, end_ms: i64) -> Self {
        Self {
            asset_id: asset_id.into(),
            task: Some(task),
            start_ms,
            end_ms,
        }
    }

    /// Creates an idle access.
    pub fn idle(asset_id: impl Into<String>, start_ms: i64, end_ms: i64) -> Self {
        Self {
            asset_id: asset_id.into(),
            task: None,
            start_ms,
            end_ms,
        }
    }

    /// Whether this is the "do nothing" access.
    pub fn is_idle(&self) -> bool {
        self.task.is_none()
    }

    /// Task id, if any.
    pub fn task_id(&self) -> Option<&str> {
        self.task.as_deref().map(|t| t.id.as_str())
    }

    /// Whether `start_ms < end_ms`.
    pub fn is_well_formed(&self) -> bool {
        self.start_ms < self.end_ms
    }

    /// Whether the window overlaps `[from_ms, to_ms)`.
    pub fn overlaps(&self, from_ms: i64, to_ms: i64) -> bool {
        self.start_ms < to_ms && self.end_ms > from_ms
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}[{}, {}]",
            self.asset_id,
            self.task_id().unwrap_or("-"),
            self.start_ms,
            self.end_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskType;

    #[test]
    fn test_access_basics() {
        let task = Arc::new(Task::new("T1", TaskType::Imaging));
        let a = Access::new("sat1", task, 0, 10_000);
        assert!(!a.is_idle());
        assert_eq!(a.task_id(), Some("T1"));
        assert!(a.is_well_formed());
        assert_eq!(a.to_string(), "sat1:T1[0, 10000]");

        let idle = Access::idle("sat1", 0, 10_000);
        assert!(idle.is_idle());
        assert_eq!(idle.task_id(), None);
        assert_eq!(idle.to_string(), "sat1:-[0, 10000]");
    }

    #[test]
    fn test_access_overlap() {
        let a = Access::idle("sat1", 1000, 2000);
        assert!(a.overlaps(0, 1500));
        assert!(a.overlaps(1999, 5000));
        assert!(!a.overlaps(2000, 3000));
        assert!(!a.overlaps(0, 1000));
        assert!(!Access::idle("sat1", 5, 5).is_well_formed());
    }
}
