//! Search context threaded through the scheduling loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-run search state passed to every component that needs the current
/// step or a lineage counter.
///
/// All times are in milliseconds relative to the scenario epoch (t=0).
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    /// Zero-based step index.
    pub step: usize,
    /// Start of the current step (ms).
    pub current_time_ms: i64,
    /// Step length (ms).
    pub step_ms: i64,
    /// Children handed out so far this step, per parent id.
    child_counters: HashMap<String, usize>,
}

impl SearchContext {
    /// Creates a context at the first step.
    pub fn new(start_ms: i64, step_ms: i64) -> Self {
        Self {
            step: 0,
            current_time_ms: start_ms,
            step_ms,
            child_counters: HashMap::new(),
        }
    }

    /// End of the current step (ms).
    pub fn window_end_ms(&self) -> i64 {
        self.current_time_ms + self.step_ms
    }

    /// Lineage id for the next child of `parent_id` this step:
    /// `"<parent>.1"`, `"<parent>.2"`, ...
    pub fn next_child_id(&mut self, parent_id: &str) -> String {
        let n = self.child_counters.entry(parent_id.to_string()).or_insert(0);
        *n += 1;
        format!("{parent_id}.{n}")
    }

    /// Pads a surviving schedule's id with `.0` so it has as many segments
    /// as the children created this step.
    pub fn pad_lineage(&self, id: &mut String) {
        let target = self.step + 1;
        let mut dots = id.matches('.').count();
        while dots < target {
            id.push_str(".0");
            dots += 1;
        }
    }

    /// Moves to the next step and resets lineage counters.
    pub fn advance(&mut self) {
        self.step += 1;
        self.current_time_ms += self.step_ms;
        self.child_counters.clear();
    }
}

/// Cooperative cancellation flag, checked at the top of every step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates an un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_ids() {
        let mut ctx = SearchContext::new(0, 1000);
        assert_eq!(ctx.next_child_id("0"), "0.1");
        assert_eq!(ctx.next_child_id("0"), "0.2");
        assert_eq!(ctx.next_child_id("0.1"), "0.1.1");

        ctx.advance();
        assert_eq!(ctx.step, 1);
        assert_eq!(ctx.current_time_ms, 1000);
        assert_eq!(ctx.window_end_ms(), 2000);
        assert_eq!(ctx.next_child_id("0"), "0.1");
    }

    #[test]
    fn test_pad_lineage() {
        let mut ctx = SearchContext::new(0, 1000);
        let mut root = String::from("0");
        ctx.pad_lineage(&mut root);
        assert_eq!(root, "0.0");

        ctx.advance();
        ctx.advance();
        ctx.pad_lineage(&mut root);
        assert_eq!(root, "0.0.0.0");

        let mut already = String::from("0.1.2.3");
        ctx.pad_lineage(&mut already);
        assert_eq!(already, "0.1.2.3");
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
