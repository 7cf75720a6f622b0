//! Deterministic content hashing of schedule histories.
//!
//! Each schedule carries a [`ContentHash`] chained from its parent's:
//!
//! ```text
//! hash(child) = SHA-256( hash(parent) "|" canonical(event) )
//! ```
//!
//! where `canonical(event)` lists `asset:task:task_start:task_end` for every
//! assignment, sorted by asset id, with times as seconds fixed to three
//! decimals and `-` standing for an idle asset. Ids are backslash-escaped.
//! The digest depends only on the sequence of events, never on exploration
//! order, allocation, or the clock, so two branches that reach the same
//! content by different paths hash equal.
//!
//! [`HashAuditLog`] is an optional append-only record of the hashes seen at
//! each step, for comparing runs.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Mutex;

use crate::models::{Event, StateHistory};

const ROOT_SENTINEL: &[u8] = b"u-mission:root";

/// Number of hex characters shown by [`ContentHash::short`].
pub const SHORT_LEN: usize = 16;

/// Hex-encoded SHA-256 digest of a schedule's content.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash of the empty schedule.
    pub fn root() -> Self {
        Self(hex::encode(Sha256::digest(ROOT_SENTINEL)))
    }

    /// Hash of `parent` extended by `event`.
    pub fn compute(parent: &ContentHash, event: &Event) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(parent.0.as_bytes());
        hasher.update(b"|");
        hasher.update(canonical_event(event).as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Recomputes the hash of a history from the root.
    pub fn of_history(history: &StateHistory) -> Self {
        history
            .events()
            .iter()
            .fold(Self::root(), |hash, event| Self::compute(&hash, event))
    }

    /// Full hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters of the digest, for logs.
    pub fn short(&self) -> &str {
        &self.0[..SHORT_LEN.min(self.0.len())]
    }
}

impl Default for ContentHash {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical text of one event: `asset:task:start:end` entries joined by `;`.
///
/// Ids are escaped with `escape_id` so that distinct events never share a
/// canonical text.
pub fn canonical_event(event: &Event) -> String {
    event
        .assignments()
        .map(|(asset_id, a)| {
            let task = a.task_id().map_or_else(|| "-".to_string(), escape_id);
            format!(
                "{}:{}:{}:{}",
                escape_id(asset_id),
                task,
                fixed_seconds(a.task_start_ms),
                fixed_seconds(a.task_end_ms)
            )
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Backslash-escapes `\`, `:` and `;` in an id. An id that is exactly `-`
/// becomes `\-` so it cannot be read as the idle marker.
fn escape_id(id: &str) -> String {
    if id == "-" {
        return "\\-".to_string();
    }
    let mut out = String::with_capacity(id.len());
    for c in id.chars() {
        if matches!(c, '\\' | ':' | ';') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Milliseconds as seconds with exactly three decimals, without going
/// through floating point.
fn fixed_seconds(ms: i64) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let abs = ms.unsigned_abs();
    format!("{}{}.{:03}", sign, abs / 1000, abs % 1000)
}

/// Append-only record of hashes observed during a run.
///
/// Lines have the form `[<step:04>: <context:9>] <short hashes, sorted>`.
#[derive(Debug, Default)]
pub struct HashAuditLog {
    lines: Mutex<Vec<String>>,
}

impl HashAuditLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one line for `step`. Hashes are sorted, so the line does not
    /// depend on the order they were produced in.
    pub fn record<'a>(
        &self,
        step: usize,
        context: &str,
        hashes: impl IntoIterator<Item = &'a ContentHash>,
    ) {
        let mut shorts: Vec<&str> = hashes.into_iter().map(ContentHash::short).collect();
        shorts.sort_unstable();
        let line = format!("[{:04}: {:<9}] {}", step, context, shorts.join(" "));
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line);
    }

    /// Snapshot of all lines.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// All lines joined with newlines.
    pub fn render(&self) -> String {
        self.lines().join("\n")
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, SystemState, Task, TaskType};
    use rand::rngs::SmallRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn task(id: &str) -> Arc<Task> {
        Arc::new(Task::new(id, TaskType::Imaging))
    }

    /// Builds an event by inserting assignments in the given order.
    fn event(entries: &[(&str, Option<&str>, i64, i64)]) -> Event {
        let mut e = Event::new(SystemState::new());
        for (asset, task_id, start, end) in entries {
            e.assign(
                *asset,
                Assignment::new(task_id.map(task), *start, *end, *start, *end),
            );
        }
        e
    }

    #[test]
    fn test_root_is_stable() {
        assert_eq!(ContentHash::root(), ContentHash::root());
        assert_eq!(ContentHash::root().as_str().len(), 64);
        assert_eq!(ContentHash::root().short().len(), SHORT_LEN);
    }

    #[test]
    fn test_canonical_event_format() {
        let e = event(&[("sat2", None, 1000, 1000), ("sat1", Some("T1"), 1500, 11_250)]);
        assert_eq!(canonical_event(&e), "sat1:T1:1.500:11.250;sat2:-:1.000:1.000");
        assert_eq!(fixed_seconds(-1500), "-1.500");
        assert_eq!(fixed_seconds(7), "0.007");
    }

    #[test]
    fn test_separators_in_ids_do_not_collide() {
        let smuggled = event(&[("a", Some("b:0.000:1.000;a:c:-"), 0, 1000)]);
        let split = event(&[("a", Some("b"), 0, 1000), ("a:c", None, 0, 1000)]);
        assert_ne!(canonical_event(&smuggled), canonical_event(&split));

        let root = ContentHash::root();
        assert_ne!(
            ContentHash::compute(&root, &smuggled),
            ContentHash::compute(&root, &split)
        );

        // A task literally named "-" is not an idle asset.
        let dash = event(&[("sat1", Some("-"), 0, 0)]);
        let idle = event(&[("sat1", None, 0, 0)]);
        assert_ne!(canonical_event(&dash), canonical_event(&idle));
        assert_eq!(escape_id("a\\b;c"), "a\\\\b\\;c");
    }

    #[test]
    fn test_hash_independent_of_insertion_order() {
        let mut entries = vec![
            ("a1", Some("T1"), 0, 10_000),
            ("a2", None, 0, 0),
            ("a3", Some("T2"), 2000, 9000),
            ("a4", Some("T3"), 0, 5000),
            ("a5", None, 0, 0),
        ];
        let reference = ContentHash::compute(&ContentHash::root(), &event(&entries));

        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..20 {
            entries.shuffle(&mut rng);
            let h = ContentHash::compute(&ContentHash::root(), &event(&entries));
            assert_eq!(h, reference);
        }
    }

    #[test]
    fn test_hash_distinguishes_content_and_order() {
        let e1 = event(&[("sat1", Some("T1"), 0, 1000)]);
        let e2 = event(&[("sat1", Some("T2"), 0, 1000)]);
        let root = ContentHash::root();

        let h1 = ContentHash::compute(&root, &e1);
        let h2 = ContentHash::compute(&root, &e2);
        assert_ne!(h1, h2);
        assert_ne!(h1, root);

        // Same events, different order.
        let h12 = ContentHash::compute(&h1, &e2);
        let h21 = ContentHash::compute(&h2, &e1);
        assert_ne!(h12, h21);
    }

    #[test]
    fn test_of_history_matches_incremental() {
        let e1 = event(&[("sat1", Some("T1"), 0, 1000)]).seal();
        let e2 = event(&[("sat1", None, 1000, 1000)]).seal();
        let history = StateHistory::default().branch(e1.clone()).branch(e2.clone());

        let incremental = ContentHash::compute(&ContentHash::compute(&ContentHash::root(), &e1), &e2);
        assert_eq!(ContentHash::of_history(&history), incremental);
        assert_eq!(ContentHash::of_history(&StateHistory::default()), ContentHash::root());
    }

    #[test]
    fn test_audit_log_sorted_lines() {
        let log = HashAuditLog::new();
        let a = ContentHash::root();
        let b = ContentHash::compute(&a, &event(&[("sat1", None, 0, 0)]));

        log.record(3, "EvalAll", [&b, &a]);
        log.record(3, "EvalAll", [&a, &b]);

        let lines = log.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], lines[1]);
        assert!(lines[0].starts_with("[0003: EvalAll  ] "));
        assert_eq!(log.render().lines().count(), 2);
        assert!(!log.is_empty());
    }
}
