//! Step records and the history ledger.
//!
//! Every executed action becomes an immutable Step. The ledger is the
//! single source of truth the loop detector and progress tracker read
//! back — append-only, contiguous indices, owned by exactly one run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::{Action, Outcome};

/// One recorded unit of execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Monotonic, 0-based, contiguous within a run
    pub index: usize,

    /// The action that was executed (possibly a substitute)
    pub action: Action,

    /// What executing it produced
    pub outcome: Outcome,

    /// True if this action was substituted by the fallback policy
    pub is_fallback: bool,

    /// When the step was recorded
    pub timestamp: DateTime<Utc>,
}

/// Append-only ordered sequence of steps for a single run.
///
/// Created fresh per task and handed to an external transcript store at
/// task end; the core never persists it.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct HistoryLedger {
    steps: Vec<Step>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Record a step. The index is assigned here, never by the caller.
    pub fn append(&mut self, action: Action, outcome: Outcome, is_fallback: bool) -> &Step {
        let index = self.steps.len();
        self.steps.push(Step {
            index,
            action,
            outcome,
            is_fallback,
            timestamp: Utc::now(),
        });
        &self.steps[index]
    }

    /// The last `n` steps, oldest first. Fewer if the ledger is shorter.
    pub fn tail(&self, n: usize) -> &[Step] {
        let start = self.steps.len().saturating_sub(n);
        &self.steps[start..]
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::FailureReason;

    fn read(path: &str) -> Action {
        Action::new("file_read").with_param("path", path)
    }

    #[test]
    fn append_assigns_contiguous_indices() {
        let mut ledger = HistoryLedger::new();
        ledger.append(read("a.txt"), Outcome::success("a"), false);
        ledger.append(
            read("b.txt"),
            Outcome::failure(FailureReason::NotFound, "missing"),
            false,
        );
        ledger.append(read("c.txt"), Outcome::success("c"), true);

        let indices: Vec<usize> = ledger.steps().iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn tail_returns_most_recent_oldest_first() {
        let mut ledger = HistoryLedger::new();
        for i in 0..5 {
            ledger.append(read(&format!("{i}.txt")), Outcome::success(""), false);
        }
        let tail = ledger.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].index, 3);
        assert_eq!(tail[1].index, 4);
    }

    #[test]
    fn tail_larger_than_ledger_is_whole_ledger() {
        let mut ledger = HistoryLedger::new();
        ledger.append(read("a.txt"), Outcome::success(""), false);
        assert_eq!(ledger.tail(10).len(), 1);
        assert!(HistoryLedger::new().tail(4).is_empty());
    }
}
