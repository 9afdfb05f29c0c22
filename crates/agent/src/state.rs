//! Mutable per-run state.
//!
//! `TaskState` is owned by the loop controller; the progress tracker
//! mutates only the fields it governs (budget, phase) through explicit
//! calls. `FailureStreak` is the history-derived context the fallback
//! policy needs to stay deterministic without holding state of its own.

use crate::progress::{Complexity, Phase};

/// One instance per run; reset per task in chat mode.
#[derive(Debug, Clone)]
pub struct TaskState {
    /// Iterations consumed so far (malformed responses do not count)
    pub iterations: usize,

    /// Current iteration budget; starts from the classified base and may
    /// grow exactly once
    pub budget: usize,

    /// Set once by the first classification pass, immutable after
    pub complexity: Option<Complexity>,

    /// Current progress phase
    pub phase: Phase,

    /// Consecutive failed steps
    pub consecutive_failures: usize,

    /// Consecutive fallback steps
    pub consecutive_fallbacks: usize,

    /// Whether the one-time budget extension has been used
    pub extension_granted: bool,
}

impl TaskState {
    pub fn new() -> Self {
        Self {
            iterations: 0,
            budget: 0,
            complexity: None,
            phase: Phase::Starting,
            consecutive_failures: 0,
            consecutive_fallbacks: 0,
            extension_granted: false,
        }
    }

    /// Update the consecutive counters from the step just recorded.
    pub fn note_step(&mut self, success: bool, is_fallback: bool) {
        if success {
            self.consecutive_failures = 0;
            if is_fallback {
                self.consecutive_fallbacks += 1;
            } else {
                self.consecutive_fallbacks = 0;
            }
        } else {
            self.consecutive_failures += 1;
            if is_fallback {
                self.consecutive_fallbacks += 1;
            }
        }
    }
}

impl Default for TaskState {
    fn default() -> Self {
        Self::new()
    }
}

/// Context for the current run of consecutive failures.
///
/// Cleared whenever a non-fallback action succeeds; the fallback policy
/// uses it to bound transient retries and to refuse re-proposing a
/// substitute already tried for this streak.
#[derive(Debug, Clone, Default)]
pub struct FailureStreak {
    /// Backoff retries already spent on transient failures
    pub transient_retries: usize,

    /// Display keys of substitutes already attempted in this streak
    pub attempted_substitutes: Vec<String>,
}

impl FailureStreak {
    pub fn clear(&mut self) {
        self.transient_retries = 0;
        self.attempted_substitutes.clear();
    }

    pub fn note_substitute(&mut self, substitute_key: String) {
        self.attempted_substitutes.push(substitute_key);
    }

    pub fn already_tried(&self, substitute_key: &str) -> bool {
        self.attempted_substitutes.iter().any(|s| s == substitute_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_track_failure_runs() {
        let mut state = TaskState::new();
        state.note_step(false, false);
        state.note_step(false, true);
        assert_eq!(state.consecutive_failures, 2);
        assert_eq!(state.consecutive_fallbacks, 1);

        state.note_step(true, false);
        assert_eq!(state.consecutive_failures, 0);
        assert_eq!(state.consecutive_fallbacks, 0);
    }

    #[test]
    fn fallback_success_keeps_fallback_streak() {
        let mut state = TaskState::new();
        state.note_step(true, true);
        state.note_step(true, true);
        assert_eq!(state.consecutive_fallbacks, 2);
        assert_eq!(state.consecutive_failures, 0);
    }

    #[test]
    fn streak_remembers_substitutes() {
        let mut streak = FailureStreak::default();
        streak.note_substitute("file_write(path=\"a\")".into());
        assert!(streak.already_tried("file_write(path=\"a\")"));
        streak.clear();
        assert!(!streak.already_tried("file_write(path=\"a\")"));
    }
}
