//! Progress tracking and the dynamic iteration budget.
//!
//! Classifies task complexity once, drives the
//! starting → making_progress → stuck → completing phase machine from the
//! step stream, grants the one-time budget extension, and detects early
//! completion through the goal-check seam.

use gyro_core::{Outcome, Step};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};

use crate::state::TaskState;

/// Estimated complexity of a task, classified once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Complexity::Simple => "simple",
            Complexity::Moderate => "moderate",
            Complexity::Complex => "complex",
        };
        write!(f, "{s}")
    }
}

/// Current progress phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Starting,
    MakingProgress,
    Stuck,
    Completing,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Starting => "starting",
            Phase::MakingProgress => "making_progress",
            Phase::Stuck => "stuck",
            Phase::Completing => "completing",
        };
        write!(f, "{s}")
    }
}

/// The goal-satisfaction seam.
///
/// Judges whether the latest successful observation satisfies the task's
/// stated goal — the only path to an early Success termination.
pub trait GoalCheck: Send + Sync {
    fn is_satisfied(&self, task: &str, latest_success: &str) -> bool;
}

static FILE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w./-]+\.[A-Za-z0-9]{1,4}").expect("file token regex"));

/// Default goal check: completion phrases, or a successful write/create
/// naming a deliverable the task itself mentions.
pub struct KeywordGoal;

const COMPLETION_PHRASES: &[&str] = &[
    "task completed",
    "successfully completed",
    "all done",
    "all subtasks complete",
];

impl GoalCheck for KeywordGoal {
    fn is_satisfied(&self, task: &str, latest_success: &str) -> bool {
        let lower = latest_success.to_lowercase();
        if COMPLETION_PHRASES.iter().any(|p| lower.contains(p)) {
            return true;
        }

        // A successful write or create that names a deliverable from the
        // task counts as hitting the goal.
        if lower.contains("successfully wrote")
            || lower.contains("successfully created")
            || lower.contains("successfully replaced")
        {
            for token in FILE_TOKEN_RE.find_iter(task) {
                if latest_success.contains(token.as_str()) {
                    return true;
                }
            }
        }
        false
    }
}

/// What an update decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    pub phase: Phase,
    pub budget: usize,
    /// True exactly when this update granted the one-time extension
    pub extended: bool,
}

/// Owns the budget arithmetic and phase transitions.
pub struct ProgressTracker {
    base_iterations: usize,
    max_budget: usize,
    stuck_after: usize,
    extension_step: usize,
    extension_margin: usize,
    goal: Arc<dyn GoalCheck>,
}

impl ProgressTracker {
    pub fn new(
        base_iterations: usize,
        max_budget: usize,
        stuck_after: usize,
        extension_step: usize,
        extension_margin: usize,
        goal: Arc<dyn GoalCheck>,
    ) -> Self {
        Self {
            base_iterations,
            max_budget,
            stuck_after,
            extension_step,
            extension_margin,
            goal,
        }
    }

    /// Heuristic complexity classification. Runs once per task; the result
    /// is pinned in `TaskState` and never re-derived.
    pub fn classify(&self, task: &str) -> Complexity {
        let lower = task.to_lowercase();
        let mut score = 0usize;

        // Multiple deliverables: conjunctions and sequencing words
        let conjunctions =
            lower.matches(" and ").count() + lower.matches(" then ").count();
        if conjunctions >= 3 {
            score += 2;
        } else if conjunctions >= 1 {
            score += 1;
        }

        // Enumerated sub-steps
        let bullets = task
            .lines()
            .filter(|l| {
                let t = l.trim_start();
                t.starts_with('-') || t.starts_with('*') || t.chars().next().is_some_and(|c| c.is_ascii_digit())
            })
            .count();
        if bullets >= 2 {
            score += 2;
        }

        // Explicit multi-file references
        let files = FILE_TOKEN_RE.find_iter(task).count();
        if files >= 3 {
            score += 2;
        } else if files >= 2 {
            score += 1;
        }

        // Sheer size
        let words = task.split_whitespace().count();
        if words > 80 {
            score += 2;
        } else if words > 40 {
            score += 1;
        }

        if score >= 4 {
            Complexity::Complex
        } else if score >= 2 {
            Complexity::Moderate
        } else {
            Complexity::Simple
        }
    }

    /// The starting budget for a classified complexity.
    pub fn budget_for(&self, complexity: Complexity) -> usize {
        match complexity {
            Complexity::Simple => self.base_iterations,
            Complexity::Moderate => {
                (self.base_iterations + self.base_iterations / 2).min(self.max_budget)
            }
            Complexity::Complex => self.max_budget,
        }
    }

    /// Fold one recorded step into the phase machine and budget.
    ///
    /// Mutates only the fields the tracker governs: `phase`, `budget`,
    /// `extension_granted`.
    pub fn update(&self, task: &str, step: &Step, state: &mut TaskState) -> ProgressReport {
        match &step.outcome {
            Outcome::Success { content, .. } => {
                if self.goal.is_satisfied(task, content) {
                    state.phase = Phase::Completing;
                } else if !step.is_fallback {
                    // Includes recovery from stuck
                    state.phase = Phase::MakingProgress;
                } else if state.consecutive_fallbacks >= self.stuck_after {
                    state.phase = Phase::Stuck;
                } else if state.phase == Phase::Starting {
                    state.phase = Phase::MakingProgress;
                }
            }
            Outcome::Failure { .. } => {
                if state.consecutive_failures >= self.stuck_after {
                    state.phase = Phase::Stuck;
                }
            }
        }

        let extended = self.maybe_extend(state);

        ProgressReport {
            phase: state.phase,
            budget: state.budget,
            extended,
        }
    }

    /// One bounded extension per run, only while making progress and only
    /// when the budget is nearly spent. Never from stuck.
    fn maybe_extend(&self, state: &mut TaskState) -> bool {
        if state.extension_granted
            || state.phase != Phase::MakingProgress
            || state.budget.saturating_sub(state.iterations) > self.extension_margin
        {
            return false;
        }
        state.budget += self.extension_step;
        state.extension_granted = true;
        true
    }
}
