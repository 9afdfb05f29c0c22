//! The Gyro control core.
//!
//! Drives **Thought → Action → Observation** cycles against a reasoning
//! oracle, and turns that stream of outputs into safe, terminating
//! behavior:
//!
//! 1. **Ask** the oracle for the next step
//! 2. **Parse** the response into an action (or escalate clarification)
//! 3. **Check** the proposed action against the history for repetition
//! 4. **Execute** it (or a fallback substitute) via the action registry
//! 5. **Track** progress, adjust the iteration budget, decide
//!    continue / retry / substitute / clarify / stop
//!
//! The loop ends in exactly one of: success, abandoned (loop or malformed
//! output), budget exhaustion, fatal executor error, or cancellation —
//! always with a human-readable account of what happened.

pub mod clarify;
pub mod controller;
pub mod detector;
pub mod fallback;
pub mod parse;
pub mod progress;
pub mod prompt;
pub mod state;

#[cfg(test)]
pub mod test_support;

pub use clarify::{ClarificationEscalator, Guidance, Level};
pub use controller::{LoopController, RunOutcome, RunReport};
pub use detector::{LoopDetector, LoopVerdict, Signature};
pub use fallback::{FallbackDecision, FallbackPolicy};
pub use parse::{ParsedTurn, parse_turn};
pub use progress::{Complexity, GoalCheck, KeywordGoal, Phase, ProgressTracker};
pub use state::{FailureStreak, TaskState};
