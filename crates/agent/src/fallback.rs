//! Fallback selection for failed or looping actions.
//!
//! A static decision table keyed by (action name, failure reason) yields a
//! substitute whose parameters derive deterministically from the original.
//! The policy is a pure function of its inputs — same action, same reason,
//! same streak, same history: same decision, every time.

use std::path::Path;
use std::time::Duration;

use gyro_core::{Action, FailureReason, HistoryLedger};

use crate::detector::{LoopDetector, LoopVerdict};
use crate::state::FailureStreak;

/// What to do instead of giving up on a failed or looping action.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackDecision {
    /// Re-run the same action after a delay (transient failures only)
    Retry { delay: Duration },
    /// Run this substitute instead
    Substitute { action: Action, rationale: String },
}

/// The fallback decision tables plus backoff schedule.
///
/// Holds no mutable state; streak context is handed in per call so the
/// determinism property stays provable.
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    backoff_base: Duration,
    backoff_cap: Duration,
    transient_max_retries: usize,
    detector: LoopDetector,
}

impl FallbackPolicy {
    pub fn new(
        backoff_base: Duration,
        backoff_cap: Duration,
        transient_max_retries: usize,
        detector: LoopDetector,
    ) -> Self {
        Self {
            backoff_base,
            backoff_cap,
            transient_max_retries,
            detector,
        }
    }

    /// Propose a recovery for a failed action, or decline.
    pub fn propose_for_failure(
        &self,
        failed: &Action,
        reason: FailureReason,
        streak: &FailureStreak,
        ledger: &HistoryLedger,
    ) -> Option<FallbackDecision> {
        // Transient failures get the same action back, with doubling delay,
        // before substitution is considered.
        if reason.is_transient() {
            if streak.transient_retries < self.transient_max_retries {
                return Some(FallbackDecision::Retry {
                    delay: self.backoff_delay(streak.transient_retries),
                });
            }
            return None;
        }

        let (substitute, rationale) = self.failure_table(failed, reason)?;
        self.admit(substitute, rationale, Some(streak), ledger)
    }

    /// Propose a substitute that breaks a detected repetition pattern.
    pub fn propose_for_loop(
        &self,
        looping: &Action,
        verdict: &LoopVerdict,
        ledger: &HistoryLedger,
    ) -> Option<FallbackDecision> {
        let (substitute, why) = match looping.name.as_str() {
            "file_read" => (
                Action::new("dir_list").with_param("path", parent_of(looping.str_param("path")?)),
                "listing the directory to find the right file",
            ),
            "file_write" | "file_edit" => (
                Action::new("file_read").with_param("path", looping.str_param("path")?),
                "reading the current content before modifying again",
            ),
            "dir_create" | "file_delete" => (
                Action::new("dir_list").with_param("path", parent_of(looping.str_param("path")?)),
                "checking what already exists at that location",
            ),
            _ => return None,
        };
        let rationale = format!("{}; {why}", verdict.describe(looping));
        self.admit(substitute, rationale, None, ledger)
    }

    /// The capped doubling backoff schedule.
    pub fn backoff_delay(&self, retries_so_far: usize) -> Duration {
        let factor = 1u32 << retries_so_far.min(16) as u32;
        (self.backoff_base * factor).min(self.backoff_cap)
    }

    /// The (action, reason) → substitute table.
    fn failure_table(&self, failed: &Action, reason: FailureReason) -> Option<(Action, String)> {
        match (failed.name.as_str(), reason) {
            ("file_edit", FailureReason::NotFound) => {
                let path = failed.str_param("path")?;
                let content = failed.str_param("replace_text")?;
                Some((
                    Action::new("file_write")
                        .with_param("path", path)
                        .with_param("content", content),
                    "file doesn't exist, creating it with the replacement text".into(),
                ))
            }
            ("file_edit", FailureReason::Conflict) => {
                let path = failed.str_param("path")?;
                Some((
                    Action::new("file_read").with_param("path", path),
                    "search text not found, reading the file to see its actual content".into(),
                ))
            }
            ("file_read", FailureReason::NotFound) => {
                let path = failed.str_param("path")?;
                Some((
                    Action::new("dir_list").with_param("path", parent_of(path)),
                    "file not found, listing the directory to see available files".into(),
                ))
            }
            ("file_read", FailureReason::WrongType) => {
                let path = failed.str_param("path")?;
                Some((
                    Action::new("dir_list").with_param("path", path),
                    "path is a directory, listing it instead".into(),
                ))
            }
            ("dir_list", FailureReason::WrongType) => {
                let path = failed.str_param("path")?;
                Some((
                    Action::new("file_read").with_param("path", path),
                    "path is a file, reading it instead".into(),
                ))
            }
            ("file_write", FailureReason::PermissionDenied) => {
                let path = failed.str_param("path")?;
                let content = failed.str_param("content")?;
                let alt = alternate_path(path);
                Some((
                    Action::new("file_write")
                        .with_param("path", alt.clone())
                        .with_param("content", content),
                    format!("permission denied, trying alternative path: {alt}"),
                ))
            }
            ("dir_create", FailureReason::NotFound) => {
                let path = failed.str_param("path")?;
                let parent = parent_of(path);
                if parent == path || parent == "." {
                    return None;
                }
                Some((
                    Action::new("dir_create").with_param("path", parent.clone()),
                    format!("creating parent directory first: {parent}"),
                ))
            }
            ("file_delete", FailureReason::NotFound) => {
                let path = failed.str_param("path")?;
                Some((
                    Action::new("dir_list").with_param("path", parent_of(path)),
                    "path not found, checking the directory contents".into(),
                ))
            }
            _ => None,
        }
    }

    /// Final admission checks shared by both proposal paths.
    fn admit(
        &self,
        substitute: Action,
        rationale: impl Into<String>,
        streak: Option<&FailureStreak>,
        ledger: &HistoryLedger,
    ) -> Option<FallbackDecision> {
        if let Some(streak) = streak
            && streak.already_tried(&substitute.to_string())
        {
            return None;
        }
        if !self.detector.check(&substitute, ledger).is_none() {
            return None;
        }
        Some(FallbackDecision::Substitute {
            action: substitute,
            rationale: rationale.into(),
        })
    }
}

/// Parent directory of a path, for listing fallbacks.
fn parent_of(path: &str) -> String {
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().into_owned(),
        _ => ".".into(),
    }
}

/// `notes.txt` → `notes_alt.txt`, for permission-denied rewrites.
fn alternate_path(path: &str) -> String {
    let p = Path::new(path);
    let stem = p.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let parent = p.parent().filter(|d| !d.as_os_str().is_empty());
    let alt_name = match p.extension() {
        Some(ext) => format!("{stem}_alt.{}", ext.to_string_lossy()),
        None => format!("{stem}_alt"),
    };
    match parent {
        Some(dir) => dir.join(alt_name).to_string_lossy().into_owned(),
        None => alt_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gyro_core::Outcome;

    fn policy() -> FallbackPolicy {
        FallbackPolicy::new(
            Duration::from_millis(1000),
            Duration::from_millis(16_000),
            3,
            LoopDetector::new(2, 40),
        )
    }

    fn edit(path: &str) -> Action {
        Action::new("file_edit")
            .with_param("path", path)
            .with_param("find_text", "old")
            .with_param("replace_text", "new text")
    }

    #[test]
    fn edit_not_found_substitutes_write_with_replacement() {
        let decision = policy()
            .propose_for_failure(
                &edit("notes.txt"),
                FailureReason::NotFound,
                &FailureStreak::default(),
                &HistoryLedger::new(),
            )
            .unwrap();

        match decision {
            FallbackDecision::Substitute { action, .. } => {
                assert_eq!(action.name, "file_write");
                assert_eq!(action.str_param("path"), Some("notes.txt"));
                assert_eq!(action.str_param("content"), Some("new text"));
            }
            other => panic!("Expected substitute, got {other:?}"),
        }
    }

    #[test]
    fn read_wrong_type_substitutes_listing() {
        let action = Action::new("file_read").with_param("path", "src");
        let decision = policy()
            .propose_for_failure(
                &action,
                FailureReason::WrongType,
                &FailureStreak::default(),
                &HistoryLedger::new(),
            )
            .unwrap();
        match decision {
            FallbackDecision::Substitute { action, .. } => {
                assert_eq!(action.name, "dir_list");
                assert_eq!(action.str_param("path"), Some("src"));
            }
            other => panic!("Expected substitute, got {other:?}"),
        }
    }

    #[test]
    fn unmapped_reason_declines() {
        let action = Action::new("file_read").with_param("path", "a.txt");
        assert!(
            policy()
                .propose_for_failure(
                    &action,
                    FailureReason::Conflict,
                    &FailureStreak::default(),
                    &HistoryLedger::new(),
                )
                .is_none()
        );
    }

    #[test]
    fn transient_failure_retries_with_doubling_delay() {
        let policy = policy();
        let action = Action::new("file_read").with_param("path", "a.txt");

        let mut streak = FailureStreak::default();
        let mut delays = Vec::new();
        for attempt in 0..3 {
            match policy
                .propose_for_failure(
                    &action,
                    FailureReason::Timeout,
                    &streak,
                    &HistoryLedger::new(),
                )
                .unwrap()
            {
                FallbackDecision::Retry { delay } => {
                    delays.push(delay);
                    streak.transient_retries = attempt + 1;
                }
                other => panic!("Expected retry, got {other:?}"),
            }
        }
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000)
            ]
        );

        // Retries exhausted: timeout has no substitution entry, so decline
        assert!(
            policy
                .propose_for_failure(
                    &action,
                    FailureReason::Timeout,
                    &streak,
                    &HistoryLedger::new(),
                )
                .is_none()
        );
    }

    #[test]
    fn backoff_delay_is_capped() {
        let policy = policy();
        assert_eq!(policy.backoff_delay(10), Duration::from_millis(16_000));
    }

    #[test]
    fn already_attempted_substitute_declined() {
        let policy = policy();
        let mut streak = FailureStreak::default();

        let first = policy
            .propose_for_failure(
                &edit("notes.txt"),
                FailureReason::NotFound,
                &streak,
                &HistoryLedger::new(),
            )
            .unwrap();
        let FallbackDecision::Substitute { action, .. } = first else {
            panic!("Expected substitute");
        };
        streak.note_substitute(action.to_string());

        assert!(
            policy
                .propose_for_failure(
                    &edit("notes.txt"),
                    FailureReason::NotFound,
                    &streak,
                    &HistoryLedger::new(),
                )
                .is_none()
        );
    }

    #[test]
    fn substitute_that_would_itself_loop_is_declined() {
        let policy = policy();
        // Ledger already has two identical dir_list(".") steps; the read
        // fallback would propose a third.
        let mut ledger = HistoryLedger::new();
        let listing = Action::new("dir_list").with_param("path", ".");
        ledger.append(listing.clone(), Outcome::success(""), false);
        ledger.append(listing.clone(), Outcome::success(""), false);

        let action = Action::new("file_read").with_param("path", "a.txt");
        assert!(
            policy
                .propose_for_failure(
                    &action,
                    FailureReason::NotFound,
                    &FailureStreak::default(),
                    &ledger,
                )
                .is_none()
        );
    }

    #[test]
    fn proposals_are_deterministic() {
        let policy = policy();
        let ledger = HistoryLedger::new();
        let streak = FailureStreak::default();
        let a = policy.propose_for_failure(&edit("x.md"), FailureReason::NotFound, &streak, &ledger);
        let b = policy.propose_for_failure(&edit("x.md"), FailureReason::NotFound, &streak, &ledger);
        assert_eq!(a, b);
    }

    #[test]
    fn loop_proposal_breaks_read_loop_with_listing() {
        let policy = policy();
        let action = Action::new("file_read").with_param("path", "src/a.txt");
        let decision = policy
            .propose_for_loop(&action, &LoopVerdict::Identical, &HistoryLedger::new())
            .unwrap();
        match decision {
            FallbackDecision::Substitute { action, rationale } => {
                assert_eq!(action.name, "dir_list");
                assert_eq!(action.str_param("path"), Some("src"));
                assert!(rationale.contains("repeating"));
            }
            other => panic!("Expected substitute, got {other:?}"),
        }
    }

    #[test]
    fn loop_proposal_declines_for_dir_list() {
        let policy = policy();
        let action = Action::new("dir_list").with_param("path", ".");
        assert!(
            policy
                .propose_for_loop(&action, &LoopVerdict::Identical, &HistoryLedger::new())
                .is_none()
        );
    }

    #[test]
    fn alternate_path_variants() {
        assert_eq!(alternate_path("notes.txt"), "notes_alt.txt");
        assert_eq!(alternate_path("a/b/notes.txt"), "a/b/notes_alt.txt");
        assert_eq!(alternate_path("Makefile"), "Makefile_alt");
    }

    #[test]
    fn parent_of_variants() {
        assert_eq!(parent_of("a/b/c.txt"), "a/b");
        assert_eq!(parent_of("c.txt"), ".");
    }
}
