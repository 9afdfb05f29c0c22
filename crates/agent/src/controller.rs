//! The loop controller — orchestration of one run.
//!
//! Each iteration: cooperative cancel check, budget check, oracle call,
//! parse, pre-execution loop check, execute (possibly a substitute),
//! record, track progress, decide continue / retry / substitute /
//! clarify / stop. Every terminal outcome carries a human-readable
//! summary; nothing is silently swallowed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use gyro_config::Limits;
use gyro_core::registry::ActionRegistry;
use gyro_core::{
    Action, EventBus, ExecutorPanic, HistoryLedger, Oracle, Outcome, RunEvent, Step, Turn,
};
use tracing::{debug, info, warn};

use crate::clarify::{ClarificationEscalator, Level};
use crate::detector::LoopDetector;
use crate::fallback::{FallbackDecision, FallbackPolicy};
use crate::parse::{ParsedTurn, parse_turn};
use crate::progress::{GoalCheck, KeywordGoal, Phase, ProgressTracker};
use crate::prompt;
use crate::state::{FailureStreak, TaskState};

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The task was completed
    Success { answer: String },
    /// The oracle kept repeating itself and no substitute was available
    AbandonedLoop,
    /// Too many consecutive unparseable responses
    AbandonedMalformed,
    /// The iteration budget ran out
    BudgetExhausted,
    /// An executor raised an unrecoverable condition
    FatalToolError { detail: String },
    /// The run was cancelled cooperatively
    Cancelled,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Success { .. } => "success",
            RunOutcome::AbandonedLoop => "abandoned-loop",
            RunOutcome::AbandonedMalformed => "abandoned-malformed",
            RunOutcome::BudgetExhausted => "budget-exhausted",
            RunOutcome::FatalToolError { .. } => "fatal-tool-error",
            RunOutcome::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The final transcript of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Unique id for this run, for transcript correlation
    pub run_id: String,
    pub outcome: RunOutcome,
    /// Human-readable account: what was attempted, what succeeded, why
    /// execution stopped
    pub summary: String,
    /// Every recorded step, handed onward to an external transcript store
    pub steps: Vec<Step>,
    /// Iterations consumed (malformed responses excluded)
    pub iterations: usize,
    /// Clarification levels issued, in order
    pub guidance_levels: Vec<Level>,
}

/// Drives Thought → Action → Observation cycles to a terminal outcome.
pub struct LoopController {
    oracle: Arc<dyn Oracle>,
    registry: Arc<ActionRegistry>,
    limits: Limits,
    events: Arc<EventBus>,
    goal: Arc<dyn GoalCheck>,
    cancel: Arc<AtomicBool>,
}

impl LoopController {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        registry: Arc<ActionRegistry>,
        limits: Limits,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            oracle,
            registry,
            limits,
            events,
            goal: Arc::new(KeywordGoal),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replace the goal-satisfaction heuristic.
    pub fn with_goal_check(mut self, goal: Arc<dyn GoalCheck>) -> Self {
        self.goal = goal;
        self
    }

    /// A handle that cancels the run before its next iteration starts.
    ///
    /// An in-flight action is allowed to finish; the flag is checked at
    /// the top of each iteration, before the next oracle call.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Run a task to a terminal outcome.
    pub async fn run(&self, task: &str) -> gyro_core::Result<RunReport> {
        let detector = LoopDetector::new(
            self.limits.identical_threshold,
            self.limits.signature_value_limit,
        );
        let policy = FallbackPolicy::new(
            Duration::from_millis(self.limits.backoff_base_ms),
            Duration::from_millis(self.limits.backoff_cap_ms),
            self.limits.transient_max_retries,
            detector.clone(),
        );
        let tracker = ProgressTracker::new(
            self.limits.base_iterations,
            self.limits.max_budget,
            self.limits.stuck_after,
            self.limits.extension_step,
            self.limits.extension_margin,
            self.goal.clone(),
        );
        let mut escalator = ClarificationEscalator::new();
        let mut ledger = HistoryLedger::new();
        let mut state = TaskState::new();
        let mut streak = FailureStreak::default();

        let run_id = uuid::Uuid::new_v4().to_string();
        let complexity = tracker.classify(task);
        state.complexity = Some(complexity);
        state.budget = tracker.budget_for(complexity);

        info!(
            run_id = %run_id,
            oracle = self.oracle.name(),
            %complexity,
            budget = state.budget,
            "Run starting"
        );

        let mut turns = vec![
            Turn::system(prompt::system_prompt(&self.registry)),
            Turn::user(prompt::task_prompt(task)),
        ];
        let mut guidance_levels: Vec<Level> = Vec::new();
        let mut last_success: Option<String> = None;

        let outcome: RunOutcome = 'run: loop {
            if self.cancel.load(Ordering::Relaxed) {
                break 'run RunOutcome::Cancelled;
            }
            if state.iterations >= state.budget {
                break 'run RunOutcome::BudgetExhausted;
            }

            self.events.publish(RunEvent::OracleAsked {
                iteration: state.iterations,
            });
            let raw = self.oracle.ask(&turns).await?;
            turns.push(Turn::assistant(&raw));

            let proposed = match parse_turn(&raw) {
                ParsedTurn::FinalAnswer(answer) => {
                    escalator.on_parsed();
                    break 'run RunOutcome::Success { answer };
                }
                ParsedTurn::Malformed { issues } => {
                    let guidance = escalator.on_malformed(&issues);
                    debug!(
                        level = guidance.level.index(),
                        attempts = escalator.consecutive_malformed(),
                        "Malformed oracle response, escalating clarification"
                    );
                    self.events.publish(RunEvent::ClarificationIssued {
                        level: guidance.level.index(),
                    });
                    guidance_levels.push(guidance.level);
                    turns.push(Turn::user(&guidance.text));
                    if escalator.consecutive_malformed() >= self.limits.max_malformed {
                        break 'run RunOutcome::AbandonedMalformed;
                    }
                    // A malformed response does not consume budget
                    continue;
                }
                ParsedTurn::Act(action) => {
                    escalator.on_parsed();
                    action
                }
            };

            // ── Pre-execution repetition check ──
            let verdict = detector.check(&proposed, &ledger);
            let (action, is_fallback, mut rationale) = if verdict.is_none() {
                (proposed, false, None)
            } else {
                let description = verdict.describe(&proposed);
                warn!(%description, "Repetition detected before execution");
                self.events.publish(RunEvent::LoopDetected {
                    description: description.clone(),
                });
                match policy.propose_for_loop(&proposed, &verdict, &ledger) {
                    Some(FallbackDecision::Substitute { action, rationale }) => {
                        self.events.publish(RunEvent::FallbackApplied {
                            from: proposed.name.clone(),
                            to: action.name.clone(),
                        });
                        (action, true, Some(rationale))
                    }
                    _ => break 'run RunOutcome::AbandonedLoop,
                }
            };

            // ── Execute, with at most one recovery attempt ──
            let mut final_action = action.clone();
            let mut outcome = match self
                .execute_and_record(task, &action, is_fallback, &tracker, &mut ledger, &mut state, &mut streak)
                .await
            {
                Ok(outcome) => outcome,
                Err(panic) => {
                    break 'run RunOutcome::FatalToolError {
                        detail: panic.to_string(),
                    };
                }
            };

            if let Outcome::Failure { reason, .. } = &outcome
                && !is_fallback
            {
                match policy.propose_for_failure(&action, *reason, &streak, &ledger) {
                    Some(FallbackDecision::Retry { delay }) => {
                        debug!(
                            delay_ms = delay.as_millis() as u64,
                            "Transient failure, backing off before retrying"
                        );
                        tokio::time::sleep(delay).await;
                        streak.transient_retries += 1;
                        match self
                            .execute_and_record(task, &action, false, &tracker, &mut ledger, &mut state, &mut streak)
                            .await
                        {
                            Ok(retried) => outcome = retried,
                            Err(panic) => {
                                break 'run RunOutcome::FatalToolError {
                                    detail: panic.to_string(),
                                };
                            }
                        }
                    }
                    Some(FallbackDecision::Substitute {
                        action: substitute,
                        rationale: why,
                    }) => {
                        self.events.publish(RunEvent::FallbackApplied {
                            from: action.name.clone(),
                            to: substitute.name.clone(),
                        });
                        streak.note_substitute(substitute.to_string());
                        // A failing substitute is recorded but never
                        // re-substituted
                        match self
                            .execute_and_record(task, &substitute, true, &tracker, &mut ledger, &mut state, &mut streak)
                            .await
                        {
                            Ok(sub_outcome) => {
                                outcome = sub_outcome;
                                final_action = substitute;
                                rationale = Some(why);
                            }
                            Err(panic) => {
                                break 'run RunOutcome::FatalToolError {
                                    detail: panic.to_string(),
                                };
                            }
                        }
                    }
                    None => {}
                }
            }

            // ── Observation back to the oracle ──
            let observation = match &outcome {
                Outcome::Success { content, .. } => {
                    last_success = Some(content.clone());
                    let mut obs = format!("Observation: {content}");
                    if let Some(why) = &rationale {
                        obs.push_str(&format!(
                            "\n(Substituted {}: {why})",
                            final_action.name
                        ));
                    }
                    obs
                }
                Outcome::Failure { reason, message } => {
                    format!(
                        "Observation: {message} (Error: {reason})\n\
                         Analyze the error and try a different approach."
                    )
                }
            };
            turns.push(Turn::user(observation));

            state.iterations += 1;

            if state.phase == Phase::Completing {
                let answer = last_success.clone().unwrap_or_default();
                break 'run RunOutcome::Success { answer };
            }
        };

        let summary = summarize(&outcome, &ledger, &state);
        self.events.publish(RunEvent::RunFinished {
            outcome: outcome.label().into(),
        });
        info!(
            run_id = %run_id,
            outcome = outcome.label(),
            iterations = state.iterations,
            "Run finished"
        );

        Ok(RunReport {
            run_id,
            outcome,
            summary,
            steps: ledger.steps().to_vec(),
            iterations: state.iterations,
            guidance_levels,
        })
    }

    /// Invoke one action, record the step, update counters, feed the
    /// tracker, and publish events.
    #[allow(clippy::too_many_arguments)]
    async fn execute_and_record(
        &self,
        task: &str,
        action: &Action,
        is_fallback: bool,
        tracker: &ProgressTracker,
        ledger: &mut HistoryLedger,
        state: &mut TaskState,
        streak: &mut FailureStreak,
    ) -> Result<Outcome, ExecutorPanic> {
        let started = Instant::now();
        let outcome = self.registry.invoke(action).await?;
        let duration_ms = started.elapsed().as_millis() as u64;
        let success = outcome.is_success();

        debug!(action = %action, success, is_fallback, duration_ms, "Action executed");
        self.events.publish(RunEvent::ActionExecuted {
            name: action.name.clone(),
            success,
            fallback: is_fallback,
            duration_ms,
            timestamp: Utc::now(),
        });

        let step = ledger.append(action.clone(), outcome.clone(), is_fallback).clone();
        state.note_step(success, is_fallback);
        if success {
            // Any success ends the current failure streak
            streak.clear();
        }

        let phase_before = state.phase;
        let report = tracker.update(task, &step, state);
        if report.phase != phase_before {
            debug!(phase = %report.phase, "Progress phase changed");
            self.events.publish(RunEvent::PhaseChanged {
                phase: report.phase.to_string(),
            });
        }
        if report.extended {
            info!(new_budget = report.budget, "Budget extension granted");
            self.events.publish(RunEvent::BudgetExtended {
                new_budget: report.budget,
            });
        }

        Ok(outcome)
    }
}

/// Build the human-readable terminal summary.
fn summarize(outcome: &RunOutcome, ledger: &HistoryLedger, state: &TaskState) -> String {
    let total = ledger.len();
    let succeeded = ledger.steps().iter().filter(|s| s.outcome.is_success()).count();
    let failed = total - succeeded;
    let fallbacks = ledger.steps().iter().filter(|s| s.is_fallback).count();

    let mut summary = format!(
        "Attempted {total} action(s) over {} iteration(s): {succeeded} succeeded, \
         {failed} failed, {fallbacks} via fallback.",
        state.iterations
    );

    match outcome {
        RunOutcome::Success { answer } => {
            summary.push_str(" Task completed");
            if !answer.is_empty() {
                summary.push_str(&format!(": {answer}"));
            } else {
                summary.push('.');
            }
        }
        RunOutcome::AbandonedLoop => {
            summary.push_str(
                " Stopped: the oracle kept repeating the same actions and no \
                 alternative was available.",
            );
        }
        RunOutcome::AbandonedMalformed => {
            summary.push_str(
                " Stopped: repeated responses could not be parsed into an \
                 action despite escalating guidance.",
            );
        }
        RunOutcome::BudgetExhausted => {
            summary.push_str(&format!(
                " Stopped: the iteration budget ({}) was exhausted.",
                state.budget
            ));
            let recent: Vec<String> = ledger
                .steps()
                .iter()
                .rev()
                .filter(|s| s.outcome.is_success())
                .take(3)
                .map(|s| s.action.name.clone())
                .collect();
            if recent.is_empty() {
                summary.push_str(" No action succeeded.");
            } else {
                summary.push_str(&format!(
                    " Partial progress, most recent successes: {}.",
                    recent.join(", ")
                ));
            }
        }
        RunOutcome::FatalToolError { detail } => {
            summary.push_str(&format!(
                " Stopped: an executor raised an unrecoverable condition: {detail}"
            ));
        }
        RunOutcome::Cancelled => {
            summary.push_str(" Stopped: cancelled before the next oracle call.");
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        FailingExecutor, PanickingExecutor, ScriptedOracle, action_turn, final_answer_turn,
    };
    use gyro_core::FailureReason;

    fn limits() -> Limits {
        Limits {
            backoff_base_ms: 1,
            backoff_cap_ms: 8,
            ..Limits::default()
        }
    }

    fn controller(oracle: ScriptedOracle, registry: ActionRegistry) -> LoopController {
        LoopController::new(
            Arc::new(oracle),
            Arc::new(registry),
            limits(),
            Arc::new(EventBus::default()),
        )
    }

    fn fs_registry() -> ActionRegistry {
        gyro_tools::default_registry()
    }

    #[tokio::test]
    async fn final_answer_terminates_with_success() {
        let oracle = ScriptedOracle::new(vec![final_answer_turn("Created the file as requested.")]);
        let report = controller(oracle, fs_registry())
            .run("say hello")
            .await
            .unwrap();

        assert_eq!(
            report.outcome,
            RunOutcome::Success {
                answer: "Created the file as requested.".into()
            }
        );
        assert!(report.steps.is_empty());
        assert_eq!(report.iterations, 0);
    }

    #[tokio::test]
    async fn three_malformed_responses_abandon_with_escalating_guidance() {
        let oracle = ScriptedOracle::new(vec![
            "I think we should probably look at the files.".into(),
            "Sure, happy to help!".into(),
            "Let me think about this differently.".into(),
        ]);
        let report = controller(oracle, fs_registry())
            .run("do something")
            .await
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::AbandonedMalformed);
        assert_eq!(
            report.guidance_levels,
            vec![Level::Basic, Level::Detailed, Level::Simplified]
        );
        // Malformed responses never consume budget or produce steps
        assert_eq!(report.iterations, 0);
        assert!(report.steps.is_empty());
    }

    #[tokio::test]
    async fn malformed_then_recovery_resets_escalation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "content").unwrap();

        let oracle = ScriptedOracle::new(vec![
            "no structure here at all".into(),
            action_turn("file_read", &[("path", path.to_str().unwrap())]),
            final_answer_turn("done"),
        ]);
        let report = controller(oracle, fs_registry()).run("inspect").await.unwrap();

        assert!(report.outcome.is_success());
        assert_eq!(report.guidance_levels, vec![Level::Basic]);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.steps.len(), 1);
    }

    #[tokio::test]
    async fn edit_on_missing_file_falls_back_to_write_and_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let path_str = path.to_str().unwrap();

        let oracle = ScriptedOracle::new(vec![action_turn(
            "file_edit",
            &[
                ("path", path_str),
                ("find_text", "draft"),
                ("replace_text", "final copy"),
            ],
        )]);
        let task = format!("Replace 'draft' with 'final copy' in {path_str}");
        let report = controller(oracle, fs_registry()).run(&task).await.unwrap();

        assert!(report.outcome.is_success(), "outcome: {:?}", report.outcome);
        assert_eq!(report.steps.len(), 2);

        // First step: the original edit failing with not-found
        assert_eq!(report.steps[0].action.name, "file_edit");
        assert_eq!(
            report.steps[0].outcome.failure_reason(),
            Some(FailureReason::NotFound)
        );
        assert!(!report.steps[0].is_fallback);

        // Second step: the substituted write carrying the replacement text
        assert_eq!(report.steps[1].action.name, "file_write");
        assert!(report.steps[1].is_fallback);
        assert!(report.steps[1].outcome.is_success());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "final copy");
    }

    #[tokio::test]
    async fn third_identical_proposal_never_executes_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "data").unwrap();
        let path_str = path.to_str().unwrap();

        let read = action_turn("file_read", &[("path", path_str)]);
        let oracle = ScriptedOracle::new(vec![
            read.clone(),
            read.clone(),
            read,
            final_answer_turn("done"),
        ]);
        let report = controller(oracle, fs_registry())
            .run("look at a file")
            .await
            .unwrap();

        assert!(report.outcome.is_success());
        assert_eq!(report.steps.len(), 3);
        assert_eq!(report.steps[0].action.name, "file_read");
        assert_eq!(report.steps[1].action.name, "file_read");
        // The third proposal was substituted, not executed as-is
        assert_eq!(report.steps[2].action.name, "dir_list");
        assert!(report.steps[2].is_fallback);
    }

    #[tokio::test]
    async fn alternating_pattern_without_substitute_abandons() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "data").unwrap();
        let file_str = file.to_str().unwrap();
        let dir_str = dir.path().to_str().unwrap();

        let read = action_turn("file_read", &[("path", file_str)]);
        let list = action_turn("dir_list", &[("path", dir_str)]);
        let oracle = ScriptedOracle::new(vec![read.clone(), list.clone(), read, list]);

        let report = controller(oracle, fs_registry())
            .run("poke around")
            .await
            .unwrap();

        // A,B,A executed; proposing B again is alternating, and dir_list
        // has no loop substitute.
        assert_eq!(report.outcome, RunOutcome::AbandonedLoop);
        assert_eq!(report.steps.len(), 3);
        assert!(report.summary.contains("repeating"));
    }

    #[tokio::test]
    async fn unmapped_failures_run_to_budget_exhaustion_while_stuck() {
        let mut registry = ActionRegistry::new();
        registry.register(Box::new(FailingExecutor::new(
            "probe",
            FailureReason::Unknown,
        )));

        // Ten probes with distinct targets: no repetition pattern, every
        // one fails, no fallback entry for reason `unknown`.
        let mut script: Vec<String> = (0..10)
            .map(|i| action_turn("probe", &[("target", format!("t{i}").as_str())]))
            .collect();
        script.push(final_answer_turn("never reached"));

        let events = Arc::new(EventBus::default());
        let controller = LoopController::new(
            Arc::new(ScriptedOracle::new(script)),
            Arc::new(registry),
            limits(),
            events.clone(),
        );
        let mut rx = events.subscribe();

        let report = controller.run("probe the system").await.unwrap();

        assert_eq!(report.outcome, RunOutcome::BudgetExhausted);
        assert_eq!(report.iterations, 10);
        assert_eq!(report.steps.len(), 10);
        assert!(report.steps.iter().all(|s| !s.outcome.is_success()));
        assert!(report.summary.contains("budget"));
        assert!(report.summary.contains("No action succeeded"));

        // Stuck runs never earn a budget extension
        let mut extended = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event.as_ref(), RunEvent::BudgetExtended { .. }) {
                extended += 1;
            }
        }
        assert_eq!(extended, 0);
    }

    #[tokio::test]
    async fn complex_run_gets_exactly_one_extension() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..30 {
            std::fs::write(dir.path().join(format!("f{i}.txt")), format!("data {i}")).unwrap();
        }

        // Complex classification: enumerated steps plus several files.
        let task = "Review the project:\n\
                    1. Inspect main.py and utils.py for dead code\n\
                    2. Check README.md and config.yaml for stale entries\n\
                    3. Then summarize everything you found across the files";

        let mut script: Vec<String> = (0..30)
            .map(|i| {
                action_turn(
                    "file_read",
                    &[("path", dir.path().join(format!("f{i}.txt")).to_str().unwrap())],
                )
            })
            .collect();
        script.push(final_answer_turn("never reached"));

        let events = Arc::new(EventBus::default());
        let controller = LoopController::new(
            Arc::new(ScriptedOracle::new(script)),
            Arc::new(fs_registry()),
            limits(),
            events.clone(),
        );
        let mut rx = events.subscribe();

        let report = controller.run(task).await.unwrap();

        // Budget 25 (complex), extended once to 30, then exhausted.
        assert_eq!(report.outcome, RunOutcome::BudgetExhausted);
        assert_eq!(report.iterations, 30);

        let mut extensions = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let RunEvent::BudgetExtended { new_budget } = event.as_ref() {
                extensions.push(*new_budget);
            }
        }
        assert_eq!(extensions, vec![30]);
    }

    #[tokio::test]
    async fn transient_failure_retries_same_action_once_per_iteration() {
        let mut registry = ActionRegistry::new();
        registry.register(Box::new(FailingExecutor::new(
            "probe",
            FailureReason::Timeout,
        )));

        let mut limits = limits();
        limits.base_iterations = 1;

        let controller = LoopController::new(
            Arc::new(ScriptedOracle::new(vec![action_turn(
                "probe",
                &[("target", "x")],
            )])),
            Arc::new(registry),
            limits,
            Arc::new(EventBus::default()),
        );

        let report = controller.run("probe").await.unwrap();

        assert_eq!(report.outcome, RunOutcome::BudgetExhausted);
        // One oracle turn, two executions: the original and its backoff retry
        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.steps[0].action, report.steps[1].action);
    }

    #[tokio::test]
    async fn executor_panic_is_fatal() {
        let mut registry = ActionRegistry::new();
        registry.register(Box::new(PanickingExecutor::new("broken")));

        let oracle = ScriptedOracle::new(vec![action_turn("broken", &[("target", "x")])]);
        let report = controller(oracle, registry).run("break").await.unwrap();

        match &report.outcome {
            RunOutcome::FatalToolError { detail } => {
                assert!(detail.contains("broken"));
            }
            other => panic!("Expected fatal tool error, got {other:?}"),
        }
        assert!(report.summary.contains("unrecoverable"));
    }

    #[tokio::test]
    async fn cancellation_stops_before_the_first_oracle_call() {
        // An empty script panics if asked — cancellation must win first.
        let controller = controller(ScriptedOracle::new(vec![]), fs_registry());
        controller.cancel_handle().store(true, Ordering::Relaxed);

        let report = controller.run("anything").await.unwrap();
        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(report.iterations, 0);
    }

    #[tokio::test]
    async fn goal_satisfied_write_ends_the_run_early() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        let path_str = path.to_str().unwrap();

        let oracle = ScriptedOracle::new(vec![action_turn(
            "file_write",
            &[("path", path_str), ("content", "hi there")],
        )]);
        let task = format!("Create {path_str} containing a greeting");
        let report = controller(oracle, fs_registry()).run(&task).await.unwrap();

        match &report.outcome {
            RunOutcome::Success { answer } => {
                assert!(answer.contains("Successfully wrote"));
            }
            other => panic!("Expected success, got {other:?}"),
        }
        assert_eq!(report.iterations, 1);
    }
}
