pub mod chat;
pub mod run;
pub mod tools;

use std::sync::Arc;

use gyro_agent::LoopController;
use gyro_config::GyroConfig;
use gyro_core::{EventBus, RunEvent};
use gyro_oracle::HttpOracle;

/// Wire a controller from configuration, sharing one event bus.
pub fn build_controller(config: &GyroConfig, events: Arc<EventBus>) -> LoopController {
    let oracle = Arc::new(HttpOracle::from_config(&config.oracle));
    let registry = Arc::new(gyro_tools::default_registry());
    LoopController::new(oracle, registry, config.limits.clone(), events)
}

/// Spawn a task that narrates run events to stderr.
pub fn spawn_narrator(events: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event.as_ref() {
                RunEvent::OracleAsked { iteration } => {
                    eprintln!("  [{}] thinking...", iteration + 1);
                }
                RunEvent::ActionExecuted {
                    name,
                    success,
                    fallback,
                    duration_ms,
                    ..
                } => {
                    let mark = if *success { "ok" } else { "failed" };
                    let via = if *fallback { " (fallback)" } else { "" };
                    eprintln!("      {name}{via}: {mark} in {duration_ms}ms");
                }
                RunEvent::LoopDetected { description } => {
                    eprintln!("      loop detected: {description}");
                }
                RunEvent::FallbackApplied { from, to } => {
                    eprintln!("      substituting {to} for {from}");
                }
                RunEvent::ClarificationIssued { level } => {
                    eprintln!("      clarifying oracle output (level {level})");
                }
                RunEvent::PhaseChanged { phase } => {
                    eprintln!("      phase: {phase}");
                }
                RunEvent::BudgetExtended { new_budget } => {
                    eprintln!("      budget extended to {new_budget}");
                }
                RunEvent::RunFinished { .. } => break,
            }
        }
    })
}
