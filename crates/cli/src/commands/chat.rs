//! `gyro chat` — interactive mode.
//!
//! One task per line. The control state (budget, phases, clarification
//! level, history ledger) is rebuilt per task inside the controller;
//! what persists across tasks is the conversation memory kept here —
//! the external-collaborator seam for memory storage.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use gyro_config::GyroConfig;
use gyro_core::EventBus;

use super::{build_controller, spawn_narrator};

/// Bounded conversation memory for chat mode.
///
/// Keeps (task, summary) pairs so each new task can be prefixed with what
/// already happened in the session.
pub struct ChatMemory {
    entries: Vec<(String, String)>,
    max_entries: usize,
}

impl ChatMemory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
        }
    }

    pub fn record(&mut self, task: &str, summary: &str) {
        self.entries.push((task.to_string(), summary.to_string()));
        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
    }

    /// Fold the session history into the next task's text.
    pub fn contextualize(&self, task: &str) -> String {
        if self.entries.is_empty() {
            return task.to_string();
        }
        let mut context = String::from("Earlier in this session:\n");
        for (prior_task, summary) in &self.entries {
            context.push_str(&format!("- Task: {prior_task}\n  Result: {summary}\n"));
        }
        format!("{context}\nCurrent task: {task}")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub async fn run() -> anyhow::Result<()> {
    let config = GyroConfig::load().context("Failed to load configuration")?;

    println!();
    println!("  Gyro — interactive mode");
    println!("  Oracle:  {} ({})", config.oracle.base_url, config.oracle.model);
    println!("  Type a task and press Enter. Type 'exit' to quit.");
    println!();

    let mut memory = ChatMemory::new(20);
    let stdin = std::io::stdin();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let task = line.trim();
        if task.is_empty() {
            continue;
        }
        if task.eq_ignore_ascii_case("exit") || task.eq_ignore_ascii_case("quit") {
            break;
        }

        // Fresh control state per task; conversation memory persists
        let events = Arc::new(EventBus::default());
        let controller = build_controller(&config, events.clone());
        let narrator = spawn_narrator(&events);

        match controller.run(&memory.contextualize(task)).await {
            Ok(report) => {
                let _ = narrator.await;
                println!();
                println!("  {}", report.summary);
                println!();
                memory.record(task, &report.summary);
            }
            Err(e) => {
                narrator.abort();
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    Ok(())
}
