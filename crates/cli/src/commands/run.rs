//! `gyro run` — execute a single task to completion.

use std::sync::Arc;

use anyhow::Context;
use gyro_config::GyroConfig;
use gyro_core::EventBus;

use super::{build_controller, spawn_narrator};

pub async fn run(
    task: String,
    model: Option<String>,
    max_iterations: Option<usize>,
) -> anyhow::Result<()> {
    let mut config = GyroConfig::load().context("Failed to load configuration")?;
    if let Some(model) = model {
        config.oracle.model = model;
    }
    if let Some(max) = max_iterations {
        config.limits.base_iterations = max;
        config.limits.max_budget = config.limits.max_budget.max(max);
    }

    let events = Arc::new(EventBus::default());
    let controller = build_controller(&config, events.clone());
    let narrator = spawn_narrator(&events);

    let report = controller
        .run(&task)
        .await
        .context("Run failed before reaching a terminal outcome")?;
    let _ = narrator.await;

    println!();
    println!("{}", report.summary);

    if report.outcome.is_success() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
