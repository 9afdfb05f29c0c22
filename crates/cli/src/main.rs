//! Gyro CLI — the main entry point.
//!
//! Commands:
//! - `run`    — Execute a single task to completion
//! - `chat`   — Interactive mode with conversation memory
//! - `tools`  — List the registered action capabilities

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "gyro",
    about = "Gyro — self-correcting autonomous task runner",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a single task to completion
    Run {
        /// The task to perform
        task: String,

        /// Override the configured model
        #[arg(short, long)]
        model: Option<String>,

        /// Override the base iteration budget
        #[arg(long)]
        max_iterations: Option<usize>,
    },

    /// Interactive mode: one task per line, shared conversation memory
    Chat,

    /// List the registered action capabilities
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            task,
            model,
            max_iterations,
        } => commands::run::run(task, model, max_iterations).await,
        Commands::Chat => commands::chat::run().await,
        Commands::Tools => commands::tools::run(),
    }
}
