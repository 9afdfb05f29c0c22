//! Run event system — decoupled progress reporting.
//!
//! The loop controller publishes events as a run unfolds; observers (the
//! CLI narrator, an external transcript logger) subscribe and filter for
//! what they care about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All run events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    /// The oracle was asked for the next step
    OracleAsked { iteration: usize },

    /// An action was executed
    ActionExecuted {
        name: String,
        success: bool,
        fallback: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A repetition pattern was detected before execution
    LoopDetected { description: String },

    /// The fallback policy substituted one action for another
    FallbackApplied { from: String, to: String },

    /// Corrective guidance was injected for a malformed response
    ClarificationIssued { level: u8 },

    /// The progress phase changed
    PhaseChanged { phase: String },

    /// The one-time budget extension was granted
    BudgetExtended { new_budget: usize },

    /// The run reached a terminal outcome
    RunFinished { outcome: String },
}

/// A broadcast-based event bus for run events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<RunEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: RunEvent) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RunEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
