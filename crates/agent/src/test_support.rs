//! Shared test helpers for control-core tests.

use async_trait::async_trait;
use gyro_core::oracle::{Oracle, OracleError, Turn};
use gyro_core::registry::{ActionExecutor, Capability, ParamKind, ParamSpec};
use gyro_core::{ExecutorPanic, FailureReason, Outcome};
use std::sync::Mutex;

/// An oracle that replays a scripted sequence of responses.
///
/// Each call to `ask` returns the next response in the queue. Panics if
/// more calls are made than responses provided.
pub struct ScriptedOracle {
    responses: Mutex<Vec<String>>,
    call_count: Mutex<usize>,
}

impl ScriptedOracle {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
        }
    }

    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn ask(&self, _turns: &[Turn]) -> Result<String, OracleError> {
        let mut count = self.call_count.lock().unwrap();
        let responses = self.responses.lock().unwrap();

        if *count >= responses.len() {
            panic!(
                "ScriptedOracle: no more responses (call #{}, have {})",
                *count,
                responses.len()
            );
        }

        let response = responses[*count].clone();
        *count += 1;
        Ok(response)
    }
}

/// Build a well-formed Thought/Action/Action Input response.
pub fn action_turn(name: &str, params: &[(&str, &str)]) -> String {
    let mut map = serde_json::Map::new();
    for (k, v) in params {
        map.insert((*k).into(), (*v).into());
    }
    let input = serde_json::to_string(&serde_json::Value::Object(map)).unwrap();
    format!("Thought: taking the next step.\nAction: {name}\nAction Input: {input}")
}

/// Build a `Final Answer:` response.
pub fn final_answer_turn(answer: &str) -> String {
    format!("Thought: the task is done.\nFinal Answer: {answer}")
}

/// An executor that always fails with a fixed reason.
pub struct FailingExecutor {
    name: String,
    reason: FailureReason,
}

impl FailingExecutor {
    pub fn new(name: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            name: name.into(),
            reason,
        }
    }
}

#[async_trait]
impl ActionExecutor for FailingExecutor {
    fn capability(&self) -> Capability {
        Capability {
            name: self.name.clone(),
            description: "Always fails (test executor)".into(),
            params: vec![ParamSpec::optional("target", ParamKind::Text)],
        }
    }

    async fn execute(
        &self,
        _params: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Outcome, ExecutorPanic> {
        Ok(Outcome::failure(self.reason, "scripted failure"))
    }
}

/// An executor that raises an unrecoverable condition.
pub struct PanickingExecutor {
    name: String,
}

impl PanickingExecutor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl ActionExecutor for PanickingExecutor {
    fn capability(&self) -> Capability {
        Capability {
            name: self.name.clone(),
            description: "Always raises an unrecoverable condition (test executor)".into(),
            params: vec![ParamSpec::optional("target", ParamKind::Text)],
        }
    }

    async fn execute(
        &self,
        _params: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Outcome, ExecutorPanic> {
        Err(ExecutorPanic::new(&self.name, "scripted invariant violation"))
    }
}
