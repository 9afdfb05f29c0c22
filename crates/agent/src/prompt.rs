//! System and task prompt assembly.
//!
//! The oracle is told the exact response shape once, up front; the
//! clarification escalator repeats and sharpens it only when responses
//! stop parsing.

use gyro_core::registry::ActionRegistry;

/// Build the system prompt from the registered capabilities.
pub fn system_prompt(registry: &ActionRegistry) -> String {
    let mut actions = String::new();
    for cap in registry.capabilities() {
        let params: Vec<String> = cap
            .params
            .iter()
            .map(|p| format!("\"{}\": {:?}", p.name, p.kind))
            .collect();
        actions.push_str(&format!(
            "- {}: {}\n  Parameters: {{{}}}\n",
            cap.name,
            cap.description,
            params.join(", ")
        ));
    }

    format!(
        "You are a task execution agent that interacts with the filesystem to \
         complete user tasks.\n\n\
         You must respond with ONLY this structure:\n\n\
         Thought: [your reasoning about what to do next]\n\
         Action: [action_name]\n\
         Action Input: [JSON parameters for the action]\n\n\
         Available actions:\n{actions}\n\
         When the task is fully complete, respond with:\n\
         Final Answer: [summary of what was accomplished]\n\n\
         CRITICAL RULES:\n\
         - NEVER generate \"Observation:\" - the system provides this\n\
         - STOP after \"Action Input:\" and wait for the real execution result\n\
         - Use only the available actions - do not make up actions\n\
         - Format action inputs as valid JSON with proper escaping\n\
         - If an action fails, analyze the real error and try a different approach\n"
    )
}

/// Build the opening task turn.
pub fn task_prompt(task: &str) -> String {
    format!(
        "Task: {task}\n\n\
         Complete this task using the available actions. Take one action at \
         a time and wait for each observation before deciding the next step.\n"
    )
}
