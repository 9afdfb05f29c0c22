//! Oracle response parsing.
//!
//! Turns raw oracle text into an action, a final answer, or a malformed
//! verdict carrying the specific issues found — the escalator echoes
//! those back so the oracle can fix its format.

use gyro_core::Action;
use regex::Regex;
use std::sync::LazyLock;

static ACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^\s*Action:\s*(.+)$").expect("action regex"));

static OBSERVATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*Observation:\s*\S").expect("observation regex")
});

static FINAL_ANSWER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Final Answer:").expect("final answer regex"));

static INPUT_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Action Input:").expect("input marker regex"));

/// Action names the oracle emits when it means "nothing" — never valid.
const PLACEHOLDER_NAMES: &[&str] = &[
    "none", "null", "n/a", "na", "nothing", "stop", "end", "finish", "complete",
];

/// The three shapes an oracle turn can take.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedTurn {
    /// A well-formed action proposal
    Act(Action),
    /// The oracle declared the task done
    FinalAnswer(String),
    /// Nothing parseable; `issues` feed the clarification escalator
    Malformed { issues: Vec<String> },
}

/// Parse one oracle response.
pub fn parse_turn(text: &str) -> ParsedTurn {
    if let Some(m) = FINAL_ANSWER_RE.find(text) {
        let answer = text[m.end()..].trim().to_string();
        return ParsedTurn::FinalAnswer(answer);
    }

    let Some(action_match) = ACTION_RE.captures(text) else {
        return ParsedTurn::Malformed {
            issues: detect_issues(text),
        };
    };

    let name = action_match[1]
        .trim()
        .trim_matches(|c| c == '"' || c == '`' || c == '\'')
        .to_string();

    if PLACEHOLDER_NAMES.contains(&name.to_lowercase().as_str()) {
        return ParsedTurn::Malformed {
            issues: vec![format!("'{name}' is not an action name")],
        };
    }

    match extract_input_object(text) {
        Some(Ok(params)) => ParsedTurn::Act(Action { name, params }),
        Some(Err(issue)) => ParsedTurn::Malformed {
            issues: {
                let mut issues = vec![issue];
                issues.extend(detect_issues(text));
                issues.truncate(3);
                issues
            },
        },
        // No Action Input at all: an action with no parameters
        None => ParsedTurn::Act(Action {
            name,
            params: serde_json::Map::new(),
        }),
    }
}

/// Extract the JSON object following `Action Input:`.
///
/// Parses from the first `{` with a streaming deserializer so nested
/// braces inside string values don't truncate the object.
fn extract_input_object(
    text: &str,
) -> Option<Result<serde_json::Map<String, serde_json::Value>, String>> {
    let after = &text[INPUT_MARKER_RE.find(text)?.end()..];
    let Some(brace) = after.find('{') else {
        return Some(Err("Action Input is not a JSON object".into()));
    };

    let mut stream = serde_json::Deserializer::from_str(&after[brace..]).into_iter();
    match stream.next() {
        Some(Ok(serde_json::Value::Object(map))) => Some(Ok(map)),
        Some(Ok(_)) => Some(Err("Action Input must be a JSON object".into())),
        Some(Err(e)) => Some(Err(format!("Action Input is not valid JSON: {e}"))),
        None => Some(Err("Action Input is not valid JSON".into())),
    }
}

/// Identify the specific formatting problems in a response.
///
/// Capped at three so the guidance stays readable.
pub fn detect_issues(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut issues = Vec::new();

    if OBSERVATION_RE.is_match(text) {
        issues.push("includes 'Observation:' (the system provides that)".to_string());
    }
    if !lower.contains("thought:") {
        issues.push("missing 'Thought:' field".to_string());
    }
    if !lower.contains("action:") {
        issues.push("missing 'Action:' field".to_string());
    }
    if !lower.contains("action input:") {
        issues.push("missing 'Action Input:' field".to_string());
    } else if !text.contains('{') || !text.contains('}') {
        issues.push("Action Input is not in JSON format".to_string());
    }
    if lower.contains("file_path") {
        issues.push("using 'file_path' instead of 'path'".to_string());
    }
    if text.matches('"').count() % 2 != 0 {
        issues.push("unmatched quotes in JSON".to_string());
    }

    issues.truncate(3);
    issues
}
