//! Loop detection over the action history.
//!
//! Checked *before* execution: given the action the oracle just proposed
//! and the tail of the history ledger, classify the repetition pattern.
//! Detection is read-only and derives signatures on demand — nothing is
//! persisted.

use gyro_core::{Action, HistoryLedger};

/// Normalized fingerprint of an action for repetition comparison.
///
/// Long parameter values are truncated but tagged with their full length,
/// so two large payloads that share a prefix don't alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    name: String,
    params: Vec<(String, String)>,
}

impl Signature {
    /// Derive a signature from an action.
    pub fn of(action: &Action, value_limit: usize) -> Self {
        let mut params: Vec<(String, String)> = action
            .params
            .iter()
            .map(|(k, v)| (k.clone(), fingerprint(v, value_limit)))
            .collect();
        params.sort();
        Self {
            name: action.name.clone(),
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn params_key(&self) -> &[(String, String)] {
        &self.params
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.params.is_empty() {
            return write!(f, "{}", self.name);
        }
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        write!(f, "{}({})", self.name, params.join(", "))
    }
}

fn fingerprint(value: &serde_json::Value, limit: usize) -> String {
    let s = match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if s.chars().count() > limit {
        let prefix: String = s.chars().take(limit).collect();
        format!("{prefix}…[len={}]", s.chars().count())
    } else {
        s
    }
}

/// The repetition patterns, in detection priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopVerdict {
    /// No repetition
    None,
    /// The same signature repeated consecutively
    Identical,
    /// Two signatures alternating A,B,A,B
    Alternating,
    /// A longer sequence repeating with the given period
    Cyclic(usize),
    /// Same action name cycling through a small set of parameter variants
    ParameterCycle,
}

impl LoopVerdict {
    pub fn is_none(&self) -> bool {
        matches!(self, LoopVerdict::None)
    }

    /// Human-readable description for observations and events.
    pub fn describe(&self, action: &Action) -> String {
        match self {
            LoopVerdict::None => "no repetition".into(),
            LoopVerdict::Identical => format!("repeating the same action: {action}"),
            LoopVerdict::Alternating => {
                format!("alternating between {} and another action", action.name)
            }
            LoopVerdict::Cyclic(period) => {
                format!("repeating a {period}-action cycle ending in {}", action.name)
            }
            LoopVerdict::ParameterCycle => format!(
                "cycling through {} with different parameters",
                action.name
            ),
        }
    }
}

/// Classifies a proposed action against the history tail.
#[derive(Debug, Clone)]
pub struct LoopDetector {
    /// Consecutive prior occurrences that make the next identical proposal a loop
    identical_threshold: usize,
    /// Truncation length for signature values
    value_limit: usize,
}

impl LoopDetector {
    pub fn new(identical_threshold: usize, value_limit: usize) -> Self {
        Self {
            identical_threshold: identical_threshold.max(1),
            value_limit,
        }
    }

    /// Classify the candidate. First matching pattern wins.
    pub fn check(&self, candidate: &Action, ledger: &HistoryLedger) -> LoopVerdict {
        // Longest window any check needs: 2 * max cyclic period, or the
        // identical run length, whichever is larger.
        let window = (self.identical_threshold + 1).max(8);
        let mut seq: Vec<Signature> = ledger
            .tail(window.saturating_sub(1))
            .iter()
            .map(|step| Signature::of(&step.action, self.value_limit))
            .collect();
        seq.push(Signature::of(candidate, self.value_limit));

        if self.is_identical_run(&seq) {
            return LoopVerdict::Identical;
        }
        if Self::is_alternating(&seq) {
            return LoopVerdict::Alternating;
        }
        if let Some(period) = Self::cyclic_period(&seq) {
            return LoopVerdict::Cyclic(period);
        }
        if Self::is_parameter_cycle(&seq) {
            return LoopVerdict::ParameterCycle;
        }
        LoopVerdict::None
    }

    /// Candidate plus the previous `identical_threshold` signatures all equal.
    fn is_identical_run(&self, seq: &[Signature]) -> bool {
        let run = self.identical_threshold + 1;
        if seq.len() < run {
            return false;
        }
        let tail = &seq[seq.len() - run..];
        tail.iter().all(|sig| sig == &tail[0])
    }

    /// Last four signatures form A,B,A,B with A != B.
    fn is_alternating(seq: &[Signature]) -> bool {
        if seq.len() < 4 {
            return false;
        }
        let t = &seq[seq.len() - 4..];
        t[0] == t[2] && t[1] == t[3] && t[0] != t[1]
    }

    /// Smallest period p in 2..=4 where the last 2p signatures repeat.
    fn cyclic_period(seq: &[Signature]) -> Option<usize> {
        for period in 2..=4usize {
            let needed = period * 2;
            if seq.len() < needed {
                continue;
            }
            let t = &seq[seq.len() - needed..];
            let repeats = (0..period).all(|i| t[i] == t[i + period]);
            // A cycle of identical entries is an identical run, not a cycle
            let distinct = t[..period].iter().any(|sig| sig != &t[0]);
            if repeats && distinct {
                return Some(period);
            }
        }
        None
    }

    /// Same action name at least 3 times consecutively, parameters varying
    /// but bouncing between at most two variants.
    fn is_parameter_cycle(seq: &[Signature]) -> bool {
        if seq.len() < 3 {
            return false;
        }
        let t = &seq[seq.len() - seq.len().min(4)..];
        if t.len() < 3 {
            return false;
        }
        let same_name = t.iter().all(|sig| sig.name() == t[0].name());
        if !same_name {
            return false;
        }
        let mut variants: Vec<&[(String, String)]> = Vec::new();
        for sig in t {
            if !variants.contains(&sig.params_key()) {
                variants.push(sig.params_key());
            }
        }
        variants.len() > 1 && variants.len() <= 2
    }
}
