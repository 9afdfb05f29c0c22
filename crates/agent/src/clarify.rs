//! Progressive clarification for malformed oracle output.
//!
//! An explicit three-state machine: each consecutive malformed response
//! escalates exactly one level — never skipping — and any well-formed
//! parse resets to the bottom. The controller abandons the run when the
//! consecutive count hits its bound; guidance text only ever gets more
//! explicit, never loops.

/// Escalation levels, strictly ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Remind of the exact required response shape
    Basic,
    /// Worked examples plus the specific fields that were missing
    Detailed,
    /// Propose one explicitly stated small first step
    Simplified,
}

impl Level {
    pub fn index(self) -> u8 {
        match self {
            Level::Basic => 0,
            Level::Detailed => 1,
            Level::Simplified => 2,
        }
    }

    fn next(self) -> Level {
        match self {
            Level::Basic => Level::Detailed,
            Level::Detailed | Level::Simplified => Level::Simplified,
        }
    }
}

/// Corrective guidance to inject into the conversation.
#[derive(Debug, Clone)]
pub struct Guidance {
    pub level: Level,
    pub text: String,
}

/// Tracks escalation across consecutive malformed responses.
#[derive(Debug, Clone)]
pub struct ClarificationEscalator {
    level: Level,
    consecutive_malformed: usize,
}

impl ClarificationEscalator {
    pub fn new() -> Self {
        Self {
            level: Level::Basic,
            consecutive_malformed: 0,
        }
    }

    /// How many malformed responses in a row we have seen.
    pub fn consecutive_malformed(&self) -> usize {
        self.consecutive_malformed
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Record a malformed response and produce guidance.
    ///
    /// The first malformed response answers at Basic; each further one
    /// escalates a single level, saturating at Simplified.
    pub fn on_malformed(&mut self, issues: &[String]) -> Guidance {
        if self.consecutive_malformed > 0 {
            self.level = self.level.next();
        }
        self.consecutive_malformed += 1;

        let text = match self.level {
            Level::Basic => basic_guidance(issues),
            Level::Detailed => detailed_guidance(issues),
            Level::Simplified => simplified_guidance(),
        };

        Guidance {
            level: self.level,
            text,
        }
    }

    /// A well-formed action parsed: reset to the bottom.
    pub fn on_parsed(&mut self) {
        self.level = Level::Basic;
        self.consecutive_malformed = 0;
    }
}

impl Default for ClarificationEscalator {
    fn default() -> Self {
        Self::new()
    }
}

fn issue_suffix(issues: &[String]) -> String {
    if issues.is_empty() {
        String::new()
    } else {
        format!("\n\nDetected issues: {}", issues.join(", "))
    }
}

fn basic_guidance(issues: &[String]) -> String {
    format!(
        "Observation: No valid action found. Please use the exact \
         Thought-Action-Action Input format.\n\n\
         Required format:\n\
         Thought: [your reasoning about what to do next]\n\
         Action: [action_name]\n\
         Action Input: {{\"parameter\": \"value\"}}\n\n\
         Do NOT include Observation in your response - I will provide that.{}",
        issue_suffix(issues)
    )
}

fn detailed_guidance(issues: &[String]) -> String {
    let specific = if issues.is_empty() {
        String::new()
    } else {
        format!(
            "\n\nYour response had these issues: {}\nPlease focus on fixing these specific problems.",
            issues.join(", ")
        )
    };
    format!(
        "Observation: Still no valid action found. Here are examples of the correct format.\n\n\
         CORRECT format examples:\n\n\
         1. To write a file:\n\
         Thought: I need to create a new file with the content provided.\n\
         Action: file_write\n\
         Action Input: {{\"path\": \"example.txt\", \"content\": \"Hello World\"}}\n\n\
         2. To read a file:\n\
         Thought: I should read the existing file to see its contents.\n\
         Action: file_read\n\
         Action Input: {{\"path\": \"example.txt\"}}\n\n\
         3. To edit a file:\n\
         Thought: I need to find and replace specific text in the file.\n\
         Action: file_edit\n\
         Action Input: {{\"path\": \"example.txt\", \"find_text\": \"old text\", \"replace_text\": \"new text\"}}\n\n\
         4. To list directory contents:\n\
         Thought: I should see what files are in this directory.\n\
         Action: dir_list\n\
         Action Input: {{\"path\": \".\"}}\n\n\
         COMMON MISTAKES to avoid:\n\
         - Don't include \"Observation:\" in your response\n\
         - Don't put quotes around the Action name\n\
         - Action Input must be valid JSON with double quotes\n\
         - Don't mix up parameter names (use \"path\" not \"file_path\"){specific}"
    )
}

fn simplified_guidance() -> String {
    "Observation: Let's try a simpler approach. The task may be too complex \
     to handle all at once.\n\n\
     SIMPLIFIED APPROACH:\n\
     1. Pick just ONE simple action to perform right now\n\
     2. Don't worry about the full task - just focus on one step\n\
     3. Use this exact format:\n\n\
     Thought: I will list the current directory to see what is available\n\
     Action: dir_list\n\
     Action Input: {\"path\": \".\"}\n\n\
     Start with exactly that listing action. After you see the result, \
     read any relevant file before creating or modifying anything."
        .to_string()
}
