//! Pre-task guard
//!
//! Asks for confirmation before sensitive Bash commands run.

use lazy_regex::{regex, regex_is_match};
use serde::{Deserialize, Serialize};

use super::HookEvent;

/// How patterns are compared against the command text
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Unanchored, case-sensitive containment. `rm` matches `cat format.txt`.
    #[default]
    Substring,
    /// Pattern words must be the leading words of a command segment
    Command,
}

/// A pattern that needs confirmation, with the reason shown to the user
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SensitivePattern {
    pub pattern: String,
    pub reason: String,
}

impl SensitivePattern {
    fn new(pattern: &str, reason: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }

    fn matches(&self, command: &str, segments: &[Vec<String>], strategy: MatchStrategy) -> bool {
        match strategy {
            MatchStrategy::Substring => command.contains(&self.pattern),
            MatchStrategy::Command => {
                let wanted: Vec<&str> = self.pattern.split_whitespace().collect();
                !wanted.is_empty()
                    && segments.iter().any(|words| {
                        let words = strip_prefix_words(words);
                        words.len() >= wanted.len() && words.iter().zip(&wanted).all(|(w, p)| w == p)
                    })
            }
        }
    }
}

/// Checked in order; the first match wins
pub fn default_patterns() -> Vec<SensitivePattern> {
    vec![
        SensitivePattern::new("git push", "Pushing to remote requires verification"),
        SensitivePattern::new("gh pr merge", "Merging PR requires test plan completion"),
        SensitivePattern::new("rm", "Deletion operations require confirmation"),
    ]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardConfig {
    pub strategy: MatchStrategy,
    pub patterns: Vec<SensitivePattern>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            strategy: MatchStrategy::default(),
            patterns: default_patterns(),
        }
    }
}

/// Decision handed back to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionDecision {
    Ask,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    pub hook_event_name: HookEvent,
    pub permission_decision: PermissionDecision,
    pub permission_decision_reason: String,
}

/// Stdout payload for a pre-task match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardDecision {
    pub hook_specific_output: HookSpecificOutput,
}

impl GuardDecision {
    pub fn ask(reason: impl Into<String>) -> Self {
        Self {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: HookEvent::PreToolUse,
                permission_decision: PermissionDecision::Ask,
                permission_decision_reason: reason.into(),
            },
        }
    }
}

pub struct PreTaskGuard<'a> {
    config: &'a GuardConfig,
}

impl<'a> PreTaskGuard<'a> {
    pub fn new(config: &'a GuardConfig) -> Self {
        Self { config }
    }

    /// Inspect a pre-task payload. `None` leaves the host's default policy in place.
    pub fn evaluate(&self, payload: &serde_json::Value) -> Option<GuardDecision> {
        let tool_name = payload.get("tool_name").and_then(|v| v.as_str()).unwrap_or("");

        if tool_name != "Bash" {
            return None;
        }

        let command = payload
            .get("tool_input")
            .and_then(|v| v.get("command"))
            .and_then(|v| v.as_str())
            .unwrap_or("");

        let pattern = self.find_match(command)?;
        log::info!("Approval required: {}", pattern.reason);
        Some(GuardDecision::ask(&pattern.reason))
    }

    fn find_match(&self, command: &str) -> Option<&SensitivePattern> {
        let segments = match self.config.strategy {
            MatchStrategy::Command => command_segments(command),
            MatchStrategy::Substring => Vec::new(),
        };

        self.config
            .patterns
            .iter()
            .find(|pattern| pattern.matches(command, &segments, self.config.strategy))
    }
}

/// Split a command line into simple commands and tokenize each one
///
/// Separators inside quotes are not respected; a quoted `;` starts a new
/// segment like an unquoted one would.
fn command_segments(command: &str) -> Vec<Vec<String>> {
    regex!(r"&&|\|\||[;|&\n]")
        .split(command)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            shlex::split(segment).unwrap_or_else(|| segment.split_whitespace().map(String::from).collect())
        })
        .collect()
}

/// Wrappers that run the command that follows them
const COMMAND_WRAPPERS: &[&str] = &["sudo", "env", "command", "exec", "nohup", "time"];

/// Drop leading `VAR=value` assignments and wrappers (plus their flags)
fn strip_prefix_words(words: &[String]) -> &[String] {
    let mut rest = words;
    while let Some((first, tail)) = rest.split_first() {
        if regex_is_match!(r"^[A-Za-z_][A-Za-z0-9_]*=", first) {
            rest = tail;
        } else if COMMAND_WRAPPERS.contains(&first.as_str()) {
            rest = tail;
            while rest.first().is_some_and(|w| w.starts_with('-')) {
                rest = &rest[1..];
            }
        } else {
            break;
        }
    }
    rest
}
