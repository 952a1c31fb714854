//! Hook event handling
//!
//! The host calls the binary at two checkpoints: before a tool runs
//! (`pre-task`) and when the agent says it is done (`stop-check`).

use serde::{Deserialize, Serialize};

pub mod completion;
pub mod dispatch;
pub mod guard;

/// Exit codes understood by the host
pub const EXIT_ALLOW: i32 = 0;
pub const EXIT_USAGE: i32 = 1;
pub const EXIT_BLOCK: i32 = 2;

/// Mode used when none is given on the command line
pub const DEFAULT_MODE: &str = "pre-task";

/// Host event names, as they appear in hook output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum HookEvent {
    PreToolUse,
    Stop,
}

/// Checkpoint selected with `--mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookMode {
    PreTask,
    StopCheck,
}

impl HookMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pre-task" => Some(Self::PreTask),
            "stop-check" => Some(Self::StopCheck),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreTask => "pre-task",
            Self::StopCheck => "stop-check",
        }
    }

    pub fn event(&self) -> HookEvent {
        match self {
            Self::PreTask => HookEvent::PreToolUse,
            Self::StopCheck => HookEvent::Stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!(HookMode::from_str("pre-task"), Some(HookMode::PreTask));
        assert_eq!(HookMode::from_str("stop-check"), Some(HookMode::StopCheck));
        assert_eq!(HookMode::from_str("Stop-Check"), None);
        assert_eq!(HookMode::from_str(""), None);
        assert_eq!(HookMode::from_str(DEFAULT_MODE), Some(HookMode::PreTask));
    }

    #[test]
    fn test_mode_roundtrip_and_event() {
        for mode in [HookMode::PreTask, HookMode::StopCheck] {
            assert_eq!(HookMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(HookMode::PreTask.event(), HookEvent::PreToolUse);
        assert_eq!(HookMode::StopCheck.event(), HookEvent::Stop);
    }

    #[test]
    fn test_event_serializes_pascal_case() {
        assert_eq!(serde_json::to_string(&HookEvent::PreToolUse).unwrap(), "\"PreToolUse\"");
    }
}
