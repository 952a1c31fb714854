//! Quality gates
//!
//! A gate is a named external check (formatting, static analysis,
//! compilation). Running one never fails: whatever goes wrong while
//! invoking the tool is folded into [`GateOutcome::Unknown`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use crate::config::Config;

/// Default wall-clock budget for a single gate, in seconds
pub const DEFAULT_GATE_TIMEOUT_SECS: u64 = 300;

/// Tri-state result of a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateOutcome {
    Passed,
    Failed,
    /// Timed out, or the tool could not be run at all
    Unknown,
}

impl std::fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateOutcome::Passed => write!(f, "passed"),
            GateOutcome::Failed => write!(f, "failed"),
            GateOutcome::Unknown => write!(f, "unknown"),
        }
    }
}

/// Gate name to outcome, in gate table order
pub type GateResults = IndexMap<String, GateOutcome>;

/// External command bound to a gate
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct GateCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl GateCommand {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatesConfig {
    pub timeout_secs: u64,
    pub commands: IndexMap<String, GateCommand>,
}

impl Default for GatesConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_GATE_TIMEOUT_SECS,
            commands: IndexMap::from([
                (
                    "spotless".to_string(),
                    GateCommand::new("./gradlew", &["spotlessCheck", "--quiet"]),
                ),
                ("detekt".to_string(), GateCommand::new("./gradlew", &["detekt", "--quiet"])),
                (
                    "compile".to_string(),
                    GateCommand::new("./gradlew", &["compileDebugKotlin", "--quiet"]),
                ),
            ]),
        }
    }
}

/// Something that can answer "did this gate pass?"
pub trait GateChecker {
    /// Names of all known gates, in table order
    fn gate_names(&self) -> Vec<String>;

    /// Run a single gate
    fn check(&self, name: &str) -> GateOutcome;

    /// Run the named gates, in the order given
    fn check_gates(&self, names: &[String]) -> GateResults {
        names.iter().map(|name| (name.clone(), self.check(name))).collect()
    }

    /// Run every known gate
    fn check_all(&self) -> GateResults {
        self.check_gates(&self.gate_names())
    }
}

/// Runs gates as subprocesses with a timeout
pub struct CommandGateChecker {
    commands: IndexMap<String, GateCommand>,
    timeout: Duration,
}

impl CommandGateChecker {
    pub fn new(config: &GatesConfig) -> Self {
        Self {
            commands: config.commands.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    #[cfg(test)]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn run(&self, name: &str, gate: &GateCommand) -> GateOutcome {
        let program = Config::expand_path(Path::new(&gate.program));

        // Bare names go through PATH; anything with a separator is taken as-is
        if program.components().count() == 1 && which::which(&program).is_err() {
            log::warn!("Gate '{}': {} not found", name, program.display());
            return GateOutcome::Unknown;
        }

        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                log::error!("Gate '{}': failed to start runtime: {}", name, e);
                return GateOutcome::Unknown;
            }
        };

        let mut command = tokio::process::Command::new(&program);
        command
            .args(&gate.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Dropping the output future on timeout drops the child, which kills it
        let result = runtime.block_on(async { tokio::time::timeout(self.timeout, command.output()).await });

        match result {
            Err(_) => {
                log::warn!("Gate '{}' timed out after {}s", name, self.timeout.as_secs());
                GateOutcome::Unknown
            }
            Ok(Err(e)) => {
                log::warn!("Gate '{}': failed to run {}: {}", name, program.display(), e);
                GateOutcome::Unknown
            }
            Ok(Ok(output)) => {
                log::debug!(
                    "Gate '{}' exited with {} ({} bytes stdout, {} bytes stderr)",
                    name,
                    output.status,
                    output.stdout.len(),
                    output.stderr.len()
                );
                classify(output.status)
            }
        }
    }
}

impl GateChecker for CommandGateChecker {
    fn gate_names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    fn check(&self, name: &str) -> GateOutcome {
        match self.commands.get(name) {
            Some(gate) => self.run(name, gate),
            None => {
                log::warn!("Unknown gate: {}", name);
                GateOutcome::Unknown
            }
        }
    }
}

/// Exit 0 passes, anything else (signals included) fails
fn classify(status: ExitStatus) -> GateOutcome {
    if status.success() { GateOutcome::Passed } else { GateOutcome::Failed }
}
