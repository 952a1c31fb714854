//! Hook mode dispatching

use eyre::{Context, Result};
use serde::Serialize;

use super::completion::{Verdict, referenced_gates, validate_completion};
use super::guard::PreTaskGuard;
use super::{EXIT_ALLOW, EXIT_BLOCK, EXIT_USAGE, HookMode};
use crate::config::Config;
use crate::gate::{GateChecker, GateResults};

/// What a hook run prints and how it exits
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub stdout: Option<serde_json::Value>,
    pub exit_code: i32,
}

impl DispatchOutcome {
    fn silent(exit_code: i32) -> Self {
        Self { stdout: None, exit_code }
    }

    fn with_payload<T: Serialize>(payload: &T, exit_code: i32) -> Result<Self> {
        let value = serde_json::to_value(payload).context("Failed to serialize hook output")?;
        Ok(Self {
            stdout: Some(value),
            exit_code,
        })
    }
}

/// Stdout payload for stop-check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopOutput {
    pub ok: bool,
    pub reason: String,
}

impl From<&Verdict> for StopOutput {
    fn from(verdict: &Verdict) -> Self {
        if verdict.ok {
            Self {
                ok: true,
                reason: verdict.reason.clone(),
            }
        } else {
            Self {
                ok: false,
                reason: format!("Pending items: {}", verdict.pending_items.join(", ")),
            }
        }
    }
}

/// Run the hook for `mode` against a parsed payload
pub fn dispatch(mode: &str, payload: &serde_json::Value, config: &Config, gates: &dyn GateChecker) -> Result<DispatchOutcome> {
    let Some(mode) = HookMode::from_str(mode) else {
        log::error!("Unknown mode: {}", mode);
        return Ok(DispatchOutcome::silent(EXIT_USAGE));
    };

    log::debug!("Dispatching {} ({:?})", mode.as_str(), mode.event());

    match mode {
        HookMode::PreTask => pre_task(payload, config),
        HookMode::StopCheck => stop_check(payload, config, gates),
    }
}

fn pre_task(payload: &serde_json::Value, config: &Config) -> Result<DispatchOutcome> {
    match PreTaskGuard::new(&config.guard).evaluate(payload) {
        Some(decision) => DispatchOutcome::with_payload(&decision, EXIT_ALLOW),
        None => Ok(DispatchOutcome::silent(EXIT_ALLOW)),
    }
}

fn stop_check(payload: &serde_json::Value, config: &Config, gates: &dyn GateChecker) -> Result<DispatchOutcome> {
    // Only gates the checklist asks about are run
    let wanted = referenced_gates(&config.checklist);
    let gate_results = if wanted.is_empty() {
        GateResults::new()
    } else {
        log::info!("Running quality gates: {}", wanted.join(", "));
        gates.check_gates(&wanted)
    };

    let verdict = validate_completion(payload, &config.checklist, &gate_results).verdict();

    if verdict.ok {
        log::info!("Task completion validated successfully");
        DispatchOutcome::with_payload(&StopOutput::from(&verdict), EXIT_ALLOW)
    } else {
        log::info!(
            "Task completion blocked: {} (pending: {})",
            verdict.reason,
            verdict.pending_items.join(", ")
        );
        DispatchOutcome::with_payload(&StopOutput::from(&verdict), EXIT_BLOCK)
    }
}
