//! Run the quality gates on demand

use colored::*;
use eyre::{Context, Result};

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::gate::{CommandGateChecker, GateChecker, GateOutcome, GateResults};

pub fn run(format: Option<OutputFormat>, only: &[String], config: &Config) -> Result<i32> {
    let checker = CommandGateChecker::new(&config.gates);

    let results = if only.is_empty() {
        checker.check_all()
    } else {
        checker.check_gates(only)
    };

    match OutputFormat::resolve(format) {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&results).context("Failed to serialize gate results")?;
            println!("{}", json);
        }
        OutputFormat::Text => print_text(&results),
    }

    Ok(exit_code(&results))
}

fn print_text(results: &GateResults) {
    println!("{}", "Quality gates:".bold());
    if results.is_empty() {
        println!("  {} No gates configured", "⚠".yellow());
        return;
    }

    let width = results.keys().map(|name| name.len()).max().unwrap_or(0);
    for (name, outcome) in results {
        let (mark, label) = match outcome {
            GateOutcome::Passed => ("✓".green(), outcome.to_string().green()),
            GateOutcome::Failed => ("✗".red(), outcome.to_string().red()),
            GateOutcome::Unknown => ("?".yellow(), outcome.to_string().yellow()),
        };
        println!("  {} {:width$}  {}", mark, name, label, width = width);
    }
}

/// 1 if any gate failed; unknown gates do not count as failures
fn exit_code(results: &GateResults) -> i32 {
    if results.values().any(|outcome| *outcome == GateOutcome::Failed) { 1 } else { 0 }
}
