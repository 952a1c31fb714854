use eyre::{Context, Result};
use std::io::{self, Write};

use crate::config::Config;
use crate::gate::CommandGateChecker;
use crate::hook::dispatch::dispatch;
use crate::input;

/// Run one hook checkpoint: read stdin, decide, print, return the exit code
pub fn run(mode: &str, config: &Config) -> Result<i32> {
    let payload = input::read_payload(io::stdin().lock());
    log::debug!("Payload: {}", payload);

    let gates = CommandGateChecker::new(&config.gates);
    let outcome = dispatch(mode, &payload, config, &gates)?;

    if let Some(output) = outcome.stdout {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", output).context("Failed to write hook output")?;
        stdout.flush().context("Failed to flush hook output")?;
    }

    Ok(outcome.exit_code)
}
