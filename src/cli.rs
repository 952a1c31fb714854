use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::hook::DEFAULT_MODE;
use crate::input;

/// Output format for commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Resolve the effective output format.
    /// If user specified a format, use it.
    /// Otherwise: TTY → Text, non-TTY (pipe) → Json
    pub fn resolve(user_choice: Option<OutputFormat>) -> OutputFormat {
        match user_choice {
            Some(fmt) => fmt,
            None => {
                if std::io::stdout().is_terminal() {
                    OutputFormat::Text
                } else {
                    OutputFormat::Json
                }
            }
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "approval-hook",
    about = "Approval workflow hook - confirms sensitive commands and validates task completion",
    version = env!("GIT_DESCRIBE"),
    after_help = "Reads the hook payload as JSON on stdin.\n\nExit codes: 0 allow/continue, 2 block, 1 usage error"
)]
pub struct Cli {
    /// Hook checkpoint to run (pre-task or stop-check)
    #[arg(long, default_value = DEFAULT_MODE)]
    pub mode: String,

    /// Path to config file
    #[arg(short, long, global = true, help = "Path to approval-hook.yaml config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Set when the arguments were not understood and only `--mode=` was salvaged
    #[arg(skip)]
    pub lenient: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the quality gates and report their outcomes
    Gates {
        /// Output format (defaults to text on a TTY, JSON otherwise)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Only run these gates (repeatable)
        #[arg(long)]
        only: Vec<String>,
    },
}

impl Cli {
    pub fn parse_lenient() -> Self {
        Self::parse_lenient_from(std::env::args_os())
    }

    /// Parse like clap, but never exit with clap's usage code.
    ///
    /// The host treats exit code 2 as "block", so argument errors fall back
    /// to the first `--mode=` argument with default options instead.
    pub fn parse_lenient_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let raw = || args.iter().skip(1).map(|a| a.to_string_lossy().into_owned());

        match Self::try_parse_from(args.iter().cloned()) {
            Ok(mut cli) => {
                // Only the first `--mode=` counts, whatever clap made of the rest
                cli.mode = input::mode_from_args(raw());
                cli
            }
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
            Err(_) => Self {
                mode: input::mode_from_args(raw()),
                config: None,
                verbose: false,
                lenient: true,
                command: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode() {
        let cli = Cli::parse_lenient_from(["approval-hook"]);
        assert_eq!(cli.mode, "pre-task");
        assert!(!cli.lenient);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_mode_equals_form() {
        let cli = Cli::parse_lenient_from(["approval-hook", "--mode=stop-check"]);
        assert_eq!(cli.mode, "stop-check");
        assert!(!cli.lenient);
    }

    #[test]
    fn test_unknown_mode_value_is_kept() {
        let cli = Cli::parse_lenient_from(["approval-hook", "--mode=bogus"]);
        assert_eq!(cli.mode, "bogus");
    }

    #[test]
    fn test_unknown_flags_fall_back() {
        let cli = Cli::parse_lenient_from(["approval-hook", "--session=abc", "--mode=stop-check"]);
        assert!(cli.lenient);
        assert_eq!(cli.mode, "stop-check");
    }

    #[test]
    fn test_repeated_mode_uses_first() {
        let cli = Cli::parse_lenient_from(["approval-hook", "--mode=stop-check", "--mode=pre-task"]);
        assert_eq!(cli.mode, "stop-check");
    }

    #[test]
    fn test_mode_space_form_is_ignored() {
        let cli = Cli::parse_lenient_from(["approval-hook", "--mode", "stop-check"]);
        assert_eq!(cli.mode, "pre-task");
    }

    #[test]
    fn test_mode_value_stops_at_second_equals() {
        let cli = Cli::parse_lenient_from(["approval-hook", "--mode=pre-task=x"]);
        assert_eq!(cli.mode, "pre-task");
    }

    #[test]
    fn test_config_and_verbose() {
        let cli = Cli::parse_lenient_from(["approval-hook", "-v", "--config", "/tmp/hook.yaml", "--mode=stop-check"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/hook.yaml")));
    }

    #[test]
    fn test_gates_subcommand() {
        let cli = Cli::parse_lenient_from(["approval-hook", "gates", "--format", "json", "--only", "compile"]);
        match cli.command {
            Some(Commands::Gates { format, only }) => {
                assert_eq!(format, Some(OutputFormat::Json));
                assert_eq!(only, vec!["compile"]);
            }
            None => panic!("expected gates subcommand"),
        }
    }

    #[test]
    fn test_output_format_explicit() {
        assert_eq!(OutputFormat::resolve(Some(OutputFormat::Text)), OutputFormat::Text);
        assert_eq!(OutputFormat::resolve(Some(OutputFormat::Json)), OutputFormat::Json);
    }
}
