pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "critbot",
    about = "CritBot operator CLI",
    long_about = "Roll the d20 offline, inspect phrase resolution and effective configuration, and run readiness checks.",
    after_help = "Examples:\n  critbot roll --count 3\n  critbot resolve 17 --phrases phrases.toml\n  critbot doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Roll the d20 locally and print the resolved phrases")]
    Roll {
        #[arg(long, default_value_t = 1, help = "Number of rolls to make")]
        count: u32,
        #[arg(long, help = "Seed the generator for a reproducible sequence")]
        seed: Option<u64>,
        #[arg(long, help = "Phrase override file to resolve against")]
        phrases: Option<PathBuf>,
    },
    #[command(about = "Resolve a roll value against the override and built-in phrase tables")]
    Resolve {
        value: i64,
        #[arg(long, help = "Phrase override file to resolve against")]
        phrases: Option<PathBuf>,
    },
    #[command(about = "Inspect effective configuration values with secret redaction")]
    Config,
    #[command(about = "Validate config, token readiness, and the phrase override file")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Roll { count, seed, phrases } => {
            commands::roll::run(count, seed, phrases.as_deref())
        }
        Command::Resolve { value, phrases } => commands::resolve::run(value, phrases.as_deref()),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
