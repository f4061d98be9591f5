//! `wfverify` application entry point.
//!
//! Each invocation runs one verification step against a live workflow and
//! prints a one-line outcome. It uses `eyre` for opaque error handling at the
//! application boundary, converting domain-specific errors into
//! human-readable reports and a non-zero exit status.
//!
//! Configuration is loaded with layered precedence via `OrthoConfig`:
//! 1. Application defaults
//! 2. Configuration file (`~/.config/wfverify/config.toml` or path from `WFVERIFY_CONFIG_PATH`)
//! 3. Environment variables (`WFVERIFY_*`)
//! 4. Command-line arguments

use clap::Parser;
use eyre::{Report, Result as EyreResult};
use wfverify::api::{self, Command, CommandOutcome};
use wfverify::config::{AppConfig, Cli, Commands, load_config};
use wfverify::engine::EngineConnector;
use wfverify::error::Result as WfverifyResult;

/// Application entry point.
fn main() -> EyreResult<()> {
    let cli = Cli::parse();
    let _installed = wfverify::telemetry::init(cli.log_json);

    let config = load_config(&cli).map_err(Report::from)?;
    let outcome = run(&cli, &config).map_err(Report::from)?;
    report(&outcome);
    Ok(())
}

/// Execute the CLI command, returning domain-specific errors.
///
/// Keeps semantic errors inside the run loop so the CLI boundary owns
/// conversion to `eyre::Report`.
fn run(cli: &Cli, config: &AppConfig) -> WfverifyResult<CommandOutcome> {
    let runtime = EngineConnector::create_runtime()?;
    let env = mockable::DefaultEnv::new();
    api::execute(config, &command_for(&cli.command), runtime.handle(), &env)
}

/// Translate parsed arguments into the library's command type.
fn command_for(command: &Commands) -> Command {
    match command {
        Commands::Submit(args) => Command::Submit {
            script: args.script.clone(),
        },
        Commands::Advance(args) => Command::Advance {
            job: args.job,
            state: args.state,
        },
        Commands::ExpectError(args) => Command::ExpectError {
            job: args.job,
            state: args.state,
        },
        Commands::ExpectStatus(args) => Command::ExpectStatus {
            job: args.job,
            status: args.status.clone(),
        },
        Commands::Check(args) => Command::Check { job: args.job },
        Commands::Cancel(args) => Command::Cancel {
            job: args.job,
            purge: args.purge,
        },
        Commands::Comment(args) => Command::Comment {
            job: args.job,
            text: args.text.clone(),
        },
        Commands::Walk(args) => Command::Walk {
            job: args.job,
            from: args.from,
            to: args.to,
        },
        Commands::Cleanup(args) => Command::Cleanup { job: args.job },
    }
}

#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn report(outcome: &CommandOutcome) {
    println!("{outcome}");
}
