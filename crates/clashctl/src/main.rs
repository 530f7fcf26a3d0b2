mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use clashctl_core::Controller;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

// The probe loop, the streams and the background refresh all share one
// thread and yield to each other at await points.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let Err(err) = run(cli).await else {
        return;
    };
    let code = err.exit_code();
    eprintln!("{:?}", miette::Report::new(err));
    std::process::exit(code);
}

/// `RUST_LOG` wins over `-v`; logs go to stderr so stdout stays parseable.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli { global, command } = cli;
    match command {
        Command::Config(args) => commands::config_cmd::handle(args, &global),
        Command::Completions(args) => {
            clap_complete::generate(
                args.shell,
                &mut Cli::command(),
                "clashctl",
                &mut std::io::stdout(),
            );
            Ok(())
        }
        command => against_daemon(command, &global).await,
    }
}

/// Everything except `config` and `completions` needs a live controller.
async fn against_daemon(command: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let controller = Controller::new(config::build_client_config(global)?)?;

    tracing::debug!(?command, "running against daemon");
    let result = commands::dispatch(command, &controller, global).await;
    controller.shutdown().await;
    result
}
