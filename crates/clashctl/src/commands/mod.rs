//! Command dispatch: bridges CLI args -> controller calls -> output formatting.

pub mod config_cmd;
pub mod delay;
pub mod groups;
pub mod logs;
pub mod mode;
pub mod probe;
pub mod providers;
pub mod proxies;
pub mod rules;
pub mod status;
pub mod switch;
pub mod traffic;
pub mod util;
pub mod watch;

use clashctl_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a daemon-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(controller, global).await,
        Command::Mode(args) => mode::handle(controller, args, global).await,
        Command::Rules => rules::handle(controller, global).await,
        Command::Groups(args) => groups::handle(controller, args, global).await,
        Command::Proxies(args) => proxies::handle(controller, args, global).await,
        Command::Delay(args) => delay::handle(controller, args, global).await,
        Command::Probe(args) => probe::handle(controller, args, global).await,
        Command::Switch(args) => switch::handle(controller, args, global).await,
        Command::Providers(args) => providers::handle(controller, args, global).await,
        Command::Traffic(args) => traffic::handle(controller, args, global).await,
        Command::Logs(args) => logs::handle(controller, args, global).await,
        Command::Watch => watch::handle(controller, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "local command reached daemon dispatch".into(),
        )),
    }
}
