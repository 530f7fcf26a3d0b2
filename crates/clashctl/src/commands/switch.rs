//! `switch <selector> <name>`.

use clashctl_core::Controller;

use crate::cli::{GlobalOpts, SwitchArgs};
use crate::error::CliError;

use super::util;

pub async fn handle(
    controller: &Controller,
    args: SwitchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    controller
        .switch_selection(&args.selector, &args.name)
        .await?;
    util::notice(global, &format!("{}: now using {}", args.selector, args.name));
    Ok(())
}
