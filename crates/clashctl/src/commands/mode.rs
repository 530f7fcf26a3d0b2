//! `mode get|set`.

use clashctl_core::{Controller, CoreError};

use crate::cli::{GlobalOpts, ModeArgs, ModeCommand};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    controller: &Controller,
    args: ModeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command.unwrap_or(ModeCommand::Get) {
        ModeCommand::Get => {
            let config = controller
                .client()
                .get_config()
                .await
                .map_err(CoreError::from)?;
            let out = output::render_single(
                global.output,
                &config.mode,
                |mode| mode.to_string(),
                |mode| mode.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ModeCommand::Set { mode } => {
            let mode = util::mode(mode);
            controller.set_mode(mode).await?;
            util::notice(global, &format!("Mode set to {mode}"));
            Ok(())
        }
    }
}
