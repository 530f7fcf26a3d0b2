//! Config subcommand handlers. None of these talk to the daemon.

use clashctl_config::{self as config, Config, Profile};
use dialoguer::{Confirm, Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::available_profiles;
use crate::error::CliError;
use crate::output;

use super::util::{self, prompt_err};

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of `cfg` with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.secret.is_some() {
            profile.secret = Some(MASK.into());
        }
    }
    cfg
}

fn unknown_profile(cfg: &Config, name: &str) -> CliError {
    CliError::UnknownProfile {
        name: name.into(),
        available: available_profiles(cfg),
    }
}

/// Ask where a freshly entered secret should live.
///
/// Returns `Some(secret)` for plaintext, `None` once stored in the keyring.
fn prompt_secret_storage(profile_name: &str, secret: String) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the secret?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        config::store_secret(profile_name, &secret)?;
        eprintln!("   Secret stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(
                global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_default(),
                |c| c.profiles.keys().cloned().collect::<Vec<_>>().join("\n"),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.profile_name(None);
            if cfg.profiles.is_empty() {
                util::notice(global, "No profiles configured. Run: clashctl config init");
            }
            for (name, profile) in &cfg.profiles {
                let marker = if name == default { " *" } else { "" };
                println!("{name}{marker}\t{}", profile.api);
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(unknown_profile(&cfg, &name));
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            util::notice(global, &format!("Default profile set to '{name}'"));
            Ok(())
        }

        ConfigCommand::SetSecret => {
            let cfg = config::load_config_or_default();
            let name = cfg.profile_name(global.profile.as_deref()).to_owned();
            if !cfg.profiles.contains_key(&name) {
                return Err(unknown_profile(&cfg, &name));
            }

            let secret = rpassword::prompt_password(format!("Secret for '{name}': "))
                .map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "secret".into(),
                    reason: "secret cannot be empty".into(),
                });
            }

            config::store_secret(&name, &secret)?;
            util::notice(global, &format!("Secret for '{name}' stored in system keyring"));
            Ok(())
        }
    }
}

/// Interactive wizard: one profile, optionally made the default.
fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config_or_default();
    eprintln!("clashctl configuration wizard");
    eprintln!("   Config path: {}\n", config::config_path().display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default(global.profile.clone().unwrap_or_else(|| "default".into()))
        .interact_text()
        .map_err(prompt_err)?;

    let api: String = Input::new()
        .with_prompt("External controller URL")
        .default(global.api.clone().unwrap_or_else(|| "http://127.0.0.1:9090".into()))
        .validate_with(|input: &String| {
            config::parse_api_url(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;

    let secret =
        rpassword::prompt_password("Secret (leave empty for none): ").map_err(prompt_err)?;
    let secret = if secret.is_empty() {
        None
    } else {
        prompt_secret_storage(&profile_name, secret)?
    };

    cfg.profiles.insert(
        profile_name.clone(),
        Profile {
            api,
            secret,
            ..Profile::default()
        },
    );

    let make_default = cfg.profiles.len() == 1
        || Confirm::new()
            .with_prompt(format!("Make '{profile_name}' the default profile?"))
            .default(true)
            .interact()
            .map_err(prompt_err)?;
    if make_default {
        cfg.default_profile = Some(profile_name.clone());
    }

    let path = config::save_config(&cfg)?;
    util::notice(
        global,
        &format!("Profile '{profile_name}' saved to {}", path.display()),
    );
    Ok(())
}
