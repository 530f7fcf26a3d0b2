//! `providers rules|proxies|update`.

use clashctl_core::{Controller, ProxyProvider, RuleProvider};
use tabled::Tabled;

use crate::cli::{GlobalOpts, ProvidersArgs, ProvidersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct RuleProviderRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Behavior")]
    behavior: String,
    #[tabled(rename = "Vehicle")]
    vehicle: String,
    #[tabled(rename = "Rules")]
    rules: u64,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&RuleProvider> for RuleProviderRow {
    fn from(p: &RuleProvider) -> Self {
        Self {
            name: p.name.clone(),
            behavior: p.behavior.clone(),
            vehicle: p.vehicle_type.clone(),
            rules: p.rule_count,
            updated: p.updated_at.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct ProxyProviderRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Vehicle")]
    vehicle: String,
    #[tabled(rename = "Proxies")]
    proxies: usize,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&ProxyProvider> for ProxyProviderRow {
    fn from(p: &ProxyProvider) -> Self {
        Self {
            name: p.name.clone(),
            vehicle: p.vehicle_type.clone(),
            proxies: p.proxies.len(),
            updated: p.updated_at.clone().unwrap_or_default(),
        }
    }
}

pub async fn handle(
    controller: &Controller,
    args: ProvidersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ProvidersCommand::Rules => {
            let snapshot = controller.ensure_snapshot().await?;
            let out = output::render_list(
                global.output,
                &snapshot.rule_providers,
                |p| RuleProviderRow::from(p),
                |p| p.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProvidersCommand::Proxies => {
            let snapshot = controller.ensure_snapshot().await?;
            let out = output::render_list(
                global.output,
                &snapshot.proxy_providers,
                |p| ProxyProviderRow::from(p),
                |p| p.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProvidersCommand::Update { name } => {
            controller.update_proxy_provider(&name).await?;
            util::notice(global, &format!("Provider {name} updated"));
            Ok(())
        }
    }
}
