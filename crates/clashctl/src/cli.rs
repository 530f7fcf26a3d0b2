//! Clap derive structures for the `clashctl` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. This
//! file is also compiled by `build.rs` for man pages, so it only depends
//! on clap and clap_complete.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// clashctl -- inspect and steer a running Clash daemon
#[derive(Debug, Parser)]
#[command(
    name = "clashctl",
    version,
    about = "Inspect and control a Clash daemon from the command line",
    long_about = "Talks to the Clash external controller (RESTful API + WebSocket streams).\n\n\
        Resolves the proxy groups that rules actually route to, probes their\n\
        members' latency one by one, and streams traffic and logs.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Daemon profile to use
    #[arg(long, short = 'p', env = "CLASHCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// External controller URL (overrides profile)
    #[arg(long, short = 'a', env = "CLASHCTL_API", global = true)]
    pub api: Option<String>,

    /// Controller secret, sent as a bearer token
    #[arg(long, env = "CLASHCTL_SECRET", global = true, hide_env = true)]
    pub secret: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CLASHCTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "CLASHCTL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "CLASHCTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// Routing mode, as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Direct,
    Rule,
    Global,
}

/// Minimum log level for `logs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    Debug,
    Info,
    Warning,
    Error,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show routing mode, ports and one traffic sample
    #[command(alias = "st")]
    Status,

    /// Show or change the routing mode
    Mode(ModeArgs),

    /// List routing rules in daemon order
    #[command(alias = "r")]
    Rules,

    /// List and inspect the proxy groups rules route to
    #[command(alias = "g")]
    Groups(GroupsArgs),

    /// Inspect individual proxies
    #[command(alias = "px")]
    Proxies(ProxiesArgs),

    /// Measure one proxy's latency
    Delay(DelayArgs),

    /// Probe every member of a group or proxy provider, one at a time
    Probe(ProbeArgs),

    /// Change the selected member of a Selector group
    #[command(alias = "sw")]
    Switch(SwitchArgs),

    /// List and update rule and proxy providers
    Providers(ProvidersArgs),

    /// Stream upload/download rates
    Traffic(TrafficArgs),

    /// Stream daemon log lines
    Logs(LogsArgs),

    /// Keep refreshing the group view until interrupted
    Watch,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Mode ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ModeArgs {
    #[command(subcommand)]
    pub command: Option<ModeCommand>,
}

#[derive(Debug, Subcommand)]
pub enum ModeCommand {
    /// Print the current mode
    Get,
    /// Switch the daemon to another mode
    Set {
        #[arg(value_enum)]
        mode: ModeArg,
    },
}

// ── Groups ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: Option<GroupsCommand>,
}

#[derive(Debug, Subcommand)]
pub enum GroupsCommand {
    /// List resolved groups with their current selection
    #[command(alias = "ls")]
    List,
    /// Show one group's members and their latency
    Show {
        /// Group name
        name: String,
    },
}

// ── Proxies ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProxiesArgs {
    #[command(subcommand)]
    pub command: ProxiesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProxiesCommand {
    /// Show a single proxy or group
    Get {
        /// Proxy name
        name: String,
    },
}

// ── Latency ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DelayArgs {
    /// Proxy name
    pub name: String,

    /// URL the daemon fetches through the proxy
    #[arg(long)]
    pub url: Option<String>,

    /// Probe timeout in milliseconds
    #[arg(long = "probe-timeout", value_name = "MS")]
    pub probe_timeout: Option<u32>,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Group or proxy provider name
    pub group: String,
}

#[derive(Debug, Args)]
pub struct SwitchArgs {
    /// Selector group
    pub selector: String,

    /// Member to select
    pub name: String,
}

// ── Providers ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProvidersArgs {
    #[command(subcommand)]
    pub command: ProvidersCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProvidersCommand {
    /// List rule providers
    Rules,
    /// List proxy providers
    Proxies,
    /// Ask the daemon to re-fetch a proxy provider
    Update {
        /// Provider name
        name: String,
    },
}

// ── Streams ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TrafficArgs {
    /// Stop after this many samples (default: until interrupted)
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Minimum level to stream
    #[arg(long, short = 'l', value_enum, default_value = "info")]
    pub level: LevelArg,

    /// Stop after this many lines (default: until interrupted)
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive profile wizard
    Init,
    /// Print the effective configuration (secrets masked)
    Show,
    /// Print the config file location
    Path,
    /// List configured profiles (* marks the default)
    Profiles,
    /// Make a profile the default
    Use {
        /// Profile name
        name: String,
    },
    /// Store a profile's secret in the system keyring
    SetSecret,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
