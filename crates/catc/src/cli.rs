//! Clap derive structures for the `catc` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use catc_core::State;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// catc -- declarative desired state for Cisco Catalyst Center
#[derive(Debug, Parser)]
#[command(
    name = "catc",
    version,
    about = "Reconcile Cisco Catalyst Center with a declarative document",
    long_about = "Reads a YAML or JSON document describing sites, SDA fabric VLANs, \
        virtual networks, anycast gateways, event destinations, event notifications \
        and ITSM settings, then creates, updates or deletes controller objects until \
        the controller agrees with it.",
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
    /// Connection profile to use
    #[arg(long, short = 'p', env = "CATC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Profiles file (defaults to the platform config directory)
    #[arg(long, env = "CATC_PROFILES_FILE", global = true, value_name = "PATH")]
    pub profiles_file: Option<PathBuf>,

    /// Controller host or URL (overrides document and profile)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Controller username
    #[arg(long, short = 'u', global = true)]
    pub username: Option<String>,

    /// Controller password (prefer CATC_PASSWORD or a profile's password_env)
    #[arg(long, global = true, hide = true)]
    pub password: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Controller release to assume instead of asking the controller
    #[arg(long = "controller-version", global = true, value_name = "VERSION")]
    pub controller_version: Option<String>,

    /// Output format
    #[arg(long, short = 'o', env = "CATC_OUTPUT", default_value = "table", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Shared enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Bucket table (default)
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StateArg {
    /// Create or update every item
    Merged,
    /// Remove every item
    Deleted,
}

impl From<StateArg> for State {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::Merged => Self::Merged,
            StateArg::Deleted => Self::Deleted,
        }
    }
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Bring the controller into agreement with a document
    Apply(ApplyArgs),

    /// Check a document without contacting the controller
    #[command(alias = "check")]
    Validate(ValidateArgs),

    /// Show the controller release and the features it supports
    Version(VersionArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Input document (YAML or JSON)
    pub document: PathBuf,

    /// Override the document's state
    #[arg(long, short = 's')]
    pub state: Option<StateArg>,

    /// Re-read every processed item after applying
    #[arg(long)]
    pub verify: bool,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Input document (YAML or JSON)
    pub document: PathBuf,

    /// Override the document's state
    #[arg(long, short = 's')]
    pub state: Option<StateArg>,
}

#[derive(Debug, Args)]
pub struct VersionArgs {
    /// Input document supplying the connection (optional)
    pub document: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
