//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// ssm-inject - resolve AWS SSM placeholders into build parameters
#[derive(Parser, Debug)]
#[command(name = "ssm-inject")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to ssm-inject.yaml settings file
    #[arg(short, long, global = true, env = "SSM_INJECT_CONFIG")]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List placeholder parameters without contacting the parameter store
    Detect(DetectArgs),

    /// Resolve placeholders and show the resulting build parameters
    Resolve(ResolveArgs),

    /// Resolve placeholders and run a command with the resolved environment
    Exec(ExecArgs),
}

/// Where build parameters come from
#[derive(Args, Debug, Clone)]
pub struct ParamsArgs {
    /// YAML file with `config:` and `build:` parameter maps
    #[arg(short, long)]
    pub params: Option<Utf8PathBuf>,

    /// Add the process environment as `env.*` build parameters
    #[arg(long)]
    pub inherit_env: bool,
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    #[command(flatten)]
    pub params: ParamsArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Grouped human-readable listing
    Text,
    /// JSON array of assignments
    Json,
    /// `export NAME='value'` lines for environment variables
    Shell,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub params: ParamsArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Show secret values in text and JSON output (WARNING: insecure)
    #[arg(long)]
    pub show_values: bool,

    /// Exit with an error when resolution fails instead of continuing
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct ExecArgs {
    #[command(flatten)]
    pub params: ParamsArgs,

    /// Do not run the command when resolution fails
    #[arg(long)]
    pub strict: bool,

    /// Command to run, with its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}
