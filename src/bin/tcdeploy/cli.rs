//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use tcdeploy::PlatformTarget;

/// tcdeploy - Multi-platform deploy orchestrator for the TotalCross packager
#[derive(Parser)]
#[command(name = "tcdeploy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile dependency libraries and deploy the main target
    Build(BuildArgs),

    /// List supported platforms and their packager flags
    Platforms,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Main target path (overrides `main_target`/`main_class` in tcdeploy.toml)
    pub target: Option<String>,

    /// Derive the main target from a class name (target/<Class>.jar)
    #[arg(long, conflicts_with = "target")]
    pub main_class: Option<String>,

    /// Deploy key
    #[arg(long, env = "TCDEPLOY_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Packager home directory (sets TOTALCROSS3_HOME)
    #[arg(long)]
    pub home: Option<String>,

    /// Platform to deploy the main target for (repeatable)
    #[arg(short, long = "platform")]
    pub platforms: Vec<PlatformTarget>,

    /// Classpath entry (repeatable; defaults to $CLASSPATH)
    #[arg(long)]
    pub classpath: Vec<String>,

    /// Glob selecting classpath modules to compile as libraries (repeatable)
    #[arg(long)]
    pub must_compile: Vec<String>,

    /// Application name (`/n`)
    #[arg(long)]
    pub name: Option<String>,

    /// Output directory (`/o`)
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Command line passed to the application (`/c`)
    #[arg(long)]
    pub command: Option<String>,

    /// iOS mobile provision file (`/m`)
    #[arg(long)]
    pub mobile_provision: Option<String>,

    /// Package everything into a single package (`/p`)
    #[arg(long)]
    pub single_package: bool,

    /// Extra environment variable for the packager, as KEY=VALUE (repeatable)
    #[arg(long, value_parser = parse_env_var)]
    pub env: Vec<(String, String)>,

    /// Extra argument passed verbatim to the packager (repeatable)
    #[arg(long = "arg", allow_hyphen_values = true)]
    pub extra_args: Vec<String>,

    /// Package manifest path
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Runtime launcher used to start the packager
    #[arg(long)]
    pub runtime: Option<String>,

    /// Do not fail when the packager exits with a non-zero status
    #[arg(long)]
    pub ignore_exit_status: bool,

    /// Print the planned packager calls as JSON and exit
    #[arg(long)]
    pub plan: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}

fn parse_env_var(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("invalid environment variable '{}'; expected KEY=VALUE", s)),
    }
}
