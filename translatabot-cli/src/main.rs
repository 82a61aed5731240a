//! Translatabot: offline tooling for incremental localization sync.
//!
//! # Usage
//!
//! ```text
//! translatabot flatten <file.json>
//! translatabot diff <previous.json> <current.json> [--all]
//! translatabot plan --config <translatabot.yml> [--previous <json>] [--root <dir>] [--json]
//! translatabot preview --current <json> --target <json> [--previous <json>] [--language <name>]
//! translatabot init-config [--default-path <path>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    diff::DiffArgs, flatten::FlattenArgs, init_config::InitConfigArgs, plan::PlanArgs,
    preview::PreviewArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "translatabot",
    version,
    about = "Keep translated localization files in sync with their source",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every `path = value` entry of a localization file.
    Flatten(FlattenArgs),

    /// Classify the entries of two revisions of a source file.
    Diff(DiffArgs),

    /// Show what a sync run would translate for each configured language.
    Plan(PlanArgs),

    /// Merge with a mock translator and print the resulting file diff.
    Preview(PreviewArgs),

    /// Print the starter configuration file.
    InitConfig(InitConfigArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Flatten(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Plan(args) => args.run(),
        Commands::Preview(args) => args.run(),
        Commands::InitConfig(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
