//! Specimen CLI - incremental style guide builder.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "specimen")]
#[command(about = "Incremental style guide builder")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (TOML or JSON)
    #[arg(short, long, default_value = "specimen.toml", global = true)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the whole guide, or only the page for one source file
    Build {
        /// Stylesheet or markdown file to rebuild
        target: Option<PathBuf>,
    },

    /// Build, then rebuild pages as their sources change
    Watch,

    /// Preview the built guide
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Build { target } => {
            commands::build::run(&cli.config, target).await?;
        }
        Commands::Watch => {
            commands::watch::run(&cli.config).await?;
        }
        Commands::Serve { port, no_open } => {
            commands::serve::run(&cli.config, port, !no_open).await?;
        }
    }

    Ok(())
}
