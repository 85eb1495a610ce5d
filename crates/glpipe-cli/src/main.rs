//! glpipe CLI tool.

use clap::{Parser, Subcommand};
use glpipe_core::target::BuildTarget;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "glpipe")]
#[command(about = "Render image-publishing pipeline definitions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render pipeline definitions for a flavour set
    Render {
        /// Path to the flavour configuration document
        #[arg(long, env = "GLPIPE_FLAVOURS", default_value = "flavours.kdl")]
        config: String,
        /// Build target (build, manifest, release, publish)
        #[arg(long)]
        target: Option<BuildTarget>,
        /// Flavour set name
        #[arg(long)]
        flavour_set: Option<String>,
        /// Orchestrator namespace
        #[arg(long)]
        namespace: Option<String>,
        /// Branch the pipelines build from
        #[arg(long)]
        branch: Option<String>,
        /// OCI repository path (required for publish)
        #[arg(long)]
        oci_path: Option<String>,
        /// Credential fetch timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
    /// List the expanded flavours of a set
    Expand {
        /// Path to the flavour configuration document
        #[arg(long, env = "GLPIPE_FLAVOURS", default_value = "flavours.kdl")]
        config: String,
        /// Flavour set name
        #[arg(default_value = "all")]
        set: String,
    },
    /// Validate a flavour configuration document
    Validate {
        /// Path to the configuration file
        #[arg(default_value = "flavours.kdl")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            config,
            target,
            flavour_set,
            namespace,
            branch,
            oci_path,
            timeout,
        } => {
            let overrides = commands::RenderOverrides {
                target,
                flavour_set,
                namespace,
                branch,
                oci_path,
            };
            commands::render(&config, overrides, timeout).await?;
        }
        Commands::Expand { config, set } => {
            commands::expand(&config, &set)?;
        }
        Commands::Validate { path } => {
            commands::validate(&path)?;
        }
    }

    Ok(())
}
