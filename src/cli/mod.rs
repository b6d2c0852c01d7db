//! # FPCTL CLI
//!
//! Command-line interface for the File Picker Controller.
//!
//! ## Usage
//!
//! ```bash
//! # List all FilePicker resources
//! fpctl list
//!
//! # Show status of a FilePicker
//! fpctl status wallpaper --namespace default
//!
//! # Clear the selection so the controller picks again
//! fpctl reset wallpaper --namespace default
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kube::Client;

mod list;
mod reset;
mod status;

/// File Picker Controller CLI
#[derive(Parser)]
#[command(name = "fpctl")]
#[command(
    about = "File Picker Controller CLI",
    long_about = None,
    after_help = "\
Examples:
  fpctl list
  fpctl status wallpaper --namespace default
  fpctl reset wallpaper
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Kubernetes namespace (defaults to all namespaces for `list`, `default` otherwise)
    #[arg(short, long, global = true)]
    namespace: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List FilePicker resources
    List,
    /// Show detailed status of a FilePicker
    Status {
        /// Name of the FilePicker resource
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Clear the selected file and reconciledAt so a new file is picked
    Reset {
        /// Name of the FilePicker resource
        #[arg(value_name = "NAME")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_provider| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fpctl=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;

    match cli.command {
        Commands::List => list::list_command(client, cli.namespace).await,
        Commands::Status { name } => status::status_command(client, name, cli.namespace).await,
        Commands::Reset { name } => reset::reset_command(client, name, cli.namespace).await,
    }
}
