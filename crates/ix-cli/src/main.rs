//! Intune configuration exporter CLI.
//!
//! `export` pulls compliance policies and Win32 applications from the
//! Graph API into per-object JSON manifests; `changelog` diffs the export
//! tree against a prior snapshot. Exit code 0 on success, 1 on any
//! uncaught failure.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::error;

mod commands;
mod config;

use commands::{run_changelog, run_export, ExportModule};
use config::AppConfig;
use ix_observability::{init_logging_with_config, LoggingConfig};

#[derive(Parser)]
#[command(name = "intune-export")]
#[command(version)]
#[command(about = "Exports Intune configuration objects to JSON manifests", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export configuration objects to the export tree
    Export {
        /// Module to export
        #[arg(short, long, value_enum)]
        module: ExportModule,
    },

    /// Generate a changelog by diffing exports against a prior snapshot
    Changelog {
        /// Directory holding the prior snapshot (empty prior state when omitted)
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,

        /// Identifier of the compared prior state, recorded in the changelog
        #[arg(long)]
        reference: Option<String>,
    },

    /// Show the resolved configuration
    Config {
        /// Show secrets (redacted by default)
        #[arg(long)]
        show_secrets: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging = if cli.json_logs {
        LoggingConfig::production()
    } else if cli.verbose {
        LoggingConfig::development()
    } else {
        LoggingConfig::default()
    };
    init_logging_with_config(logging);

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Export { module } => run_export(&config, module).await,
        Commands::Changelog {
            snapshot_dir,
            reference,
        } => run_changelog(&config, snapshot_dir, reference),
        Commands::Config { show_secrets } => {
            print_config(&config, show_secrets);
            Ok(())
        }
    }
}

fn print_config(config: &AppConfig, show_secrets: bool) {
    let secret = if show_secrets {
        config.azure.client_secret.expose_secret().to_string()
    } else {
        "***REDACTED***".to_string()
    };
    println!("{}", "Azure".bold());
    println!("  tenant_id:     {}", config.azure.tenant_id);
    println!("  client_id:     {}", config.azure.client_id);
    println!("  client_secret: {}", secret);
    println!("{}", "Graph".bold());
    println!("  api_version:   {}", config.graph.effective_version());
    println!("{}", "Export".bold());
    println!("  root:          {}", config.export.root.display());
    println!("  pretty_print:  {}", config.export.pretty_print);
    println!(
        "  assignments:   {}",
        config.export.include_assignments
    );
    println!("{}", "Changelog".bold());
    println!("  dir:           {}", config.changelog.dir.display());
}
