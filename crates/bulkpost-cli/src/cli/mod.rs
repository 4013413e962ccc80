//! CLI for the bulkpost batch dispatcher.

mod commands;

use anyhow::Result;
use bulkpost_core::config::{self, BulkConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_batch, run_config, run_results, RunOverrides};

/// Top-level CLI for bulkpost.
#[derive(Debug, Parser)]
#[command(name = "bulkpost")]
#[command(about = "bulkpost: bounded-concurrency bulk HTTP POST with retry", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// POST every line of a JSON-lines file to the endpoint.
    Run {
        /// Input file, one JSON payload per line.
        input: PathBuf,
        /// Override the configured endpoint URL.
        #[arg(long)]
        endpoint: Option<String>,
        /// Maximum simultaneous in-flight requests.
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
        /// Worker threads executing network calls.
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
        /// Items resolved per chunk before the next chunk is read.
        #[arg(long, value_name = "N")]
        chunk_size: Option<usize>,
        /// Retries after the first attempt for transient failures.
        #[arg(long, value_name = "N")]
        max_retries: Option<u32>,
        /// Do not write results to the results database.
        #[arg(long)]
        no_persist: bool,
    },

    /// Show results stored by previous runs.
    Results {
        /// Only show items that did not succeed.
        #[arg(long)]
        failed: bool,
    },

    /// Print the effective configuration and where it lives.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        cli.command.execute(cfg).await
    }

    async fn execute(self, cfg: BulkConfig) -> Result<()> {
        match self {
            CliCommand::Run {
                input,
                endpoint,
                concurrency,
                workers,
                chunk_size,
                max_retries,
                no_persist,
            } => {
                let overrides = RunOverrides {
                    endpoint,
                    concurrency,
                    workers,
                    chunk_size,
                    max_retries,
                };
                run_batch(overrides.apply(cfg), &input, !no_persist).await?;
            }
            CliCommand::Results { failed } => run_results(failed).await?,
            CliCommand::Config => run_config(&cfg)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
