//! Command line interface.
//!
//! [`Cli`] carries the subcommands (watch, check, status) and the global
//! flags that override `flinkwatch.toml`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::WatchConfig;

/// flinkwatch: edge-triggered health alerts for Flink SQL jobs.
#[derive(Debug, Parser)]
#[command(name = "flinkwatch", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to ./flinkwatch.toml when present).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Seconds between polling cycles.
    #[arg(long, global = true)]
    pub interval: Option<u64>,

    /// Consecutive fetch failures before a connectivity alert.
    #[arg(long, global = true)]
    pub threshold: Option<u32>,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll the configured jobs until interrupted.
    Watch,

    /// Run a single polling cycle and exit (for cron).
    Check {
        /// Log alerts instead of sending them; no restarts, nothing persisted.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the persisted status of every watched job.
    Status,
}

impl Cli {
    /// Flags take precedence over file and environment values.
    pub fn apply_overrides(&self, config: &mut WatchConfig) {
        if let Some(interval) = self.interval {
            config.check_interval_secs = interval;
        }
        if let Some(threshold) = self.threshold {
            config.failure_threshold = threshold;
        }
    }
}
