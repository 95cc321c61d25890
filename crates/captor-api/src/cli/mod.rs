//! CLI command definitions and dispatch targets.
//!
//! Uses clap derive for argument parsing. Subcommands are organized by
//! resource type (agents, status) plus the `serve` entry point.

pub mod agent;
pub mod status;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Run and inspect the Captor agent backend.
#[derive(Parser)]
#[command(name = "captor", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (defaults to `[server] port`).
        #[arg(long, env = "CAPTOR_PORT")]
        port: Option<u16>,

        /// Address to bind (defaults to `[server] host`).
        #[arg(long, env = "CAPTOR_HOST")]
        host: Option<String>,
    },

    /// Show record counts and storage info.
    Status,

    /// List the agents owned by a user.
    #[command(alias = "ls")]
    Agents {
        /// Owner's email address.
        #[arg(long, short)]
        user: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

impl Cli {
    /// Log filter implied by `-v`/`--quiet`, if any.
    pub fn log_filter(&self) -> Option<&'static str> {
        match self.verbose {
            0 if self.quiet => Some("error"),
            0 => None,
            1 => Some("info,captor_core=debug,captor_infra=debug,captor_api=debug"),
            _ => Some("trace"),
        }
    }
}
