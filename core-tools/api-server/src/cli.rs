//! CLI interface for pitchd
//!
//! Defines the commands and global flags using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pitch practice backend
///
/// Serves the judge, performance, speech and avatar endpoints used by the
/// pitch practice frontend.
#[derive(Parser, Debug)]
#[command(name = "pitchd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Address to listen on, overriding the config file
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// List the available judges
    Judges,

    /// Check configuration and credentials
    Doctor,
}
