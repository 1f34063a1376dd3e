//! CLI module - Command-line interface for `KeyColony`
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// `KeyColony` - device activation and license key server
#[derive(Parser)]
#[command(name = "keycolony")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server (default)
    #[command(alias = "daemon", alias = "-d", alias = "--daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Inspect registered devices
    Devices {
        #[command(subcommand)]
        command: DeviceCommands,
    },

    /// Inspect administrative users
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Inspect the audit log
    Logs {
        #[command(subcommand)]
        command: LogCommands,
    },
}

#[derive(Subcommand)]
pub enum DeviceCommands {
    /// List all devices, newest first
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List users with their effective permissions
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
pub enum LogCommands {
    /// Show the most recent audit entries
    #[command(alias = "ls")]
    List {
        /// Number of entries to show
        #[arg(default_value = "20")]
        limit: usize,
    },
}

pub use commands::*;
