use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "sesame",
    about = "Encrypted, session-scoped key-value store",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Key-name prefix; overrides `prefix` from the config file.
    #[arg(long, global = true)]
    pub prefix: Option<String>,
    /// Session directory; overrides `session_dir` from the config file.
    #[arg(long, global = true)]
    pub session_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the value stored under a key as JSON.
    Get { key: String },
    /// Store a value under a key. VALUE is parsed as JSON, falling back to a string.
    Set {
        key: String,
        value: String,
        /// Store VALUE as a JSON string even if it parses as JSON.
        #[arg(long)]
        raw: bool,
    },
    /// Remove the value stored under a key.
    Remove { key: String },
    /// List keys under the active prefix.
    Keys,
    /// Remove every entry under the active prefix.
    Clear,
    /// Print the physical storage name for a key.
    KeyName { key: String },
    /// Report whether TEXT is valid JSON.
    CheckJson { text: String },
    /// Round-trip a probe entry through the configured store.
    Health,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Manage the session area.
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Delete the session directory and every entry in it.
    End,
}
