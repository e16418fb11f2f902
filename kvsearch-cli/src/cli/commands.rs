// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command definitions for KVSearch

use clap::{Parser, Subcommand, ValueEnum};
use kvsearch::StorageType;
use std::path::PathBuf;

/// Log level options
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only errors
    Error,
    /// Warnings and errors
    Warn,
    /// Info, warnings, and errors
    Info,
    /// Debug messages and above (verbose)
    Debug,
    /// All messages including trace (very verbose)
    Trace,
    /// Disable all logging
    Off,
}

impl LogLevel {
    /// Convert to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

/// KVSearch CLI - full-text search over a key-value index
#[derive(Parser)]
#[command(name = "kvsearch")]
#[command(about = "KVSearch - Embeddable full-text search over ordered key-value stores")]
#[command(version)]
pub struct Cli {
    /// Catalog configuration file (JSON with a `fullTextCatalogs` list)
    #[arg(short = 'c', long = "config", global = true, default_value = "kvsearch.json")]
    pub config: PathBuf,

    /// Index storage backend (sled, redb, memory)
    #[arg(short = 's', long = "storage", global = true, default_value = "sled")]
    pub storage: StorageType,

    /// Index database path
    #[arg(long, global = true, default_value = "./index")]
    pub path: PathBuf,

    /// Set log level (error, warn, info, debug, trace, off)
    #[arg(short = 'l', long = "log-level", global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Verbose mode (equivalent to --log-level debug)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Show detailed version information
    Version,

    /// Index documents from a JSON file (one document or an array)
    Index {
        /// JSON file with the documents
        file: PathBuf,

        /// Store the documents belong to
        #[arg(long)]
        store: String,

        /// Dotted path of the primary key inside each document
        #[arg(short, long, default_value = "id")]
        key_path: String,

        /// Drop earlier entries of the same documents first
        #[arg(short, long)]
        replace: bool,
    },

    /// Search a catalog
    Search {
        /// Catalog name
        catalog: String,

        /// Free-text query: `term`, `"exact"`, `-excluded`, `prefix*`
        query: String,

        /// Maximum number of results
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Score that allows stopping before all lookups ran
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Remove indexed documents of a store
    Remove {
        /// Store the documents belong to
        #[arg(long)]
        store: String,

        /// Primary keys to remove; all documents of the store when empty
        keys: Vec<String>,
    },

    /// Interactive search console (REPL)
    Shell {
        /// Catalog selected on startup
        #[arg(long)]
        catalog: Option<String>,
    },
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from([
            "kvsearch", "search", "test", "tiger -forest", "-n", "3", "--format", "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Search {
                catalog,
                query,
                limit,
                format,
                ..
            } => {
                assert_eq!(catalog, "test");
                assert_eq!(query, "tiger -forest");
                assert_eq!(limit, Some(3));
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected search"),
        }
        assert_eq!(cli.storage, StorageType::Sled);
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "kvsearch", "remove", "--store", "article", "1", "2", "--storage", "memory", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.storage, StorageType::Memory);
        assert!(matches!(cli.command, Commands::Remove { ref keys, .. } if keys.len() == 2));
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!("csv".parse::<OutputFormat>().is_err());
    }
}
