// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! KVSearch command-line entry point

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else if let Some(level) = cli.log_level {
        builder.filter_level(level.to_level_filter());
    }
    builder.format_timestamp(None).init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Commands::Version = cli.command {
        cli::handle_version();
        return Ok(());
    }

    let manager = cli::open_manager(&cli.config, cli.storage, &cli.path)?;

    match cli.command {
        Commands::Version => Ok(()),
        Commands::Index {
            file,
            store,
            key_path,
            replace,
        } => cli::handle_index(&manager, &file, &store, &key_path, replace).await,
        Commands::Search {
            catalog,
            query,
            limit,
            threshold,
            format,
        } => cli::handle_search(&manager, &catalog, &query, limit, threshold, format).await,
        Commands::Remove { store, keys } => cli::handle_remove(&manager, &store, &keys).await,
        Commands::Shell { catalog } => cli::handle_shell(&manager, catalog).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli).await {
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}
