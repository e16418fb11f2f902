// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for KVSearch
//!
//! Provides document indexing from JSON files, one-off searches and an
//! interactive search console (REPL).

pub mod commands;
pub mod handlers;
pub mod output;
pub mod shell;

pub use commands::{Cli, Commands};
pub use handlers::{handle_index, handle_remove, handle_search, handle_version, open_manager};
pub use shell::handle_shell;
