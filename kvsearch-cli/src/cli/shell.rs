// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Interactive search console

use colored::Colorize;
use kvsearch::TextIndexManager;
use rustyline::{error::ReadlineError, CompletionType, Config, EditMode, Editor};
use std::path::Path;

use super::commands::OutputFormat;
use super::output::ResultFormatter;

/// One line of console input
#[derive(Debug, PartialEq)]
enum ShellCommand<'a> {
    Exit,
    Help,
    Clear,
    Catalogs,
    Use(&'a str),
    Limit(Option<usize>),
    Format(OutputFormat),
    Search(&'a str),
    Empty,
    Invalid(String),
}

fn parse_line(line: &str) -> ShellCommand<'_> {
    let trimmed = line.trim();
    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (trimmed, ""),
    };

    match head.to_lowercase().as_str() {
        "" => ShellCommand::Empty,
        "exit" | "quit" | "\\q" => ShellCommand::Exit,
        "help" | "\\h" => ShellCommand::Help,
        "clear" => ShellCommand::Clear,
        "catalogs" | "\\l" => ShellCommand::Catalogs,
        "use" if !rest.is_empty() => ShellCommand::Use(rest),
        "use" => ShellCommand::Invalid("Usage: use <catalog>".to_string()),
        "limit" if rest.is_empty() || rest == "default" => ShellCommand::Limit(None),
        "limit" => match rest.parse() {
            Ok(n) => ShellCommand::Limit(Some(n)),
            Err(_) => ShellCommand::Invalid(format!("Invalid limit: {}", rest)),
        },
        "format" => match rest.parse() {
            Ok(format) => ShellCommand::Format(format),
            Err(e) => ShellCommand::Invalid(e),
        },
        _ => ShellCommand::Search(trimmed),
    }
}

/// Handle the shell (REPL) command
pub async fn handle_shell(
    manager: &TextIndexManager,
    catalog: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut current = match catalog {
        Some(name) => {
            manager.engine(&name)?;
            Some(name)
        }
        None => manager.catalog_names().first().cloned(),
    };
    let mut limit: Option<usize> = None;
    let mut format = OutputFormat::Table;

    println!("{}", "KVSearch".bold().green());
    println!("Type 'help' for commands, 'exit' or 'quit' to exit");
    if let Some(name) = &current {
        println!("{}", format!("Searching catalog: {}", name).cyan());
    }

    let config = Config::builder()
        .edit_mode(EditMode::Emacs)
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .auto_add_history(false)
        .build();

    let mut rl = Editor::<(), _>::with_config(config)?;

    let history_path = ".kvsearch/.search_history.txt";
    if let Some(parent) = Path::new(&history_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = rl.load_history(&history_path);

    loop {
        let prompt = format!("{}> ", current.as_deref().unwrap_or("kvsearch").cyan());
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        };

        match parse_line(&line) {
            ShellCommand::Empty => continue,
            ShellCommand::Exit => {
                println!("{}", "Goodbye!".green());
                break;
            }
            ShellCommand::Help => print_help(),
            ShellCommand::Clear => {
                print!("\x1B[2J\x1B[1;1H");
                std::io::Write::flush(&mut std::io::stdout())?;
            }
            ShellCommand::Catalogs => {
                for name in manager.catalog_names() {
                    let marker = if current.as_ref() == Some(name) { "*" } else { " " };
                    println!("{} {}", marker, name);
                }
            }
            ShellCommand::Use(name) => match manager.engine(name) {
                Ok(_) => {
                    current = Some(name.to_string());
                    println!("{}", format!("Searching catalog: {}", name).cyan());
                }
                Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
            },
            ShellCommand::Limit(n) => {
                limit = n;
                match n {
                    Some(n) => println!("Result limit: {}", n),
                    None => println!("Result limit: {}", manager.config().default_limit),
                }
            }
            ShellCommand::Format(f) => format = f,
            ShellCommand::Invalid(message) => println!("{}", message.yellow()),
            ShellCommand::Search(query) => {
                rl.add_history_entry(query)?;
                let Some(name) = current.as_deref() else {
                    println!("{}", "No catalog selected, run 'use <catalog>'".yellow());
                    continue;
                };
                match manager.search(name, query, limit, None).await {
                    Ok(results) => println!("{}", ResultFormatter::format(&results, format)),
                    Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
                }
            }
        }
    }

    let _ = rl.save_history(&history_path);
    Ok(())
}

/// Print help message
fn print_help() {
    println!("{}", "Available commands:".bold().green());
    println!("  {}  - Show this help message", "help".cyan());
    println!("  {}  - Exit the console", "exit/quit".cyan());
    println!("  {}  - Clear the screen", "clear".cyan());
    println!("  {}  - List catalogs", "catalogs".cyan());
    println!("  {}  - Search another catalog", "use <catalog>".cyan());
    println!("  {}  - Set the result limit", "limit <n|default>".cyan());
    println!("  {}  - Switch output format", "format <table|json>".cyan());
    println!("\n{}", "Query syntax:".bold().green());
    println!("  Any other line is searched in the current catalog");
    println!("  {}  - Matches the word and its inflections", "tiger".yellow());
    println!("  {}  - Matches this spelling only", "\"Tiger\"".yellow());
    println!("  {}  - Drops documents containing the word", "-forest".yellow());
    println!("  {}  - Matches words starting with tig", "tig*".yellow());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("  "), ShellCommand::Empty);
        assert_eq!(parse_line("QUIT"), ShellCommand::Exit);
        assert_eq!(parse_line("use  news "), ShellCommand::Use("news"));
        assert_eq!(parse_line("limit 5"), ShellCommand::Limit(Some(5)));
        assert_eq!(parse_line("limit"), ShellCommand::Limit(None));
        assert_eq!(parse_line("format json"), ShellCommand::Format(OutputFormat::Json));
        assert_eq!(parse_line("tiger -forest"), ShellCommand::Search("tiger -forest"));
        assert!(matches!(parse_line("limit x"), ShellCommand::Invalid(_)));
        assert!(matches!(parse_line("use"), ShellCommand::Invalid(_)));
    }
}
