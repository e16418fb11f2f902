// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Search result formatting

use super::commands::OutputFormat;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use kvsearch::RankEntryJson;

pub struct ResultFormatter;

impl ResultFormatter {
    pub fn format(results: &[RankEntryJson], format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => Self::format_table(results),
            OutputFormat::Json => Self::format_json(results),
        }
    }

    fn format_table(results: &[RankEntryJson]) -> String {
        if results.is_empty() {
            return "No results".yellow().to_string();
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["#", "store", "primary key", "score", "matches"]);

        for (rank, result) in results.iter().enumerate() {
            let matches: Vec<String> = result
                .tokens
                .iter()
                .map(|t| format!("{}: {} @{:?}", t.key_path, t.value, t.positions))
                .collect();
            table.add_row(vec![
                Cell::new(rank + 1),
                Cell::new(&result.store_name),
                Cell::new(&result.primary_key),
                Cell::new(format!("{:.4}", result.score)),
                Cell::new(matches.join("\n")),
            ]);
        }

        format!(
            "{}\n{}",
            table,
            format!("{} result(s)", results.len()).dimmed()
        )
    }

    fn format_json(results: &[RankEntryJson]) -> String {
        serde_json::to_string_pretty(results).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}
