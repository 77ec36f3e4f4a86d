//! Terminal and JSON rendering of report output.
//!
//! Presentation only: everything here consumes already filtered, aggregated
//! and sorted data from the core pipeline.

use crate::models::{AggregatedEntry, UsageRecord};
use crate::pricing::PricingTable;
use colored::Colorize;

fn capped<T>(items: &[T], limit: Option<usize>) -> &[T] {
    match limit {
        Some(n) if n < items.len() => &items[..n],
        _ => items,
    }
}

fn format_time(timestamp: Option<chrono::DateTime<chrono::Utc>>) -> String {
    timestamp
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}

pub fn render_records(records: &[UsageRecord], limit: Option<usize>, json: bool) {
    let rows = capped(records, limit);
    if json {
        print_json(&rows);
        return;
    }
    if rows.is_empty() {
        println!("No usage records matched.");
        return;
    }

    println!(
        "{:<17} {:<24} {:<30} {:>9} {:>9} {:>9} {:>10} {:>10}",
        "TIME".bold(),
        "PROJECT".bold(),
        "MODEL".bold(),
        "INPUT".bold(),
        "OUTPUT".bold(),
        "CACHE W".bold(),
        "CACHE R".bold(),
        "COST".bold()
    );
    for record in rows {
        println!(
            "{:<17} {:<24} {:<30} {:>9} {:>9} {:>9} {:>10} {:>10}",
            format_time(record.timestamp),
            record.project,
            record.model.as_deref().unwrap_or("-"),
            record.input_tokens,
            record.output_tokens,
            record.cache_write_tokens,
            record.cache_read_tokens,
            format!("${:.4}", record.cost).green()
        );
    }

    let total_cost: f64 = rows.iter().map(|r| r.cost).sum();
    let total_tokens: u64 = rows.iter().map(|r| r.total_tokens()).sum();
    println!(
        "\n{} {} messages, {} tokens, {}",
        "Total:".bold(),
        rows.len(),
        total_tokens,
        format!("${:.4}", total_cost).green().bold()
    );
}

pub fn render_aggregated(rows: &[AggregatedEntry], limit: Option<usize>, json: bool) {
    let rows = capped(rows, limit);
    if json {
        print_json(&rows);
        return;
    }
    if rows.is_empty() {
        println!("No usage records matched.");
        return;
    }

    println!(
        "{:<12} {:<24} {:<30} {:>6} {:>10} {:>10} {:>10} {:>11} {:>10}",
        "DATE".bold(),
        "PROJECT".bold(),
        "MODEL".bold(),
        "MSGS".bold(),
        "INPUT".bold(),
        "OUTPUT".bold(),
        "CACHE W".bold(),
        "CACHE R".bold(),
        "COST".bold()
    );
    for row in rows {
        println!(
            "{:<12} {:<24} {:<30} {:>6} {:>10} {:>10} {:>10} {:>11} {:>10}",
            row.date.as_deref().unwrap_or("-"),
            row.project,
            row.model,
            row.message_count,
            row.input_tokens,
            row.output_tokens,
            row.cache_write_tokens,
            row.cache_read_tokens,
            format!("${:.4}", row.cost).green()
        );
    }

    let total_cost: f64 = rows.iter().map(|r| r.cost).sum();
    let total_messages: u64 = rows.iter().map(|r| r.message_count).sum();
    println!(
        "\n{} {} messages across {} rows, {}",
        "Total:".bold(),
        total_messages,
        rows.len(),
        format!("${:.4}", total_cost).green().bold()
    );
}

/// Per-model rows in table order. A JSON object would re-sort the keys
/// alphabetically, so the JSON output is an array of rows instead.
fn models_json(table: &PricingTable) -> Vec<serde_json::Value> {
    table
        .iter()
        .filter_map(|(name, pricing)| {
            let mut row = serde_json::to_value(pricing).ok()?;
            row.as_object_mut()?.insert("model".to_string(), name.into());
            Some(row)
        })
        .collect()
}

pub fn render_models(table: &PricingTable, json: bool) {
    if json {
        print_json(&models_json(table));
        return;
    }

    println!(
        "{:<40} {:>10} {:>10} {:>10} {:>10}",
        "MODEL".bold(),
        "IN $/M".bold(),
        "OUT $/M".bold(),
        "CW $/M".bold(),
        "CR $/M".bold()
    );
    let per_million = |rate: Option<f64>| match rate {
        Some(rate) => format!("{:.2}", rate * 1e6),
        None => "-".to_string(),
    };
    for (name, pricing) in table.iter() {
        println!(
            "{:<40} {:>10} {:>10} {:>10} {:>10}",
            name,
            per_million(pricing.input_cost_per_token),
            per_million(pricing.output_cost_per_token),
            per_million(pricing.cache_creation_input_token_cost),
            per_million(pricing.cache_read_input_token_cost)
        );
    }
    println!("\n{} models", table.len());
}

pub fn render_projects(projects: &[String], json: bool) {
    if json {
        print_json(&projects);
        return;
    }
    if projects.is_empty() {
        println!("No projects found.");
        return;
    }
    for project in projects {
        println!("{}", project);
    }
    println!("\n{} projects", projects.len());
}
