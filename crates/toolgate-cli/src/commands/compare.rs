//! Compare command - classify a server's live tools against a policy file

use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use toolgate_core::{compare, summarize, Classification, ComparisonRecord, Policy, Snapshot};
use toolgate_mcp::{fetch_tools, probe, ServerLocator};
use tracing::info;

use crate::cli::CompareArgs;

/// Descriptions longer than this are truncated in the table
const DESCRIPTION_WIDTH: usize = 60;

pub async fn run(args: CompareArgs) -> Result<i32> {
    let policy = Policy::load(&args.config)
        .with_context(|| format!("failed to load policy from {}", args.config))?;

    let locator = ServerLocator::parse(&args.server, args.sse)?;
    let io_timeout = Duration::from_secs(args.timeout);

    probe(&locator, io_timeout)
        .await
        .with_context(|| format!("server {} is not reachable", locator))?;

    let fetched = fetch_tools(&locator, io_timeout)
        .await
        .with_context(|| format!("failed to fetch tools from {}", locator))?;
    let origin = fetched.origin(&locator);
    info!(server = %origin, tools = fetched.tools.len(), "fetched tool list for comparison");

    let snapshot = Snapshot::from_tools(&fetched.tools, Some(&origin));
    let records = compare(&policy, &snapshot);
    let summary = summarize(&records, &policy, &snapshot);

    println!(
        "Comparing {} against {}\n",
        args.config.bold(),
        origin.bold()
    );
    print_table(&records);

    println!();
    println!("  Tools on server:     {}", summary.server_tools);
    println!("  Allowed:             {}", summary.allowed_tools.to_string().green());
    println!("  Denied:              {}", summary.denied_tools.to_string().yellow());
    println!("  Malicious:           {}", summary.malicious_tools.to_string().red());
    println!(
        "  Checksum mismatches: {}",
        if summary.checksum_mismatches == 0 {
            summary.checksum_mismatches.to_string().green()
        } else {
            summary.checksum_mismatches.to_string().red()
        }
    );

    Ok(0)
}

fn print_table(records: &[ComparisonRecord]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Tool",
            "On Server",
            "Allowed",
            "Checksum Match",
            "Type",
            "Description",
        ]);

    for record in records {
        table.add_row(vec![
            Cell::new(&record.tool),
            mark(record.on_server),
            mark(record.in_allowed),
            mark(record.checksum_match),
            classification_cell(record.classification),
            Cell::new(truncate(&record.description)),
        ]);
    }

    println!("{}", table);
}

fn mark(value: bool) -> Cell {
    if value {
        Cell::new("✔".green().to_string())
    } else {
        Cell::new("✘".red().to_string())
    }
}

fn classification_cell(classification: Classification) -> Cell {
    let label = classification.to_string();
    let colored = match classification {
        Classification::Allowed => label.green().to_string(),
        Classification::Malicious => label.red().to_string(),
        Classification::Denied => label.yellow().to_string(),
        Classification::ChecksumMismatch => label.red().to_string(),
        Classification::Unknown => label.dimmed().to_string(),
    };
    Cell::new(colored)
}

fn truncate(description: &str) -> String {
    let flat = description.replace('\n', " ");
    if flat.chars().count() <= DESCRIPTION_WIDTH {
        return flat;
    }
    let cut: String = flat.chars().take(DESCRIPTION_WIDTH - 3).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_descriptions() {
        assert_eq!(truncate("reads a file"), "reads a file");
    }

    #[test]
    fn test_truncate_flattens_and_bounds_long_descriptions() {
        let long = "line one\n".repeat(20);
        let out = truncate(&long);
        assert!(!out.contains('\n'));
        assert_eq!(out.chars().count(), DESCRIPTION_WIDTH);
        assert!(out.ends_with("..."));
    }
}
