//! Review command - interactive per-tool verdicts, or `--yes` accept-all
//!
//! Fetches the live tool list, walks the reviewer through each tool, and
//! writes a policy file whose checksums pin the exact descriptions that were
//! on screen during review.

use std::collections::HashMap;
use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use toolgate_core::{accept_all, build_policy, tool_checksum, Choice, Policy, ToolDescriptor};
use toolgate_mcp::{fetch_tools, probe, ServerLocator};
use tracing::info;

use crate::cli::ReviewArgs;
use crate::EXIT_CANCELLED;

pub async fn run(args: ReviewArgs) -> Result<i32> {
    let locator = ServerLocator::parse(&args.server, args.sse)?;
    let io_timeout = Duration::from_secs(args.timeout);

    probe(&locator, io_timeout)
        .await
        .with_context(|| format!("server {} is not reachable", locator))?;

    let fetched = fetch_tools(&locator, io_timeout)
        .await
        .with_context(|| format!("failed to fetch tools from {}", locator))?;
    let origin = fetched.origin(&locator);
    info!(server = %origin, tools = fetched.tools.len(), "fetched tool list for review");

    if fetched.tools.is_empty() {
        println!("Server {} advertises no tools; nothing to review.", origin);
        return Ok(0);
    }

    let policy = if args.yes {
        println!(
            "Accepting all {} tools from {} without review (--yes).",
            fetched.tools.len(),
            origin
        );
        accept_all(&fetched.tools, &origin, locator.kind())
    } else {
        match review_interactively(&fetched.tools, &origin, locator.kind()).await? {
            Some(policy) => policy,
            None => {
                println!("\nReview cancelled; no policy written.");
                return Ok(EXIT_CANCELLED);
            }
        }
    };

    let written = policy.save(&args.config)?;
    println!(
        "\nPolicy written to {} ({} allowed, {} denied, {} malicious).",
        written.display().to_string().bold(),
        policy.allowed.len().to_string().green(),
        policy.denied.len().to_string().yellow(),
        policy.malicious.len().to_string().red(),
    );
    Ok(0)
}

/// Walk the reviewer through each tool. Returns `None` on Ctrl-C.
async fn review_interactively(
    tools: &[ToolDescriptor],
    origin: &str,
    kind: toolgate_core::ServerKind,
) -> Result<Option<Policy>> {
    println!(
        "Reviewing {} tools from {}\n",
        tools.len().to_string().bold(),
        origin.bold()
    );

    let mut choices = HashMap::new();
    for (index, tool) in tools.iter().enumerate() {
        println!("[{}/{}] {}", index + 1, tools.len(), tool.name.bold());
        if tool.description.is_empty() {
            println!("      {}", "(no description provided)".dimmed());
        } else {
            for line in tool.description.lines() {
                println!("      {}", line);
            }
        }
        println!(
            "      {} {}",
            "checksum:".dimmed(),
            tool_checksum(&tool.name, &tool.description, Some(origin)).dimmed()
        );

        loop {
            let Some(answer) = prompt("  Allow this tool? [y]/m/n/i: ").await? else {
                return Ok(None);
            };
            match answer.trim().to_lowercase().as_str() {
                "" | "y" | "yes" => {
                    choices.insert(tool.name.clone(), Choice::Allow);
                }
                "m" | "malicious" => {
                    choices.insert(tool.name.clone(), Choice::Malicious);
                }
                "n" | "no" => {
                    choices.insert(tool.name.clone(), Choice::Deny);
                }
                "i" | "ignore" => {}
                _ => {
                    println!("  Please answer y (allow), m (malicious), n (deny), or i (ignore).");
                    continue;
                }
            }
            break;
        }
        println!();
    }

    Ok(Some(build_policy(tools, &choices, origin, kind)))
}

/// Print a prompt and read one line from stdin. Returns `None` on Ctrl-C.
async fn prompt(text: &str) -> Result<Option<String>> {
    let text = text.to_string();
    let read = tokio::task::spawn_blocking(move || {
        print!("{}", text);
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok::<_, io::Error>(line)
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => Ok(None),
        result = read => Ok(Some(result.context("prompt reader panicked")??)),
    }
}
