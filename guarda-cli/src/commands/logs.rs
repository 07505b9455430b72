//! Logs command - recent events and failures from the event log

use anyhow::{anyhow, Result};
use chrono::{TimeZone, Utc};
use clap::Args;
use colored::Colorize;

use super::Session;
use crate::output;
use guarda_core::{FailureSummary, LogEntry};

#[derive(Args)]
pub struct LogsArgs {
    /// Number of entries to show
    #[arg(short, long, default_value = "50")]
    limit: usize,
    /// Show only failures, grouped by operation and collaborator
    #[arg(long)]
    errors: bool,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(session: &Session, args: LogsArgs) -> Result<()> {
    let log = session
        .logger()
        .ok_or_else(|| anyhow!("The event log could not be opened"))?;

    if args.errors {
        let summary = log.failure_summary()?;
        let entries = log.get_errors(args.limit)?;
        if args.json {
            let body = serde_json::json!({ "summary": summary, "entries": entries });
            println!("{}", serde_json::to_string_pretty(&body)?);
        } else {
            print_summary(&summary);
            print_entries(&entries);
        }
        return Ok(());
    }

    let entries = log.get_recent(args.limit)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        print_entries(&entries);
    }
    Ok(())
}

fn format_timestamp(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

fn print_summary(summary: &[FailureSummary]) {
    if summary.is_empty() {
        output::success("No failures recorded.");
        return;
    }

    let mut table = output::create_table();
    table.set_header(vec!["Operation", "Collaborator", "Failures", "Last seen"]);
    for row in summary {
        table.add_row(vec![
            output::optional(row.operation.as_deref()),
            output::optional(row.collaborator.as_deref()),
            row.failures.to_string(),
            format_timestamp(row.last_seen),
        ]);
    }
    println!("{}", table);
    println!();
}

fn print_entries(entries: &[LogEntry]) {
    if entries.is_empty() {
        output::info("No log entries found.");
        return;
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "Event", "Operation", "Collaborator", "Error"]);
    for entry in entries {
        let event = match &entry.command {
            Some(command) => format!("{} ({})", entry.event, command),
            None => entry.event.clone(),
        };
        let error = match &entry.error_message {
            Some(message) => message.red().to_string(),
            None => String::new(),
        };
        table.add_row(vec![
            format_timestamp(entry.timestamp),
            event,
            output::optional(entry.operation.as_deref()),
            output::optional(entry.collaborator.as_deref()),
            error,
        ]);
    }
    println!("{}", table);
}
