//! `templar list`: show the template listing.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use templar_core::{FileRecordStore, RecordStore, SyncStatus, TemplateRecord};

use super::Invocation;

/// Arguments for `templar list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit the records as JSON.
    #[arg(long, conflicts_with = "html")]
    pub json: bool,

    /// Write an HTML listing to this path instead of printing a table.
    #[arg(long, value_name = "PATH")]
    pub html: Option<PathBuf>,
}

impl ListArgs {
    pub fn run(self, ctx: &Invocation) -> Result<ExitCode> {
        let home = ctx.home()?;
        let store = FileRecordStore::at_path(ctx.store_path(&home)?);
        let records = store
            .list_all()
            .with_context(|| format!("failed to read {}", store.path().display()))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&records).context("failed to serialize records")?
            );
        } else if let Some(path) = self.html {
            ctx.renderer(&home)?
                .write_listing(&path, &records, None)
                .with_context(|| format!("failed to write listing to {}", path.display()))?;
            println!("✓ wrote {} template(s) to {}", records.len(), path.display());
        } else {
            print_table(&records);
        }
        Ok(ExitCode::SUCCESS)
    }
}

#[derive(Tabled)]
struct ListRow {
    #[tabled(rename = "template")]
    name: String,
    #[tabled(rename = "project")]
    project: String,
    #[tabled(rename = "lab")]
    lab: String,
    #[tabled(rename = "prod")]
    prod: String,
    #[tabled(rename = "github")]
    github: String,
    #[tabled(rename = "updated")]
    updated: String,
}

pub fn print_table(records: &[TemplateRecord]) {
    if records.is_empty() {
        println!("No templates recorded. Run 'templar inventory' first.");
        return;
    }

    let rows: Vec<ListRow> = records
        .iter()
        .map(|r| ListRow {
            name: r.name.0.clone(),
            project: r.project_name.0.clone(),
            lab: r.in_lab.to_string(),
            prod: r.in_prod.to_string(),
            github: if r.in_github { "yes" } else { "no" }.to_string(),
            updated: r
                .update_date
                .map(format_age)
                .unwrap_or_else(|| "never".to_string()),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let drifted = records
        .iter()
        .filter(|r| r.in_lab == SyncStatus::OutOfSync || r.in_prod == SyncStatus::OutOfSync)
        .count();
    if drifted > 0 {
        println!(
            "{} template(s) {}. Run 'templar publish' or 'templar push'.",
            drifted,
            "NOT In Sync".red().bold()
        );
    }
}

fn format_age(at: DateTime<Utc>) -> String {
    let seconds = Utc::now().signed_duration_since(at).num_seconds().max(0) as u64;
    let age = if seconds < 60 {
        format!("{seconds}s")
    } else if seconds < 60 * 60 {
        format!("{}m", seconds / 60)
    } else if seconds < 60 * 60 * 24 {
        format!("{}h", seconds / (60 * 60))
    } else {
        format!("{}d", seconds / (60 * 60 * 24))
    };
    format!("{age} ago")
}
