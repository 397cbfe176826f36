//! Serializable rendering payloads built from records and batch reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use templar_core::{PullRequest, TemplateRecord};
use templar_sync::BatchReport;

use crate::error::RenderError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

fn stamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Payload for `listing.html.tera`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingContext {
    pub generated_at: String,
    /// Outcome message of the action that preceded the listing, if any.
    pub message: Option<String>,
    pub templates: Vec<ListingRow>,
}

/// One record, flattened for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingRow {
    pub name: String,
    pub project: String,
    /// Product families joined with ", ".
    pub device_family: String,
    pub software_type: String,
    pub in_lab: String,
    pub in_prod: String,
    pub in_github: bool,
    pub created: String,
    pub updated: Option<String>,
}

impl ListingRow {
    pub fn from_record(record: &TemplateRecord) -> Self {
        Self {
            name: record.name.0.clone(),
            project: record.project_name.0.clone(),
            device_family: record
                .device_family
                .iter()
                .map(|d| d.product_family.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            software_type: record.software_type.clone(),
            in_lab: record.in_lab.to_string(),
            in_prod: record.in_prod.to_string(),
            in_github: record.in_github,
            created: stamp(record.create_date),
            updated: record.update_date.map(stamp),
        }
    }
}

impl ListingContext {
    pub fn from_records(records: &[TemplateRecord], message: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            generated_at: stamp(now),
            message: message.map(str::to_string),
            templates: records.iter().map(ListingRow::from_record).collect(),
        }
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        Ok(tera::Context::from_serialize(self)?)
    }
}

/// Payload for `notification.md.tera`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportContext {
    pub action: String,
    pub message: String,
    pub pull_request: Option<PullRequest>,
    pub changes: Vec<ChangeRow>,
    pub failures: Vec<FailureRow>,
    pub batch_failure: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRow {
    pub name: String,
    pub change: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRow {
    pub name: String,
    pub reason: String,
}

impl ReportContext {
    pub fn from_report(report: &BatchReport) -> Self {
        let mut changes = Vec::new();
        let mut failures = Vec::new();
        for outcome in &report.outcomes {
            match &outcome.result {
                Ok(change) => changes.push(ChangeRow {
                    name: outcome.name.0.clone(),
                    change: change.to_string(),
                }),
                Err(failure) => failures.push(FailureRow {
                    name: outcome.name.0.clone(),
                    reason: failure.to_string(),
                }),
            }
        }
        Self {
            action: report.action.to_string(),
            message: report.message.clone(),
            pull_request: report.pull_request.clone(),
            changes,
            failures,
            batch_failure: report.batch_failure.clone(),
        }
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        Ok(tera::Context::from_serialize(self)?)
    }
}
