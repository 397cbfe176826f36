//! `inventory`: record every Lab template the store does not know yet.

use chrono::Utc;

use templar_core::TemplateRecord;

use crate::error::SyncError;
use crate::reconciler::Reconciler;
use crate::report::{Action, BatchReport, Change, TemplateFailure, TemplateOutcome};

impl Reconciler<'_> {
    /// Discover Lab templates and insert a record for each unknown name.
    ///
    /// Existing records are never modified. A failed Lab listing aborts the
    /// request; a failed detail fetch only skips that template.
    pub fn rebuild_inventory(&mut self) -> Result<BatchReport, SyncError> {
        let listing = self.lab.list_templates()?;
        tracing::info!("lab lists {} template(s)", listing.len());

        let mut outcomes = Vec::with_capacity(listing.len());
        for summary in listing {
            let result = self.inventory_one(&summary.id);
            if let Err(err) = &result {
                tracing::warn!("inventory of {} failed: {err}", summary.name);
            }
            outcomes.push(TemplateOutcome {
                name: summary.name,
                result,
            });
        }

        let report = BatchReport::new(Action::Inventory, outcomes, String::new());
        let added = report.names_where(|c| c == Change::Added);
        let message = if added.is_empty() {
            "Database has all the templates from DNA Center. No entry has been added.".to_string()
        } else {
            format!("Added Templates to Database: {}", added.join(", "))
        };
        Ok(BatchReport { message, ..report })
    }

    fn inventory_one(&mut self, template_id: &str) -> Result<Change, TemplateFailure> {
        let detail = self
            .lab
            .template_detail(template_id)
            .map_err(|e| TemplateFailure::remote("lab template detail", e))?;

        if self.store.exists(&detail.name)? {
            return Ok(Change::Existing);
        }
        self.store
            .insert(TemplateRecord::discovered(&detail, Utc::now()))?;
        tracing::info!("recorded new template {}", detail.name);
        Ok(Change::Added)
    }
}
