//! `push`: make a controller carry the repository content of each template.

use templar_core::{Environment, StatusUpdate, TemplateIdentity, TemplateUpload};

use crate::reconciler::Reconciler;
use crate::report::{Action, BatchReport, Change, TemplateFailure, TemplateOutcome};

pub const NOTHING_SELECTED: &str = "Please select templates to update DNA Center";

impl Reconciler<'_> {
    /// Create or update each template on the `env` controller from the
    /// repository base branch, then mark the record with the
    /// "view on controller" marker.
    pub fn push_to_controller(
        &mut self,
        env: Environment,
        identities: &[TemplateIdentity],
    ) -> BatchReport {
        if identities.is_empty() {
            return BatchReport::new(Action::Push(env), Vec::new(), NOTHING_SELECTED);
        }

        let mut outcomes = Vec::with_capacity(identities.len());
        for identity in identities {
            let result = self.push_one(env, identity);
            match &result {
                Ok(change) => tracing::info!("{identity} on {env}: {change}"),
                Err(err) => tracing::warn!("push of {identity} to {env} failed: {err}"),
            }
            outcomes.push(TemplateOutcome {
                name: identity.name.clone(),
                result,
            });
        }

        let report = BatchReport::new(Action::Push(env), outcomes, String::new());
        let pushed = report.names_where(|c| matches!(c, Change::Created | Change::Updated));
        let message = if pushed.is_empty() {
            format!("No templates were pushed to {env}.")
        } else {
            format!("Pushed templates {} from Github to {env}", pushed.join(", "))
        };
        BatchReport { message, ..report }
    }

    fn push_one(
        &mut self,
        env: Environment,
        identity: &TemplateIdentity,
    ) -> Result<Change, TemplateFailure> {
        let record = self
            .store
            .find_by_name(&identity.name)?
            .ok_or_else(|| TemplateFailure::NotFound {
                what: format!("record for {}", identity.name),
            })?;

        let base = self.settings.base_branch.clone();
        let file = self
            .repository
            .read_file(identity, &base)
            .map_err(|e| TemplateFailure::remote("repository read", e))?
            .ok_or_else(|| TemplateFailure::NotFound {
                what: format!("{identity} in repository"),
            })?;

        let upload = TemplateUpload {
            identity,
            content: &file.content,
            device_types: &record.device_family,
            software_type: &record.software_type,
        };

        let controller = self.controller(env);
        let present = controller
            .template_content(identity)
            .map_err(|e| TemplateFailure::remote(format!("{env} content"), e))?
            .is_some();

        let change = if present {
            controller
                .update_template(upload)
                .map_err(|e| TemplateFailure::remote(format!("{env} update"), e))?;
            Change::Updated
        } else {
            controller
                .create_template(upload)
                .map_err(|e| TemplateFailure::remote(format!("{env} create"), e))?;
            Change::Created
        };

        self.persist(&identity.name, StatusUpdate::status(env, env.marker()))?;
        Ok(change)
    }
}
