//! `status`: compare each controller against the repository base branch.

use chrono::Utc;

use templar_core::{Environment, StatusUpdate, SyncStatus, TemplateIdentity};

use crate::reconciler::Reconciler;
use crate::report::{Action, BatchReport, Change, TemplateFailure, TemplateOutcome};

pub const STATUS_COMPLETE: &str = "Template status sync update has been completed";

impl Reconciler<'_> {
    /// Recompute `inLab`, `inProd` and `inGitHub` for each identity.
    ///
    /// A template absent from the repository is marked "NOT in Github" on
    /// both controllers without contacting them. A repository read error
    /// leaves the record untouched, and `updateDate` is kept when either
    /// controller could not be read.
    pub fn sync_status(&mut self, identities: &[TemplateIdentity]) -> BatchReport {
        let outcomes = identities
            .iter()
            .map(|identity| {
                let result = self.status_one(identity);
                match &result {
                    Ok(change) => tracing::info!("{identity}: {change}"),
                    Err(err) => tracing::warn!("status of {identity} failed: {err}"),
                }
                TemplateOutcome {
                    name: identity.name.clone(),
                    result,
                }
            })
            .collect();
        BatchReport::new(Action::Status, outcomes, STATUS_COMPLETE)
    }

    fn status_one(&mut self, identity: &TemplateIdentity) -> Result<Change, TemplateFailure> {
        let base = self.settings.base_branch.clone();
        let file = self
            .repository
            .read_file(identity, &base)
            .map_err(|e| TemplateFailure::remote("repository read", e))?;

        let Some(file) = file else {
            self.persist(
                &identity.name,
                StatusUpdate {
                    in_lab: Some(SyncStatus::NotInRepository),
                    in_prod: Some(SyncStatus::NotInRepository),
                    in_github: Some(false),
                    update_date: None,
                },
            )?;
            return Ok(Change::Checked {
                lab: SyncStatus::NotInRepository,
                prod: SyncStatus::NotInRepository,
            });
        };

        self.persist(&identity.name, StatusUpdate::in_github(true))?;

        let mut first_failure = None;
        let mut computed = [SyncStatus::NotFound; 2];
        for (slot, env) in Environment::all().iter().copied().enumerate() {
            match self.controller(env).template_content(identity) {
                Ok(content) => {
                    let status = SyncStatus::compare(&file.content, content.as_deref());
                    self.persist(&identity.name, StatusUpdate::status(env, status))?;
                    computed[slot] = status;
                }
                Err(err) => {
                    let failure = TemplateFailure::remote(format!("{env} content"), err);
                    tracing::warn!("{identity}: {failure}");
                    first_failure.get_or_insert(failure);
                }
            }
        }

        // updateDate only moves when both sides were actually compared.
        if let Some(failure) = first_failure {
            return Err(failure);
        }
        self.persist(&identity.name, StatusUpdate::touched(Utc::now()))?;
        Ok(Change::Checked {
            lab: computed[0],
            prod: computed[1],
        })
    }
}
