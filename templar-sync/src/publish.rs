//! `publish`: stage Lab content on the development branch and open one
//! pull request for the batch.

use templar_core::{BranchOutcome, RepoFile, StatusUpdate, TemplateIdentity};

use crate::reconciler::Reconciler;
use crate::report::{Action, BatchReport, Change, TemplateFailure, TemplateOutcome};

pub const PULL_REQUEST_OPENED: &str =
    "Pull Request has been created on Github. Please review the changes.";
pub const UP_TO_DATE: &str = "Github is up to date.";

impl Reconciler<'_> {
    /// Propagate Lab content into the repository through the development
    /// branch.
    ///
    /// Templates equal on both sides are never written. At most one pull
    /// request is opened per call, and only when something was staged.
    pub fn publish_branch(&mut self, identities: &[TemplateIdentity]) -> BatchReport {
        let mut branch = None;
        let mut outcomes = Vec::with_capacity(identities.len());
        for identity in identities {
            let result = self.publish_one(identity, &mut branch);
            match &result {
                Ok(change) => tracing::info!("{identity}: {change}"),
                Err(err) => tracing::warn!("publish of {identity} failed: {err}"),
            }
            outcomes.push(TemplateOutcome {
                name: identity.name.clone(),
                result,
            });
        }

        let mut report = BatchReport::new(Action::Publish, outcomes, UP_TO_DATE);
        let staged = report.names_where(Change::touches_repository).len();
        if staged == 0 {
            return report;
        }

        let (base, dev) = (
            self.settings.base_branch.clone(),
            self.settings.dev_branch.clone(),
        );
        match self.repository.open_pull_request(&base, &dev) {
            Ok(pr) => {
                tracing::info!("opened pull request #{} for {staged} template(s)", pr.number);
                report.message = PULL_REQUEST_OPENED.to_string();
                report.pull_request = Some(pr);
            }
            Err(err) => {
                tracing::error!("pull request {dev} -> {base} failed: {err}");
                report.message = format!("Changes were pushed to the {dev} branch on Github.");
                report.batch_failure = Some(format!("Opening the pull request failed: {err}"));
            }
        }
        report
    }

    fn publish_one(
        &mut self,
        identity: &TemplateIdentity,
        branch: &mut Option<BranchOutcome>,
    ) -> Result<Change, TemplateFailure> {
        let lab_content = self
            .lab
            .template_content(identity)
            .map_err(|e| TemplateFailure::remote("lab content", e))?
            .ok_or_else(|| TemplateFailure::NotFound {
                what: format!("{identity} on lab"),
            })?;

        let base = self.settings.base_branch.clone();
        let existing = self
            .repository
            .read_file(identity, &base)
            .map_err(|e| TemplateFailure::remote("repository read", e))?;

        if let Some(file) = &existing {
            if file.content == lab_content {
                self.persist(&identity.name, StatusUpdate::in_github(true))?;
                return Ok(Change::Unchanged);
            }
        }

        let outcome = self.ensure_dev_branch(branch)?;
        self.stage_on_dev(identity, &lab_content, existing, outcome)
    }

    /// Create the development branch from base once per invocation.
    fn ensure_dev_branch(
        &mut self,
        branch: &mut Option<BranchOutcome>,
    ) -> Result<BranchOutcome, TemplateFailure> {
        if let Some(outcome) = *branch {
            return Ok(outcome);
        }
        let (base, dev) = (
            self.settings.base_branch.clone(),
            self.settings.dev_branch.clone(),
        );
        let outcome = self
            .repository
            .create_branch(&base, &dev)
            .map_err(|e| TemplateFailure::remote("create branch", e))?;
        match outcome {
            BranchOutcome::Created => tracing::info!("created branch {dev} from {base}"),
            BranchOutcome::AlreadyExists => tracing::debug!("branch {dev} already exists"),
        }
        *branch = Some(outcome);
        Ok(outcome)
    }

    /// Write `content` on the development branch.
    ///
    /// The sha for an update comes from the development branch copy when
    /// there is one. The base branch copy stands in only for a branch created
    /// during this run, which starts as a copy of base. A pre-existing branch
    /// lacking the file gets it created.
    fn stage_on_dev(
        &mut self,
        identity: &TemplateIdentity,
        content: &str,
        on_base: Option<RepoFile>,
        branch: BranchOutcome,
    ) -> Result<Change, TemplateFailure> {
        let dev = self.settings.dev_branch.clone();
        let change = if on_base.is_some() {
            Change::Changed
        } else {
            Change::Created
        };

        let on_dev = self
            .repository
            .read_file(identity, &dev)
            .map_err(|e| TemplateFailure::remote("repository read", e))?;

        let target = match (on_dev, branch) {
            (Some(file), _) => Some(file),
            (None, BranchOutcome::Created) => on_base,
            (None, BranchOutcome::AlreadyExists) => None,
        };

        match target {
            Some(file) if file.content == content => {
                tracing::debug!("{identity} already staged on {dev}");
            }
            Some(file) => self
                .repository
                .update_file(identity, content, &file.sha, &dev)
                .map_err(|e| TemplateFailure::remote("repository update", e))?,
            None => self
                .repository
                .create_file(identity, content, &dev)
                .map_err(|e| TemplateFailure::remote("repository create", e))?,
        }
        Ok(change)
    }
}
