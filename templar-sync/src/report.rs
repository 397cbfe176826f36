//! Per-template outcomes and the batch report every procedure returns.

use std::fmt;

use thiserror::Error;

use templar_core::{Environment, PullRequest, RemoteError, StoreError, SyncStatus, TemplateName};

/// The four reconciliation actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Inventory,
    Status,
    Publish,
    Push(Environment),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Inventory => write!(f, "inventory"),
            Action::Status => write!(f, "status"),
            Action::Publish => write!(f, "publish"),
            Action::Push(env) => write!(f, "push to {env}"),
        }
    }
}

/// What happened to one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Inventory: a new record was inserted.
    Added,
    /// Inventory: a record already existed and was left alone.
    Existing,
    /// Status: both controller states were computed and stored.
    Checked { lab: SyncStatus, prod: SyncStatus },
    /// Publish: repository already matches Lab.
    Unchanged,
    /// Publish: new content staged on the development branch.
    Changed,
    /// Publish: file created on the development branch.
    /// Push: template created on the controller.
    Created,
    /// Push: existing controller template replaced.
    Updated,
}

impl Change {
    /// Whether this change requires a pull request.
    pub fn touches_repository(self) -> bool {
        matches!(self, Change::Changed | Change::Created)
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Added => write!(f, "added"),
            Change::Existing => write!(f, "already recorded"),
            Change::Checked { lab, prod } => write!(f, "lab: {lab}, prod: {prod}"),
            Change::Unchanged => write!(f, "unchanged"),
            Change::Changed => write!(f, "changed"),
            Change::Created => write!(f, "created"),
            Change::Updated => write!(f, "updated"),
        }
    }
}

/// Why one template could not be reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateFailure {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("write conflict on {path}; the development branch moved since it was read")]
    Conflict { path: String },

    #[error("{step} failed: {message}")]
    Remote { step: String, message: String },

    #[error("record store: {0}")]
    Store(String),
}

impl TemplateFailure {
    /// Classify a remote error raised during `step`.
    pub fn remote(step: impl Into<String>, err: RemoteError) -> Self {
        match err {
            RemoteError::Conflict { path } => TemplateFailure::Conflict { path },
            RemoteError::Missing { what } => TemplateFailure::NotFound { what },
            other => TemplateFailure::Remote {
                step: step.into(),
                message: other.to_string(),
            },
        }
    }
}

impl From<StoreError> for TemplateFailure {
    fn from(err: StoreError) -> Self {
        TemplateFailure::Store(err.to_string())
    }
}

/// Outcome for a single template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateOutcome {
    pub name: TemplateName,
    pub result: Result<Change, TemplateFailure>,
}

/// Result of one reconciliation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub action: Action,
    pub outcomes: Vec<TemplateOutcome>,
    /// Human-readable outcome message.
    pub message: String,
    /// Pull request opened by `publish`, if any.
    pub pull_request: Option<PullRequest>,
    /// A failure after the per-template loop (e.g. opening the pull request).
    pub batch_failure: Option<String>,
}

impl BatchReport {
    pub fn new(action: Action, outcomes: Vec<TemplateOutcome>, message: impl Into<String>) -> Self {
        Self {
            action,
            outcomes,
            message: message.into(),
            pull_request: None,
            batch_failure: None,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = (&TemplateName, &TemplateFailure)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.name, e)))
    }

    pub fn has_failures(&self) -> bool {
        self.batch_failure.is_some() || self.failures().next().is_some()
    }

    /// Names whose successful change matches `pred`, in request order.
    pub fn names_where(&self, pred: impl Fn(Change) -> bool) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, Ok(c) if pred(c)))
            .map(|o| o.name.0.as_str())
            .collect()
    }

    /// Message plus a failure tail, for terminals and notifications.
    pub fn summary(&self) -> String {
        let mut out = self.message.clone();
        let failed: Vec<&str> = self.failures().map(|(n, _)| n.0.as_str()).collect();
        if !failed.is_empty() {
            out.push_str(&format!(
                " {} template(s) failed: {}.",
                failed.len(),
                failed.join(", ")
            ));
        }
        if let Some(batch) = &self.batch_failure {
            out.push(' ');
            out.push_str(batch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, result: Result<Change, TemplateFailure>) -> TemplateOutcome {
        TemplateOutcome {
            name: TemplateName::from(name),
            result,
        }
    }

    #[test]
    fn remote_errors_are_classified() {
        let conflict = TemplateFailure::remote(
            "update",
            RemoteError::Conflict {
                path: "p/t".to_string(),
            },
        );
        assert!(matches!(conflict, TemplateFailure::Conflict { .. }));

        let status = TemplateFailure::remote(
            "lab content",
            RemoteError::Status {
                url: "u".to_string(),
                status: 503,
            },
        );
        assert!(status.to_string().starts_with("lab content failed"));
    }

    #[test]
    fn summary_lists_failed_templates() {
        let report = BatchReport::new(
            Action::Status,
            vec![
                outcome("a", Ok(Change::Unchanged)),
                outcome(
                    "b",
                    Err(TemplateFailure::NotFound {
                        what: "b".to_string(),
                    }),
                ),
            ],
            "done.",
        );
        assert!(report.has_failures());
        assert_eq!(report.summary(), "done. 1 template(s) failed: b.");
        assert_eq!(report.names_where(|c| c == Change::Unchanged), vec!["a"]);
    }

    #[test]
    fn push_action_display_names_environment() {
        assert_eq!(Action::Push(Environment::Prod).to_string(), "push to prod");
    }
}
