//! The [`Reconciler`] and the plumbing shared by its procedures.
//!
//! Capabilities are borrowed for the duration of one request. Procedures
//! live in their own modules:
//!
//! | Procedure                 | Module      |
//! |---------------------------|-------------|
//! | `rebuild_inventory`       | `inventory` |
//! | `sync_status`             | `status`    |
//! | `publish_branch`          | `publish`   |
//! | `push_to_controller`      | `push`      |

use templar_core::{
    config::{DEFAULT_BASE_BRANCH, DEFAULT_DEV_BRANCH},
    Controller, Environment, RecordStore, Repository, StatusUpdate, TemplateName,
};

use crate::report::TemplateFailure;

/// Branch names used by `status`, `publish` and `push`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Branch holding canonical template content; pull requests target it.
    pub base_branch: String,
    /// Branch receiving Lab content before review.
    pub dev_branch: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            base_branch: DEFAULT_BASE_BRANCH.to_string(),
            dev_branch: DEFAULT_DEV_BRANCH.to_string(),
        }
    }
}

pub struct Reconciler<'a> {
    pub(crate) store: &'a mut dyn RecordStore,
    pub(crate) repository: &'a mut dyn Repository,
    pub(crate) lab: &'a mut dyn Controller,
    pub(crate) prod: &'a mut dyn Controller,
    pub(crate) settings: SyncSettings,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        store: &'a mut dyn RecordStore,
        repository: &'a mut dyn Repository,
        lab: &'a mut dyn Controller,
        prod: &'a mut dyn Controller,
        settings: SyncSettings,
    ) -> Self {
        if lab.environment() != Environment::Lab || prod.environment() != Environment::Prod {
            tracing::warn!(
                "controller environments look swapped: lab slot is {}, prod slot is {}",
                lab.environment(),
                prod.environment()
            );
        }
        Self {
            store,
            repository,
            lab,
            prod,
            settings,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Read access to the record store, for resolving names at the boundary.
    pub fn records(&self) -> &dyn RecordStore {
        &*self.store
    }

    pub(crate) fn controller(&mut self, env: Environment) -> &mut dyn Controller {
        match env {
            Environment::Lab => &mut *self.lab,
            Environment::Prod => &mut *self.prod,
        }
    }

    /// Apply one field update. A missing record is a logged no-op.
    pub(crate) fn persist(
        &mut self,
        name: &TemplateName,
        update: StatusUpdate,
    ) -> Result<(), TemplateFailure> {
        if !self.store.update_status(name, &update)? {
            tracing::debug!("no record for {name}; status update skipped");
        }
        Ok(())
    }
}
