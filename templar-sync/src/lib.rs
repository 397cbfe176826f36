//! # templar-sync
//!
//! Template reconciliation across the repository and the Lab and Prod
//! controllers.
//!
//! Build a [`Reconciler`] over explicit capability instances, then call
//! [`pipeline::run`] with an [`Action`] and a [`Selection`]. Every procedure
//! returns a [`BatchReport`] with one outcome per template.

pub mod error;
mod inventory;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod pipeline;
mod publish;
mod push;
pub mod reconciler;
pub mod report;
mod status;

pub use error::SyncError;
pub use pipeline::{resolve_identities, run, Selection};
pub use publish::{PULL_REQUEST_OPENED, UP_TO_DATE};
pub use push::NOTHING_SELECTED;
pub use reconciler::{Reconciler, SyncSettings};
pub use report::{Action, BatchReport, Change, TemplateFailure, TemplateOutcome};
pub use status::STATUS_COMPLETE;
