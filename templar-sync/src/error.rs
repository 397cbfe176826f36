//! Error types for templar-sync.

use thiserror::Error;

use templar_core::{RemoteError, StoreError};

/// Errors that abort a whole reconciliation request.
///
/// Failures scoped to one template never surface here; they are recorded as
/// a [`TemplateFailure`](crate::report::TemplateFailure) in the batch report.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the record store while resolving the request.
    #[error("record store error: {0}")]
    Store(#[from] StoreError),

    /// A remote call every template depends on (e.g. the Lab listing) failed.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// A requested name has no record to recover its project from.
    #[error("template '{name}' is not in the record store; run inventory first")]
    UnknownTemplate { name: String },
}
