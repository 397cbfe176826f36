//! Capability interfaces consumed by the reconciler.
//!
//! HTTP implementations live in `templar-remote`; in-memory doubles live in
//! `templar-sync::memory`. Methods take `&mut self` because controller
//! clients may refresh their token mid-call.

use crate::error::RemoteError;
use crate::types::{
    BranchOutcome, Environment, PullRequest, RepoFile, TemplateDetail, TemplateIdentity,
    TemplateSummary, TemplateUpload,
};

/// Source-controlled template repository.
pub trait Repository {
    /// Read `<project>/<template>` at `git_ref`. `Ok(None)` when absent.
    fn read_file(
        &mut self,
        identity: &TemplateIdentity,
        git_ref: &str,
    ) -> Result<Option<RepoFile>, RemoteError>;

    /// Create a new file on `branch`. Fails with `AlreadyExists` if present.
    fn create_file(
        &mut self,
        identity: &TemplateIdentity,
        content: &str,
        branch: &str,
    ) -> Result<(), RemoteError>;

    /// Replace the file on `branch`. `sha` must be the hash of the version
    /// being replaced; a stale hash fails with `Conflict`.
    fn update_file(
        &mut self,
        identity: &TemplateIdentity,
        content: &str,
        sha: &str,
        branch: &str,
    ) -> Result<(), RemoteError>;

    /// Create `new_branch` pointing at the head of `from_branch`.
    fn create_branch(
        &mut self,
        from_branch: &str,
        new_branch: &str,
    ) -> Result<BranchOutcome, RemoteError>;

    fn open_pull_request(&mut self, base: &str, head: &str) -> Result<PullRequest, RemoteError>;
}

/// A template-programmer controller (Lab or Prod).
pub trait Controller {
    fn environment(&self) -> Environment;

    fn list_templates(&mut self) -> Result<Vec<TemplateSummary>, RemoteError>;

    fn template_detail(&mut self, template_id: &str) -> Result<TemplateDetail, RemoteError>;

    /// Content of the template at `identity`. `Ok(None)` when absent.
    fn template_content(
        &mut self,
        identity: &TemplateIdentity,
    ) -> Result<Option<String>, RemoteError>;

    /// Create the template, creating its project first when missing.
    fn create_template(&mut self, upload: TemplateUpload<'_>) -> Result<(), RemoteError>;

    /// Replace the content of an existing template.
    fn update_template(&mut self, upload: TemplateUpload<'_>) -> Result<(), RemoteError>;
}

/// One-way message sink.
pub trait Notifier {
    fn send(&mut self, message: &str) -> Result<(), RemoteError>;
}
