//! Domain types for Templar.
//!
//! Record fields serialize in camelCase so the YAML store keeps the same
//! schema as the document collection it mirrors (`projectName`, `inLab`, …).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed template name. Unique across the record store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateName(pub String);

impl fmt::Display for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TemplateName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TemplateName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed controller project name. Also the repository directory
/// holding the project's template files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectName(pub String);

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// The (project, template) pair addressing one template in the repository
/// and on each controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateIdentity {
    pub project: ProjectName,
    pub name: TemplateName,
}

impl TemplateIdentity {
    pub fn new(project: impl Into<ProjectName>, name: impl Into<TemplateName>) -> Self {
        Self {
            project: project.into(),
            name: name.into(),
        }
    }

    /// Repository path of the template file: `<project>/<template>`.
    pub fn repo_path(&self) -> String {
        format!("{}/{}", self.project, self.name)
    }
}

impl fmt::Display for TemplateIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project, self.name)
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// One of the two controller instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Lab,
    Prod,
}

impl Environment {
    pub fn all() -> &'static [Environment] {
        &[Environment::Lab, Environment::Prod]
    }

    /// Status written after content was pushed to this controller.
    pub fn marker(self) -> SyncStatus {
        match self {
            Environment::Lab => SyncStatus::ViewOnLab,
            Environment::Prod => SyncStatus::ViewOnProd,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Lab => write!(f, "lab"),
            Environment::Prod => write!(f, "prod"),
        }
    }
}

/// Per-controller sync state stored in `inLab` / `inProd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SyncStatus {
    #[default]
    #[serde(rename = "NOT in Github")]
    NotInRepository,
    #[serde(rename = "Not Found")]
    NotFound,
    #[serde(rename = "In Sync")]
    InSync,
    #[serde(rename = "NOT In Sync")]
    OutOfSync,
    #[serde(rename = "*View on DNAC Lab*")]
    ViewOnLab,
    #[serde(rename = "*View on DNAC Prod*")]
    ViewOnProd,
}

impl SyncStatus {
    /// Compare controller content against the repository copy.
    ///
    /// `None` means the controller has no template with that identity.
    pub fn compare(repository: &str, controller: Option<&str>) -> Self {
        match controller {
            None => SyncStatus::NotFound,
            Some(content) if content == repository => SyncStatus::InSync,
            Some(_) => SyncStatus::OutOfSync,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SyncStatus::NotInRepository => "NOT in Github",
            SyncStatus::NotFound => "Not Found",
            SyncStatus::InSync => "In Sync",
            SyncStatus::OutOfSync => "NOT In Sync",
            SyncStatus::ViewOnLab => "*View on DNAC Lab*",
            SyncStatus::ViewOnProd => "*View on DNAC Prod*",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Controller data
// ---------------------------------------------------------------------------

/// A device product family a template applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceType {
    pub product_family: String,
}

impl DeviceType {
    pub fn new(product_family: impl Into<String>) -> Self {
        Self {
            product_family: product_family.into(),
        }
    }
}

/// Entry of a controller's template listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSummary {
    pub id: String,
    pub name: TemplateName,
    pub project: ProjectName,
}

/// Full template detail as returned by a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDetail {
    pub id: String,
    pub name: TemplateName,
    pub project: ProjectName,
    pub device_types: Vec<DeviceType>,
    pub software_type: String,
    pub content: String,
}

/// Body and classification sent when creating or updating a controller template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateUpload<'a> {
    pub identity: &'a TemplateIdentity,
    pub content: &'a str,
    pub device_types: &'a [DeviceType],
    pub software_type: &'a str,
}

// ---------------------------------------------------------------------------
// Repository data
// ---------------------------------------------------------------------------

/// A template file read from the repository along with its content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFile {
    pub content: String,
    /// Content hash required by optimistic-concurrency updates.
    pub sha: String,
}

/// Result of a branch creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchOutcome {
    Created,
    AlreadyExists,
}

/// A pull request opened on the repository host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One record per known template; the only durable link between a
/// repository file, a Lab template and a Prod template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    pub name: TemplateName,
    pub project_name: ProjectName,
    #[serde(default)]
    pub device_family: Vec<DeviceType>,
    #[serde(default)]
    pub software_type: String,
    #[serde(default)]
    pub in_lab: SyncStatus,
    #[serde(default)]
    pub in_prod: SyncStatus,
    #[serde(rename = "inGitHub", default)]
    pub in_github: bool,
    pub create_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_date: Option<DateTime<Utc>>,
}

impl TemplateRecord {
    /// Fresh record for a template discovered on a controller.
    pub fn discovered(detail: &TemplateDetail, now: DateTime<Utc>) -> Self {
        Self {
            name: detail.name.clone(),
            project_name: detail.project.clone(),
            device_family: detail.device_types.clone(),
            software_type: detail.software_type.clone(),
            in_lab: SyncStatus::NotInRepository,
            in_prod: SyncStatus::NotInRepository,
            in_github: false,
            create_date: now,
            update_date: None,
        }
    }

    pub fn identity(&self) -> TemplateIdentity {
        TemplateIdentity {
            project: self.project_name.clone(),
            name: self.name.clone(),
        }
    }

    pub fn status(&self, env: Environment) -> SyncStatus {
        match env {
            Environment::Lab => self.in_lab,
            Environment::Prod => self.in_prod,
        }
    }
}

/// Field-level update applied to one record. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusUpdate {
    pub in_lab: Option<SyncStatus>,
    pub in_prod: Option<SyncStatus>,
    pub in_github: Option<bool>,
    pub update_date: Option<DateTime<Utc>>,
}

impl StatusUpdate {
    pub fn status(env: Environment, status: SyncStatus) -> Self {
        match env {
            Environment::Lab => Self {
                in_lab: Some(status),
                ..Self::default()
            },
            Environment::Prod => Self {
                in_prod: Some(status),
                ..Self::default()
            },
        }
    }

    pub fn in_github(present: bool) -> Self {
        Self {
            in_github: Some(present),
            ..Self::default()
        }
    }

    pub fn touched(at: DateTime<Utc>) -> Self {
        Self {
            update_date: Some(at),
            ..Self::default()
        }
    }

    /// Apply the set fields to `record`.
    pub fn apply_to(&self, record: &mut TemplateRecord) {
        if let Some(s) = self.in_lab {
            record.in_lab = s;
        }
        if let Some(s) = self.in_prod {
            record.in_prod = s;
        }
        if let Some(g) = self.in_github {
            record.in_github = g;
        }
        if let Some(at) = self.update_date {
            record.update_date = Some(at);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
