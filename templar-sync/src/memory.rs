//! In-memory [`Repository`] and [`Controller`] implementations.
//!
//! Both record every call they receive so tests can assert on exactly which
//! remote operations a procedure issued.

use std::collections::{BTreeMap, BTreeSet};

use sha2::{Digest, Sha256};

use templar_core::{
    BranchOutcome, Controller, DeviceType, Environment, PullRequest, RemoteError, RepoFile,
    Repository, TemplateDetail, TemplateIdentity, TemplateSummary, TemplateUpload,
};

/// Git-style blob hash of `content`.
pub fn blob_sha(content: &str) -> String {
    let mut h = Sha256::new();
    h.update(format!("blob {}\0", content.len()).as_bytes());
    h.update(content.as_bytes());
    hex::encode(h.finalize())
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoCall {
    Read { path: String, git_ref: String },
    Create { path: String, branch: String },
    Update { path: String, branch: String },
    CreateBranch { from: String, new: String },
    PullRequest { base: String, head: String },
}

impl RepoCall {
    pub fn is_write(&self) -> bool {
        matches!(self, RepoCall::Create { .. } | RepoCall::Update { .. })
    }
}

#[derive(Debug, Clone)]
pub struct MemoryRepository {
    branches: BTreeMap<String, BTreeMap<String, String>>,
    base_branch: String,
    calls: Vec<RepoCall>,
    pull_requests: Vec<PullRequest>,
    /// Paths whose reads fail with a transport error.
    pub unavailable: BTreeSet<String>,
    /// Paths whose reads report an outdated sha, so the next update conflicts.
    pub stale_sha: BTreeSet<String>,
    /// Make `open_pull_request` fail.
    pub reject_pull_requests: bool,
}

impl MemoryRepository {
    /// A repository holding only `base_branch`, empty.
    pub fn new(base_branch: impl Into<String>) -> Self {
        let base_branch = base_branch.into();
        let mut branches = BTreeMap::new();
        branches.insert(base_branch.clone(), BTreeMap::new());
        Self {
            branches,
            base_branch,
            calls: Vec::new(),
            pull_requests: Vec::new(),
            unavailable: BTreeSet::new(),
            stale_sha: BTreeSet::new(),
            reject_pull_requests: false,
        }
    }

    /// Seed a file on the base branch.
    pub fn with_file(mut self, identity: &TemplateIdentity, content: &str) -> Self {
        let base = self.base_branch.clone();
        self.put(&base, identity, content);
        self
    }

    /// Seed a file on any branch, creating the branch when needed.
    pub fn put(&mut self, branch: &str, identity: &TemplateIdentity, content: &str) {
        self.branches
            .entry(branch.to_string())
            .or_default()
            .insert(identity.repo_path(), content.to_string());
    }

    pub fn file(&self, branch: &str, identity: &TemplateIdentity) -> Option<&str> {
        self.branches
            .get(branch)?
            .get(&identity.repo_path())
            .map(String::as_str)
    }

    pub fn has_branch(&self, branch: &str) -> bool {
        self.branches.contains_key(branch)
    }

    pub fn calls(&self) -> &[RepoCall] {
        &self.calls
    }

    /// Number of file writes (creates plus updates).
    pub fn writes(&self) -> usize {
        self.calls.iter().filter(|c| c.is_write()).count()
    }

    pub fn pull_requests(&self) -> &[PullRequest] {
        &self.pull_requests
    }

    fn branch_mut(&mut self, branch: &str) -> Result<&mut BTreeMap<String, String>, RemoteError> {
        self.branches
            .get_mut(branch)
            .ok_or_else(|| RemoteError::Missing {
                what: format!("branch {branch}"),
            })
    }
}

impl Repository for MemoryRepository {
    fn read_file(
        &mut self,
        identity: &TemplateIdentity,
        git_ref: &str,
    ) -> Result<Option<RepoFile>, RemoteError> {
        let path = identity.repo_path();
        self.calls.push(RepoCall::Read {
            path: path.clone(),
            git_ref: git_ref.to_string(),
        });
        if self.unavailable.contains(&path) {
            return Err(RemoteError::Transport {
                url: format!("memory://contents/{path}"),
                message: "connection refused".to_string(),
            });
        }
        let stale = self.stale_sha.contains(&path);
        Ok(self.file(git_ref, identity).map(|content| RepoFile {
            content: content.to_string(),
            sha: if stale {
                blob_sha(&format!("{content}\n! superseded"))
            } else {
                blob_sha(content)
            },
        }))
    }

    fn create_file(
        &mut self,
        identity: &TemplateIdentity,
        content: &str,
        branch: &str,
    ) -> Result<(), RemoteError> {
        let path = identity.repo_path();
        self.calls.push(RepoCall::Create {
            path: path.clone(),
            branch: branch.to_string(),
        });
        let files = self.branch_mut(branch)?;
        if files.contains_key(&path) {
            return Err(RemoteError::AlreadyExists { path });
        }
        files.insert(path, content.to_string());
        Ok(())
    }

    fn update_file(
        &mut self,
        identity: &TemplateIdentity,
        content: &str,
        sha: &str,
        branch: &str,
    ) -> Result<(), RemoteError> {
        let path = identity.repo_path();
        self.calls.push(RepoCall::Update {
            path: path.clone(),
            branch: branch.to_string(),
        });
        let files = self.branch_mut(branch)?;
        let current = files.get_mut(&path).ok_or_else(|| RemoteError::Missing {
            what: format!("{path} on {branch}"),
        })?;
        if blob_sha(current) != sha {
            return Err(RemoteError::Conflict { path });
        }
        *current = content.to_string();
        Ok(())
    }

    fn create_branch(
        &mut self,
        from_branch: &str,
        new_branch: &str,
    ) -> Result<BranchOutcome, RemoteError> {
        self.calls.push(RepoCall::CreateBranch {
            from: from_branch.to_string(),
            new: new_branch.to_string(),
        });
        if self.branches.contains_key(new_branch) {
            return Ok(BranchOutcome::AlreadyExists);
        }
        let files = self
            .branches
            .get(from_branch)
            .cloned()
            .ok_or_else(|| RemoteError::Missing {
                what: format!("branch {from_branch}"),
            })?;
        self.branches.insert(new_branch.to_string(), files);
        Ok(BranchOutcome::Created)
    }

    fn open_pull_request(&mut self, base: &str, head: &str) -> Result<PullRequest, RemoteError> {
        self.calls.push(RepoCall::PullRequest {
            base: base.to_string(),
            head: head.to_string(),
        });
        if self.reject_pull_requests {
            return Err(RemoteError::Status {
                url: "memory://pulls".to_string(),
                status: 422,
            });
        }
        let number = self.pull_requests.len() as u64 + 1;
        let pr = PullRequest {
            number,
            url: format!("memory://pulls/{number}"),
        };
        self.pull_requests.push(pr.clone());
        Ok(pr)
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerCall {
    List,
    Detail(String),
    Content(TemplateIdentity),
    Create(TemplateIdentity),
    Update(TemplateIdentity),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTemplate {
    pub id: String,
    pub content: String,
    pub device_types: Vec<DeviceType>,
    pub software_type: String,
}

#[derive(Debug, Clone)]
pub struct MemoryController {
    environment: Environment,
    templates: BTreeMap<TemplateIdentity, StoredTemplate>,
    calls: Vec<ControllerCall>,
    next_id: usize,
    /// Make every call fail with a 503.
    pub unavailable: bool,
}

impl MemoryController {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            templates: BTreeMap::new(),
            calls: Vec::new(),
            next_id: 1,
            unavailable: false,
        }
    }

    /// Seed a template classified as an IOS-XE switch template.
    pub fn with_template(mut self, identity: &TemplateIdentity, content: &str) -> Self {
        self.insert(
            identity,
            content,
            vec![DeviceType::new("Switches and Hubs")],
            "IOS-XE",
        );
        self
    }

    pub fn content(&self, identity: &TemplateIdentity) -> Option<&str> {
        self.templates.get(identity).map(|t| t.content.as_str())
    }

    pub fn template(&self, identity: &TemplateIdentity) -> Option<&StoredTemplate> {
        self.templates.get(identity)
    }

    pub fn calls(&self) -> &[ControllerCall] {
        &self.calls
    }

    fn insert(
        &mut self,
        identity: &TemplateIdentity,
        content: &str,
        device_types: Vec<DeviceType>,
        software_type: &str,
    ) {
        let id = format!("{}-{}", self.environment, self.next_id);
        self.next_id += 1;
        self.templates.insert(
            identity.clone(),
            StoredTemplate {
                id,
                content: content.to_string(),
                device_types,
                software_type: software_type.to_string(),
            },
        );
    }

    fn check_available(&self) -> Result<(), RemoteError> {
        if self.unavailable {
            return Err(RemoteError::Status {
                url: format!("memory://{}", self.environment),
                status: 503,
            });
        }
        Ok(())
    }
}

impl Controller for MemoryController {
    fn environment(&self) -> Environment {
        self.environment
    }

    fn list_templates(&mut self) -> Result<Vec<TemplateSummary>, RemoteError> {
        self.calls.push(ControllerCall::List);
        self.check_available()?;
        Ok(self
            .templates
            .iter()
            .map(|(identity, t)| TemplateSummary {
                id: t.id.clone(),
                name: identity.name.clone(),
                project: identity.project.clone(),
            })
            .collect())
    }

    fn template_detail(&mut self, template_id: &str) -> Result<TemplateDetail, RemoteError> {
        self.calls.push(ControllerCall::Detail(template_id.to_string()));
        self.check_available()?;
        self.templates
            .iter()
            .find(|(_, t)| t.id == template_id)
            .map(|(identity, t)| TemplateDetail {
                id: t.id.clone(),
                name: identity.name.clone(),
                project: identity.project.clone(),
                device_types: t.device_types.clone(),
                software_type: t.software_type.clone(),
                content: t.content.clone(),
            })
            .ok_or_else(|| RemoteError::Missing {
                what: format!("template {template_id}"),
            })
    }

    fn template_content(
        &mut self,
        identity: &TemplateIdentity,
    ) -> Result<Option<String>, RemoteError> {
        self.calls.push(ControllerCall::Content(identity.clone()));
        self.check_available()?;
        Ok(self.content(identity).map(str::to_string))
    }

    fn create_template(&mut self, upload: TemplateUpload<'_>) -> Result<(), RemoteError> {
        self.calls.push(ControllerCall::Create(upload.identity.clone()));
        self.check_available()?;
        if self.templates.contains_key(upload.identity) {
            return Err(RemoteError::AlreadyExists {
                path: upload.identity.repo_path(),
            });
        }
        self.insert(
            upload.identity,
            upload.content,
            upload.device_types.to_vec(),
            upload.software_type,
        );
        Ok(())
    }

    fn update_template(&mut self, upload: TemplateUpload<'_>) -> Result<(), RemoteError> {
        self.calls.push(ControllerCall::Update(upload.identity.clone()));
        self.check_available()?;
        let stored = self
            .templates
            .get_mut(upload.identity)
            .ok_or_else(|| RemoteError::Missing {
                what: format!("template {}", upload.identity),
            })?;
        stored.content = upload.content.to_string();
        stored.device_types = upload.device_types.to_vec();
        stored.software_type = upload.software_type.to_string();
        Ok(())
    }
}
