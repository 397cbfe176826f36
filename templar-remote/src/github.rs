//! Repository client for the GitHub REST contents / refs / pulls API.
//!
//! `base_url` is the repository API root, e.g.
//! `https://api.github.com/repos/<owner>/<repo>`. Template files live at
//! `<project>/<template>` and are transferred base64-encoded.

use std::time::Duration;

use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;

use templar_core::{
    BranchOutcome, PullRequest, RemoteError, RepoFile, Repository, TemplateIdentity,
};

use crate::http::{self, read_json, send, unexpected};

const CREATE_MESSAGE: &str = "Add template from templar";
const UPDATE_MESSAGE: &str = "Update template from templar";
const PULL_REQUEST_TITLE: &str = "Template changes from templar";

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
    html_url: String,
}

/// Blocking GitHub client authenticated with a bearer token.
pub struct GithubClient {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

impl GithubClient {
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent: http::agent(timeout),
            base_url: http::trim_base(base_url),
            token: token.into(),
        }
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
    }

    fn contents_url(&self, identity: &TemplateIdentity) -> String {
        format!(
            "{}/contents/{}/{}",
            self.base_url,
            urlencoding::encode(&identity.project.0),
            urlencoding::encode(&identity.name.0)
        )
    }
}

/// Decode the contents API payload; GitHub wraps base64 at 60 columns.
pub(crate) fn decode_content(url: &str, encoded: &str) -> Result<String, RemoteError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| RemoteError::Decode {
            url: url.to_string(),
            message: format!("base64 decode failed: {e}"),
        })?;
    String::from_utf8(bytes).map_err(|e| RemoteError::Decode {
        url: url.to_string(),
        message: format!("content is not UTF-8: {e}"),
    })
}

fn encode_content(content: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(content.as_bytes())
}

impl Repository for GithubClient {
    fn read_file(
        &mut self,
        identity: &TemplateIdentity,
        git_ref: &str,
    ) -> Result<Option<RepoFile>, RemoteError> {
        let url = self.contents_url(identity);
        let response = send(self.request("GET", &url).query("ref", git_ref), None)?;
        match response.status() {
            200 => {
                let body: ContentsResponse = read_json(response)?;
                let content = decode_content(&url, &body.content)?;
                Ok(Some(RepoFile {
                    content,
                    sha: body.sha,
                }))
            }
            404 => Ok(None),
            _ => Err(unexpected(&response)),
        }
    }

    fn create_file(
        &mut self,
        identity: &TemplateIdentity,
        content: &str,
        branch: &str,
    ) -> Result<(), RemoteError> {
        let url = self.contents_url(identity);
        let body = json!({
            "message": CREATE_MESSAGE,
            "content": encode_content(content),
            "branch": branch,
        });
        let response = send(self.request("PUT", &url), Some(&body))?;
        match response.status() {
            200 | 201 => {
                tracing::info!("created {} on {}", identity.repo_path(), branch);
                Ok(())
            }
            // The contents API demands a sha when the path already exists.
            422 => Err(RemoteError::AlreadyExists {
                path: identity.repo_path(),
            }),
            _ => Err(unexpected(&response)),
        }
    }

    fn update_file(
        &mut self,
        identity: &TemplateIdentity,
        content: &str,
        sha: &str,
        branch: &str,
    ) -> Result<(), RemoteError> {
        let url = self.contents_url(identity);
        let body = json!({
            "message": UPDATE_MESSAGE,
            "content": encode_content(content),
            "sha": sha,
            "branch": branch,
        });
        let response = send(self.request("PUT", &url), Some(&body))?;
        match response.status() {
            200 | 201 => {
                tracing::info!("updated {} on {}", identity.repo_path(), branch);
                Ok(())
            }
            409 | 422 => Err(RemoteError::Conflict {
                path: identity.repo_path(),
            }),
            404 => Err(RemoteError::Missing {
                what: format!("{} on branch '{branch}'", identity.repo_path()),
            }),
            _ => Err(unexpected(&response)),
        }
    }

    fn create_branch(
        &mut self,
        from_branch: &str,
        new_branch: &str,
    ) -> Result<BranchOutcome, RemoteError> {
        let head_url = format!(
            "{}/git/refs/heads/{}",
            self.base_url,
            urlencoding::encode(from_branch)
        );
        let response = send(self.request("GET", &head_url), None)?;
        let head: RefResponse = match response.status() {
            200 => read_json(response)?,
            404 => {
                return Err(RemoteError::Missing {
                    what: format!("branch '{from_branch}'"),
                })
            }
            _ => return Err(unexpected(&response)),
        };

        let refs_url = format!("{}/git/refs", self.base_url);
        let body = json!({
            "ref": format!("refs/heads/{new_branch}"),
            "sha": head.object.sha,
        });
        let response = send(self.request("POST", &refs_url), Some(&body))?;
        match response.status() {
            201 => {
                tracing::info!("created branch {new_branch} from {from_branch}");
                Ok(BranchOutcome::Created)
            }
            422 => Ok(BranchOutcome::AlreadyExists),
            _ => Err(unexpected(&response)),
        }
    }

    fn open_pull_request(&mut self, base: &str, head: &str) -> Result<PullRequest, RemoteError> {
        let url = format!("{}/pulls", self.base_url);
        let body = json!({
            "head": head,
            "base": base,
            "title": PULL_REQUEST_TITLE,
        });
        let response = send(self.request("POST", &url), Some(&body))?;
        match response.status() {
            201 => {
                let pr: PullResponse = read_json(response)?;
                tracing::info!("opened pull request #{} ({head} -> {base})", pr.number);
                Ok(PullRequest {
                    number: pr.number,
                    url: pr.html_url,
                })
            }
            _ => Err(unexpected(&response)),
        }
    }
}
