//! Controller client for the template-programmer REST API.
//!
//! Authentication happens once in [`ControllerClient::connect`]. A `401` on
//! any later call triggers one re-authentication and a single retry of that
//! call. Both `200` and `202` count as success: the controller answers
//! asynchronous task submissions with `202 Accepted`.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use templar_core::{
    Controller, DeviceType, Environment, ProjectName, RemoteError, TemplateDetail,
    TemplateIdentity, TemplateName, TemplateSummary, TemplateUpload,
};

use crate::http::{self, read_json, send, unexpected};

const AUTH_PATH: &str = "/dna/system/api/v1/auth/token";
const PROGRAMMER_PATH: &str = "/dna/intent/api/v1/template-programmer";
const AUTHOR: &str = "Templar";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "Token")]
    token: String,
}

#[derive(Debug, Deserialize)]
struct ProjectEntry {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateEntry {
    name: String,
    template_id: String,
    #[serde(default)]
    project_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateDetailWire {
    name: String,
    #[serde(default)]
    project_name: String,
    #[serde(default)]
    device_types: Vec<DeviceType>,
    #[serde(default)]
    software_type: String,
    #[serde(default)]
    template_content: Option<String>,
}

pub(crate) fn is_accepted(status: u16) -> bool {
    status == 200 || status == 202
}

/// Blocking controller client bound to one environment.
pub struct ControllerClient {
    environment: Environment,
    agent: ureq::Agent,
    base_url: String,
    username: String,
    password: String,
    token: String,
}

impl std::fmt::Debug for ControllerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerClient")
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl ControllerClient {
    /// Authenticate and return a ready client. Failure is fatal for this instance.
    pub fn connect(
        environment: Environment,
        base_url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let mut client = Self {
            environment,
            agent: http::agent(timeout),
            base_url: http::trim_base(base_url),
            username: username.to_string(),
            password: password.to_string(),
            token: String::new(),
        };
        client.authenticate()?;
        tracing::debug!("authenticated against {environment} controller");
        Ok(client)
    }

    fn authenticate(&mut self) -> Result<(), RemoteError> {
        let url = format!("{}{AUTH_PATH}", self.base_url);
        let request = self
            .agent
            .post(&url)
            .set("Authorization", &http::basic_auth(&self.username, &self.password))
            .set("Content-Type", "application/json");
        let response = send(request, None)?;
        if response.status() != 200 {
            return Err(RemoteError::Auth {
                url,
                status: response.status(),
            });
        }
        let body: TokenResponse = read_json(response)?;
        self.token = body.token;
        Ok(())
    }

    fn send_once(
        &self,
        method: &str,
        url: &str,
        body: Option<&Value>,
    ) -> Result<ureq::Response, RemoteError> {
        let request = self
            .agent
            .request(method, url)
            .set("x-auth-token", &self.token)
            .set("Content-Type", "application/json");
        send(request, body)
    }

    /// Send with one transparent re-authentication on `401`.
    fn execute(
        &mut self,
        method: &str,
        url: &str,
        body: Option<&Value>,
    ) -> Result<ureq::Response, RemoteError> {
        let response = self.send_once(method, url, body)?;
        if response.status() != 401 {
            return Ok(response);
        }
        tracing::info!(
            "{} controller rejected token, re-authenticating",
            self.environment
        );
        self.authenticate()?;
        self.send_once(method, url, body)
    }

    fn execute_accepted(
        &mut self,
        method: &str,
        url: &str,
        body: Option<&Value>,
    ) -> Result<ureq::Response, RemoteError> {
        let response = self.execute(method, url, body)?;
        if is_accepted(response.status()) {
            Ok(response)
        } else {
            Err(unexpected(&response))
        }
    }

    fn programmer_url(&self, tail: &str) -> String {
        format!("{}{PROGRAMMER_PATH}{tail}", self.base_url)
    }

    fn project_id(&mut self, project: &ProjectName) -> Result<Option<String>, RemoteError> {
        let url = self.programmer_url("/project");
        let response = self.execute_accepted("GET", &url, None)?;
        let projects: Vec<ProjectEntry> = read_json(response)?;
        Ok(projects
            .into_iter()
            .find(|p| p.name == project.0)
            .map(|p| p.id))
    }

    fn create_project(&mut self, project: &ProjectName) -> Result<(), RemoteError> {
        let url = self.programmer_url("/project");
        let body = json!({
            "name": project.0,
            "description": "Project created by templar",
            "tags": [],
        });
        self.execute_accepted("POST", &url, Some(&body))?;
        tracing::info!("created project {} on {} controller", project, self.environment);
        Ok(())
    }

    fn project_templates(&mut self, project_id: &str) -> Result<Vec<TemplateEntry>, RemoteError> {
        let url = format!(
            "{}?projectId={}",
            self.programmer_url("/template"),
            urlencoding::encode(project_id)
        );
        let response = self.execute_accepted("GET", &url, None)?;
        read_json(response)
    }

    /// `(project_id, template_id)` of the template at `identity`, if present.
    fn locate(
        &mut self,
        identity: &TemplateIdentity,
    ) -> Result<Option<(String, String)>, RemoteError> {
        let Some(project_id) = self.project_id(&identity.project)? else {
            return Ok(None);
        };
        let template_id = self
            .project_templates(&project_id)?
            .into_iter()
            .find(|t| t.name == identity.name.0)
            .map(|t| t.template_id);
        Ok(template_id.map(|t| (project_id, t)))
    }

    fn fetch_detail(&mut self, template_id: &str) -> Result<TemplateDetailWire, RemoteError> {
        let url = self.programmer_url(&format!("/template/{}", urlencoding::encode(template_id)));
        let response = self.execute_accepted("GET", &url, None)?;
        read_json(response)
    }
}

fn template_body(upload: &TemplateUpload<'_>, description: &str) -> Value {
    json!({
        "author": AUTHOR,
        "description": description,
        "failurePolicy": "ABORT_ON_ERROR",
        "name": upload.identity.name.0,
        "projectName": upload.identity.project.0,
        "templateContent": upload.content,
        "softwareType": upload.software_type,
        "deviceTypes": upload.device_types,
        "templateParams": [],
        "version": "1",
    })
}

impl Controller for ControllerClient {
    fn environment(&self) -> Environment {
        self.environment
    }

    fn list_templates(&mut self) -> Result<Vec<TemplateSummary>, RemoteError> {
        let url = self.programmer_url("/template");
        let response = self.execute_accepted("GET", &url, None)?;
        let entries: Vec<TemplateEntry> = read_json(response)?;
        Ok(entries
            .into_iter()
            .map(|e| TemplateSummary {
                id: e.template_id,
                name: TemplateName::from(e.name),
                project: ProjectName::from(e.project_name),
            })
            .collect())
    }

    fn template_detail(&mut self, template_id: &str) -> Result<TemplateDetail, RemoteError> {
        let wire = self.fetch_detail(template_id)?;
        Ok(TemplateDetail {
            id: template_id.to_string(),
            name: TemplateName::from(wire.name),
            project: ProjectName::from(wire.project_name),
            device_types: wire.device_types,
            software_type: wire.software_type,
            content: wire.template_content.unwrap_or_default(),
        })
    }

    fn template_content(
        &mut self,
        identity: &TemplateIdentity,
    ) -> Result<Option<String>, RemoteError> {
        let Some((_, template_id)) = self.locate(identity)? else {
            return Ok(None);
        };
        let wire = self.fetch_detail(&template_id)?;
        Ok(Some(wire.template_content.unwrap_or_default()))
    }

    fn create_template(&mut self, upload: TemplateUpload<'_>) -> Result<(), RemoteError> {
        let project = &upload.identity.project;
        let project_id = match self.project_id(project)? {
            Some(id) => id,
            None => {
                self.create_project(project)?;
                self.project_id(project)?.ok_or_else(|| RemoteError::Missing {
                    what: format!("project '{project}' on {} controller", self.environment),
                })?
            }
        };
        let url = self.programmer_url(&format!(
            "/project/{}/template",
            urlencoding::encode(&project_id)
        ));
        let body = template_body(&upload, "Template created by templar");
        self.execute_accepted("POST", &url, Some(&body))?;
        tracing::info!(
            "created template {} on {} controller",
            upload.identity,
            self.environment
        );
        Ok(())
    }

    fn update_template(&mut self, upload: TemplateUpload<'_>) -> Result<(), RemoteError> {
        let Some((project_id, template_id)) = self.locate(upload.identity)? else {
            return Err(RemoteError::Missing {
                what: format!(
                    "template '{}' on {} controller",
                    upload.identity, self.environment
                ),
            });
        };
        let mut body = template_body(&upload, "Template updated by templar");
        body["id"] = Value::String(template_id);
        body["projectId"] = Value::String(project_id);
        let url = self.programmer_url("/template");
        self.execute_accepted("PUT", &url, Some(&body))?;
        tracing::info!(
            "updated template {} on {} controller",
            upload.identity,
            self.environment
        );
        Ok(())
    }
}
