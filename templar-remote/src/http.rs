//! Shared ureq plumbing.

use std::time::Duration;

use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde_json::Value;

use templar_core::RemoteError;

/// Agent with an explicit per-request deadline.
pub(crate) fn agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

/// Send `request`, returning non-2xx responses as `Ok` so callers can branch
/// on the status. Only transport failures become errors here.
pub(crate) fn send(request: ureq::Request, body: Option<&Value>) -> Result<ureq::Response, RemoteError> {
    let url = request.url().to_string();
    let result = match body {
        Some(body) => request.send_json(body),
        None => request.call(),
    };
    match result {
        Ok(response) => Ok(response),
        Err(ureq::Error::Status(_, response)) => Ok(response),
        Err(ureq::Error::Transport(t)) => Err(RemoteError::Transport {
            url,
            message: t.to_string(),
        }),
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(response: ureq::Response) -> Result<T, RemoteError> {
    let url = response.get_url().to_string();
    response
        .into_json::<T>()
        .map_err(|e| RemoteError::Decode {
            url,
            message: e.to_string(),
        })
}

pub(crate) fn unexpected(response: &ureq::Response) -> RemoteError {
    RemoteError::Status {
        url: response.get_url().to_string(),
        status: response.status(),
    }
}

pub(crate) fn basic_auth(username: &str, password: &str) -> String {
    let raw = format!("{username}:{password}");
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(raw)
    )
}

pub(crate) fn trim_base(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}
