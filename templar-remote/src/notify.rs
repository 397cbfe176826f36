//! Webhook notification sink (Webex-style incoming webhook: `{"markdown": …}`).

use std::time::Duration;

use serde_json::json;

use templar_core::{Notifier, RemoteError};

use crate::http::{self, send, unexpected};

pub struct WebhookNotifier {
    agent: ureq::Agent,
    url: String,
    token: Option<String>,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        Self {
            agent: http::agent(timeout),
            url: url.into(),
            token,
        }
    }
}

impl Notifier for WebhookNotifier {
    fn send(&mut self, message: &str) -> Result<(), RemoteError> {
        let mut request = self.agent.post(&self.url);
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        let response = send(request, Some(&json!({ "markdown": message })))?;
        if (200..300).contains(&response.status()) {
            tracing::debug!("notification delivered");
            Ok(())
        } else {
            Err(unexpected(&response))
        }
    }
}
