// OpenAI-compatible HTTP plumbing shared by the embedding and chat clients.
// Calls are blocking; async callers go through `spawn_blocking`.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::{ConfigError, OpenAiConfig};

#[derive(Debug, Clone)]
pub(crate) struct OpenAiHttp {
    agent: ureq::Agent,
    base_url: Url,
    authorization: String,
    timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RequestFailure {
    Timeout(Duration),
    Status { status: u16, body: String },
    Transport(String),
}

impl OpenAiHttp {
    pub(crate) fn new(config: &OpenAiConfig, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = config.endpoint_url()?;
        let api_key = config.require_api_key()?;

        Ok(Self {
            agent: build_agent(timeout),
            base_url,
            authorization: format!("Bearer {api_key}"),
            timeout,
        })
    }

    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self.timeout = timeout;
        self
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST `payload` as JSON to `path` under the base URL and return the body
    /// of a 2xx response.
    pub(crate) fn post_json<T: Serialize>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<String, RequestFailure> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| RequestFailure::Transport(format!("invalid endpoint {path}: {e}")))?;

        let request_json = serde_json::to_string(payload)
            .map_err(|e| RequestFailure::Transport(format!("failed to serialize request: {e}")))?;

        debug!("POST {} ({} bytes)", url, request_json.len());

        let mut response = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .header("Authorization", &self.authorization)
            .send(&request_json)
            .map_err(|e| self.classify(&e))?;

        let status = response.status();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| self.classify(&e))?;

        if !status.is_success() {
            warn!("{} returned HTTP {}", url, status.as_u16());
            return Err(RequestFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    fn classify(&self, error: &ureq::Error) -> RequestFailure {
        match error {
            ureq::Error::Timeout(_) => RequestFailure::Timeout(self.timeout),
            ureq::Error::StatusCode(status) => RequestFailure::Status {
                status: *status,
                body: String::new(),
            },
            other => RequestFailure::Transport(other.to_string()),
        }
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}
