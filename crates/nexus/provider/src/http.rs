//! HTTP decision provider.
//!
//! POSTs the request as JSON and maps the response onto a
//! [`DecisionOutcome`]. Status 429 and `{"error":"RATE_LIMITED"}` bodies
//! become rate-limit signals; everything unusable becomes a failure.

use crate::{DecisionOutcome, DecisionProvider, DecisionRequest, ProviderError};
use async_trait::async_trait;
use nexus_types::{Decision, RosterProposal};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const RATE_LIMITED_TAG: &str = "RATE_LIMITED";
const STATUS_TOO_MANY_REQUESTS: u16 = 429;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for [`HttpDecisionProvider`]
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl HttpProviderConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum WirePayload {
    Initialization(RosterProposal),
    Decision(Decision),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireResponse {
    Error {
        error: String,
        #[serde(default)]
        cooldown: Option<u64>,
    },
    Payload(WirePayload),
}

/// Provider backed by a remote reasoning endpoint
pub struct HttpDecisionProvider {
    client: Client,
    config: HttpProviderConfig,
}

impl std::fmt::Debug for HttpDecisionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDecisionProvider")
            .field("endpoint", &self.config.endpoint)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

impl HttpDecisionProvider {
    pub fn new(config: HttpProviderConfig) -> Result<Self, ProviderError> {
        if config.endpoint.trim().is_empty() {
            return Err(ProviderError::Config(
                "http provider requires an endpoint".to_string(),
            ));
        }

        let client = build_http_client(config.timeout)?;
        Ok(Self { client, config })
    }

    async fn call(&self, request: &DecisionRequest) -> DecisionOutcome {
        let mut builder = self.client.post(&self.config.endpoint).json(request);
        if let Some(key) = self.config.api_key.as_deref() {
            builder = builder.bearer_auth(key);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                return DecisionOutcome::Failure(ProviderError::Timeout(self.config.timeout))
            }
            Err(err) => {
                return DecisionOutcome::Failure(ProviderError::Transport(err.to_string()))
            }
        };

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_retry_after);

        match response.text().await {
            Ok(body) => decode_response(status, retry_after, &body),
            Err(err) => DecisionOutcome::Failure(ProviderError::Transport(err.to_string())),
        }
    }
}

#[async_trait]
impl DecisionProvider for HttpDecisionProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn request_decision(&self, request: &DecisionRequest) -> DecisionOutcome {
        let outcome = self.call(request).await;
        if let DecisionOutcome::Failure(err) = &outcome {
            tracing::debug!(endpoint = %self.config.endpoint, error = %err, "Decision request failed");
        }
        outcome
    }
}

fn build_http_client(timeout: Duration) -> Result<Client, ProviderError> {
    let mut builder = Client::builder().timeout(timeout);
    let allow_system_proxy = std::env::var("NEXUS_USE_SYSTEM_PROXY")
        .map(|value| matches!(value.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);

    if !allow_system_proxy {
        builder = builder.no_proxy();
    }

    builder
        .build()
        .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {}", e)))
}

/// `Retry-After` in delta-seconds form; HTTP dates are not supported.
fn parse_retry_after(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Map a raw HTTP answer onto an outcome.
pub(crate) fn decode_response(
    status: u16,
    retry_after: Option<Duration>,
    body: &str,
) -> DecisionOutcome {
    if status == STATUS_TOO_MANY_REQUESTS {
        let hinted = serde_json::from_str::<WireResponse>(body)
            .ok()
            .and_then(|wire| match wire {
                WireResponse::Error { cooldown, .. } => cooldown.map(Duration::from_millis),
                WireResponse::Payload(_) => None,
            });
        return DecisionOutcome::rate_limited(hinted.or(retry_after));
    }

    if !(200..300).contains(&status) {
        return DecisionOutcome::Failure(ProviderError::Status {
            status,
            body: truncate(body, 320),
        });
    }

    if body.trim().is_empty() {
        return DecisionOutcome::Failure(ProviderError::Empty);
    }

    match serde_json::from_str::<WireResponse>(body) {
        Ok(WireResponse::Error { error, cooldown }) if error == RATE_LIMITED_TAG => {
            DecisionOutcome::rate_limited(cooldown.map(Duration::from_millis).or(retry_after))
        }
        Ok(WireResponse::Error { error, .. }) => {
            DecisionOutcome::Failure(ProviderError::Decode(format!("provider error: {}", error)))
        }
        Ok(WireResponse::Payload(WirePayload::Initialization(proposal))) => {
            if proposal.workers.is_empty() {
                DecisionOutcome::Failure(ProviderError::Empty)
            } else {
                DecisionOutcome::Initialization(proposal)
            }
        }
        Ok(WireResponse::Payload(WirePayload::Decision(decision))) => {
            DecisionOutcome::Decision(decision)
        }
        Err(err) => DecisionOutcome::Failure(ProviderError::Decode(err.to_string())),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
