//! FCM (legacy HTTP API) gateway — batched `registration_ids` send.

use async_trait::async_trait;
use bookrelay_core::config::GatewayConfig;
use bookrelay_core::error::{RelayError, Result};
use bookrelay_core::types::NotificationPayload;
use serde::Deserialize;

use crate::outcome::{SendOutcome, ERR_INVALID_TOKEN, ERR_TOKEN_NOT_REGISTERED};
use crate::PushGateway;

/// FCM gateway client over the legacy HTTP endpoint.
pub struct FcmGateway {
    client: reqwest::Client,
    api_url: String,
    server_key: String,
}

impl FcmGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RelayError::Gateway(format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            server_key: config.server_key.clone(),
        })
    }

    /// Build the wire message for a batch. The payload shape decides whether
    /// the OS renders the notification (`notification`) or the client app
    /// does (`data`).
    fn message_body(tokens: &[String], payload: &NotificationPayload) -> serde_json::Value {
        match payload {
            NotificationPayload::Alert { title, body } => serde_json::json!({
                "registration_ids": tokens,
                "notification": { "title": title, "body": body },
            }),
            NotificationPayload::Data(map) => serde_json::json!({
                "registration_ids": tokens,
                "data": map,
            }),
        }
    }
}

#[async_trait]
impl PushGateway for FcmGateway {
    async fn send_batch(
        &self,
        tokens: &[String],
        payload: &NotificationPayload,
    ) -> Result<Vec<SendOutcome>> {
        let body = Self::message_body(tokens, payload);

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Gateway(format!("FCM send failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RelayError::Gateway(format!("FCM API error {status}: {text}")));
        }

        let parsed: FcmResponse = response
            .json()
            .await
            .map_err(|e| RelayError::Gateway(format!("Invalid FCM response: {e}")))?;

        tracing::debug!("📨 FCM batch of {} tokens accepted", tokens.len());
        Ok(zip_outcomes(tokens, parsed))
    }
}

/// Pair wire results back with their tokens. The FCM results array is
/// positional; a short array (which the API does not produce, but a broken
/// proxy might) marks the tail as failed rather than panicking.
fn zip_outcomes(tokens: &[String], response: FcmResponse) -> Vec<SendOutcome> {
    let mut results = response.results.into_iter();
    tokens
        .iter()
        .map(|token| match results.next() {
            Some(FcmResult {
                error: Some(code), ..
            }) => SendOutcome::failed(token, normalize_error(&code)),
            Some(FcmResult { message_id, .. }) => SendOutcome::delivered(token, message_id),
            None => SendOutcome::failed(token, "messaging/unknown-error"),
        })
        .collect()
}

/// Map legacy wire error strings onto the canonical `messaging/*` codes the
/// reconciler understands. Unknown strings pass through unchanged.
fn normalize_error(wire: &str) -> String {
    match wire {
        "InvalidRegistration" | "MissingRegistration" => ERR_INVALID_TOKEN.into(),
        "NotRegistered" => ERR_TOKEN_NOT_REGISTERED.into(),
        other if other.starts_with("messaging/") => other.into(),
        "Unavailable" => "messaging/server-unavailable".into(),
        "InternalServerError" => "messaging/internal-error".into(),
        "DeviceMessageRateExceeded" => "messaging/device-message-rate-exceeded".into(),
        other => format!("messaging/{}", other.to_lowercase()),
    }
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    results: Vec<FcmResult>,
}

#[derive(Debug, Deserialize)]
struct FcmResult {
    #[serde(default)]
    message_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}
