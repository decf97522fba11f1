//! Realtime-database REST registry — token sets live under
//! `/{tokens_path}/{role}/{recipient}/{token}`.

use async_trait::async_trait;
use bookrelay_core::config::RegistryConfig;
use bookrelay_core::error::{RelayError, Result};
use bookrelay_core::types::Role;
use std::collections::HashMap;

use crate::TokenRegistry;

/// REST client against an RTDB-style JSON API.
pub struct RestRegistry {
    client: reqwest::Client,
    base_url: String,
    tokens_path: String,
    auth_token: String,
}

impl RestRegistry {
    pub fn new(config: &RegistryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens_path: config.tokens_path.clone(),
            auth_token: config.auth_token.clone(),
        }
    }

    fn node_url(&self, role: Role, recipient: &str, token: Option<&str>) -> String {
        match token {
            Some(token) => format!(
                "{}/{}/{}/{}/{}.json",
                self.base_url, self.tokens_path, role, recipient, token
            ),
            None => format!(
                "{}/{}/{}/{}.json",
                self.base_url, self.tokens_path, role, recipient
            ),
        }
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.auth_token.is_empty() {
            req
        } else {
            req.query(&[("auth", self.auth_token.as_str())])
        }
    }
}

#[async_trait]
impl TokenRegistry for RestRegistry {
    async fn tokens(&self, role: Role, recipient: &str) -> Result<Vec<String>> {
        let url = self.node_url(role, recipient, None);
        let response = self
            .with_auth(self.client.get(&url))
            .send()
            .await
            .map_err(|e| RelayError::Registry(format!("Token read failed: {e}")))?;

        if !response.status().is_success() {
            return Err(RelayError::Registry(format!(
                "Token read for {role}/{recipient} returned {}",
                response.status()
            )));
        }

        // The node is a map of token → registration metadata; a path that
        // was never written comes back as JSON null.
        let node: Option<HashMap<String, serde_json::Value>> = response
            .json()
            .await
            .map_err(|e| RelayError::Registry(format!("Invalid token node: {e}")))?;

        Ok(node.map(|map| map.into_keys().collect()).unwrap_or_default())
    }

    async fn remove(&self, role: Role, recipient: &str, token: &str) -> Result<()> {
        let url = self.node_url(role, recipient, Some(token));
        let response = self
            .with_auth(self.client.delete(&url))
            .send()
            .await
            .map_err(|e| RelayError::Registry(format!("Token delete failed: {e}")))?;

        // Deleting an absent path is a success upstream as well, so any 2xx
        // keeps this idempotent.
        if !response.status().is_success() {
            return Err(RelayError::Registry(format!(
                "Token delete for {role}/{recipient} returned {}",
                response.status()
            )));
        }
        tracing::debug!("🧹 Removed token from {role}/{recipient}");
        Ok(())
    }
}
