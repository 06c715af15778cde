// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! Transactional mail transport (Resend-style REST API).
//!
//! Mail is strictly best-effort: every business-flow caller fires and
//! forgets, and failures are logged, never propagated. When no API key is
//! configured the transport is disabled and sends become debug-logged
//! no-ops.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::{env_optional, env_or_default};

const DEFAULT_MAIL_API_BASE_URL: &str = "https://api.resend.com";
const DEFAULT_MAIL_FROM: &str = "no-reply@plotvault.local";

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport is not configured")]
    NotConfigured,

    #[error("mail request failed: {0}")]
    Request(String),

    #[error("mail response was invalid: {0}")]
    InvalidResponse(String),
}

/// REST mail transport.
#[derive(Debug, Clone)]
pub struct MailClient {
    api_base_url: String,
    api_key: Option<String>,
    from: String,
    http: Client,
}

impl MailClient {
    pub fn from_env() -> Result<Self, MailError> {
        let api_base_url = env_or_default("MAIL_API_BASE_URL", DEFAULT_MAIL_API_BASE_URL);
        let api_key = env_optional("RESEND_API_KEY");
        let from = env_or_default("MAIL_FROM", DEFAULT_MAIL_FROM);

        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| MailError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_base_url,
            api_key,
            from,
            http,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send one templated message. Returns the provider delivery id.
    pub async fn send_template(
        &self,
        template: &str,
        recipient: &str,
        subject: &str,
        html: &str,
        tags: &[&str],
    ) -> Result<String, MailError> {
        let api_key = self.api_key.as_deref().ok_or(MailError::NotConfigured)?;
        let payload = build_payload(&self.from, recipient, subject, html, tags);

        let response = self
            .http
            .post(format!(
                "{}/emails",
                self.api_base_url.trim_end_matches('/')
            ))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailError::Request(format!("POST /emails failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Request(format!(
                "POST /emails returned {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| MailError::InvalidResponse(format!("POST /emails invalid JSON: {e}")))?;

        let delivery_id = body
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                MailError::InvalidResponse("missing delivery id in response".to_string())
            })?
            .to_string();

        debug!(template, delivery_id = %delivery_id, "mail accepted by transport");
        Ok(delivery_id)
    }

    /// Notify a user their wallet is ready. Fire-and-forget: spawned off the
    /// request, outcome only logged.
    pub fn send_wallet_ready(self: &Arc<Self>, recipient: String, address: String) {
        let client = Arc::clone(self);
        tokio::spawn(async move {
            if !client.is_configured() {
                debug!("mail transport disabled, skipping wallet_ready email");
                return;
            }
            let html = templates::wallet_ready(&address);
            match client
                .send_template(
                    "wallet_ready",
                    &recipient,
                    "Your wallet is ready",
                    &html,
                    &["wallet_ready"],
                )
                .await
            {
                Ok(delivery_id) => {
                    info!(delivery_id = %delivery_id, "wallet_ready email sent");
                }
                Err(e) => warn!(error = %e, "Failed to send wallet_ready email"),
            }
        });
    }
}

fn build_payload(from: &str, to: &str, subject: &str, html: &str, tags: &[&str]) -> Value {
    let tag_objects: Vec<Value> = tags.iter().map(|tag| json!({ "name": tag })).collect();
    json!({
        "from": from,
        "to": [to],
        "subject": subject,
        "html": html,
        "tags": tag_objects,
    })
}

/// In-process HTML templates for transactional mail.
pub mod templates {
    /// Body for the wallet-provisioned notification.
    pub fn wallet_ready(address: &str) -> String {
        format!(
            "<h2>Your wallet is ready</h2>\
             <p>Your custodial wallet has been provisioned. You can now fund \
             it and invest in listed properties.</p>\
             <p>Deposit address: <strong>{address}</strong></p>"
        )
    }
}
