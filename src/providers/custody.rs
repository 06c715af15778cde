// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! Custody provider integration (Fireblocks-compatible vault API).
//!
//! All key material lives with the provider; this service only orchestrates
//! vault creation, asset activation, and balance reads over REST.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::{env_or_default, env_optional, required_env_present};

const DEFAULT_API_BASE_URL: &str = "https://sandbox-api.fireblocks.io";

#[derive(Debug, thiserror::Error)]
pub enum CustodyError {
    #[error("custody configuration missing: {0}")]
    MissingConfig(String),

    #[error("custody request failed: {0}")]
    Request(String),

    #[error("custody response was invalid: {0}")]
    InvalidResponse(String),
}

/// A provider-managed vault holding asset balances for one owner.
#[derive(Debug, Clone, Deserialize)]
pub struct VaultAccount {
    /// Provider-assigned vault identifier.
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Assets activated on this vault.
    #[serde(default)]
    pub assets: Vec<VaultAsset>,
}

/// Balance entry for one activated asset.
#[derive(Debug, Clone, Deserialize)]
pub struct VaultAsset {
    /// Asset identifier (e.g. `HBAR_TEST`).
    pub id: String,
    /// Total balance as a decimal string.
    #[serde(default)]
    pub total: Option<String>,
    #[serde(default)]
    pub available: Option<String>,
}

/// Result of activating an asset on a vault.
///
/// The deposit address may be absent when the provider has not finished
/// deriving it; callers treat that as fatal.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetActivation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, rename = "legacyAddress")]
    pub legacy_address: Option<String>,
}

/// Abstract custody capability consumed by the provisioning orchestrator.
#[async_trait]
pub trait CustodyProvider: Send + Sync {
    /// Create a vault keyed by the owner's identity, labeled for the UI.
    async fn create_vault(
        &self,
        customer_ref_id: &str,
        name: &str,
    ) -> Result<VaultAccount, CustodyError>;

    /// Activate a network asset on a vault so it can hold balances.
    async fn activate_asset(
        &self,
        vault_id: &str,
        asset_id: &str,
        idempotency_key: &str,
    ) -> Result<AssetActivation, CustodyError>;

    /// Fetch a vault with its asset balances.
    async fn get_vault(&self, vault_id: &str) -> Result<VaultAccount, CustodyError>;
}

/// REST client for the custody provider.
#[derive(Debug, Clone)]
pub struct CustodyClient {
    api_base_url: String,
    api_key: String,
    http: Client,
}

impl CustodyClient {
    pub fn is_configured() -> bool {
        required_env_present("CUSTODY_API_KEY")
    }

    pub fn from_env() -> Result<Self, CustodyError> {
        let api_base_url = env_or_default("CUSTODY_API_BASE_URL", DEFAULT_API_BASE_URL);
        let api_key = env_optional("CUSTODY_API_KEY")
            .ok_or_else(|| CustodyError::MissingConfig("CUSTODY_API_KEY".to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| CustodyError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_base_url,
            api_key,
            http,
        })
    }

    async fn get_json(&self, path: &str) -> Result<Value, CustodyError> {
        let response = self
            .http
            .get(format!(
                "{}{}",
                self.api_base_url.trim_end_matches('/'),
                path
            ))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| CustodyError::Request(format!("GET {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CustodyError::Request(format!(
                "GET {path} returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CustodyError::InvalidResponse(format!("GET {path} invalid JSON: {e}")))
    }

    async fn post_json(
        &self,
        path: &str,
        payload: &Value,
        idempotency_key: Option<&str>,
    ) -> Result<Value, CustodyError> {
        let mut request = self
            .http
            .post(format!(
                "{}{}",
                self.api_base_url.trim_end_matches('/'),
                path
            ))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(payload);

        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CustodyError::Request(format!("POST {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CustodyError::Request(format!(
                "POST {path} returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CustodyError::InvalidResponse(format!("POST {path} invalid JSON: {e}")))
    }
}

#[async_trait]
impl CustodyProvider for CustodyClient {
    async fn create_vault(
        &self,
        customer_ref_id: &str,
        name: &str,
    ) -> Result<VaultAccount, CustodyError> {
        let payload = json!({
            "name": name,
            "customerRefId": customer_ref_id,
            "hiddenOnUI": false,
            "autoFuel": false,
        });

        let response = self.post_json("/v1/vault/accounts", &payload, None).await?;
        parse_vault_account(response)
    }

    async fn activate_asset(
        &self,
        vault_id: &str,
        asset_id: &str,
        idempotency_key: &str,
    ) -> Result<AssetActivation, CustodyError> {
        let path = format!("/v1/vault/accounts/{vault_id}/{asset_id}/activate");
        let response = self
            .post_json(&path, &json!({}), Some(idempotency_key))
            .await?;

        serde_json::from_value(response)
            .map_err(|e| CustodyError::InvalidResponse(format!("activation payload: {e}")))
    }

    async fn get_vault(&self, vault_id: &str) -> Result<VaultAccount, CustodyError> {
        let response = self.get_json(&format!("/v1/vault/accounts/{vault_id}")).await?;
        parse_vault_account(response)
    }
}

/// The provider serializes vault ids as either a JSON string or a number;
/// normalize to a string before deserializing the rest of the payload.
fn parse_vault_account(mut response: Value) -> Result<VaultAccount, CustodyError> {
    if let Some(id) = response.get("id").and_then(Value::as_i64) {
        response["id"] = Value::String(id.to_string());
    }
    serde_json::from_value(response)
        .map_err(|e| CustodyError::InvalidResponse(format!("vault payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_payload_with_string_id_parses() {
        let vault = parse_vault_account(json!({
            "id": "42",
            "name": "investor@example.com",
            "assets": [{"id": "HBAR_TEST", "total": "12.5", "available": "12.5"}]
        }))
        .unwrap();

        assert_eq!(vault.id, "42");
        assert_eq!(vault.assets.len(), 1);
        assert_eq!(vault.assets[0].total.as_deref(), Some("12.5"));
    }

    #[test]
    fn vault_payload_with_numeric_id_is_normalized() {
        let vault = parse_vault_account(json!({"id": 42})).unwrap();
        assert_eq!(vault.id, "42");
        assert!(vault.assets.is_empty());
    }

    #[test]
    fn vault_payload_without_id_is_invalid() {
        let result = parse_vault_account(json!({"name": "x"}));
        assert!(matches!(result, Err(CustodyError::InvalidResponse(_))));
    }

    #[test]
    fn activation_payload_tolerates_missing_address() {
        let activation: AssetActivation =
            serde_json::from_value(json!({"id": "HBAR_TEST"})).unwrap();
        assert!(activation.address.is_none());

        let activation: AssetActivation = serde_json::from_value(json!({
            "id": "HBAR_TEST",
            "address": "0.0.6761316",
            "legacyAddress": ""
        }))
        .unwrap();
        assert_eq!(activation.address.as_deref(), Some("0.0.6761316"));
    }
}
