// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! # API Data Models
//!
//! Request and response structures for the REST API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI
//! documentation. Stored entities live with their repositories under
//! `storage::repository`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::pricing::{self, MoneyParseError};
use crate::storage::{PortfolioItem, ProvisioningAttempt, StoredProperty, StoredWallet};

// =============================================================================
// Monetary Input
// =============================================================================

/// A monetary amount as clients send it: either a JSON number or a
/// loosely-formatted string ("₦1,000.50").
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum MoneyInput {
    Number(f64),
    Text(String),
}

impl MoneyInput {
    /// Normalize to a `Decimal`, surfacing parse failures to the caller.
    pub fn to_decimal(&self) -> Result<Decimal, MoneyParseError> {
        match self {
            MoneyInput::Number(value) => pricing::money_from_f64(*value),
            MoneyInput::Text(raw) => pricing::parse_money(raw),
        }
    }
}

// =============================================================================
// Property Models
// =============================================================================

/// Request to create a property listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePropertyRequest {
    /// Listing title.
    pub title: String,
    /// Base price; number or loosely-formatted monetary string.
    pub property_price: MoneyInput,
    /// Purchase-cost percentage (default 5).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_pct: Option<Decimal>,
    /// Transaction-fee percentage (default 5).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_pct: Option<Decimal>,
    /// Mandatory/official fee percentage (default 3).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mof_pct: Option<Decimal>,
    /// Number of investable units (default 1; zero is rejected).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_units: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amenities: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub why_invest: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub governors_consent_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deed_of_assignment_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey_plan_url: Option<String>,
}

/// Response after creating a property listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePropertyResponse {
    pub property: StoredProperty,
    pub message: String,
}

/// Response containing all property listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PropertyListResponse {
    pub properties: Vec<StoredProperty>,
    pub total: usize,
}

// =============================================================================
// Wallet Models
// =============================================================================

/// Envelope for the user-wallet endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletEnvelope {
    /// Always `"success"` on the happy path.
    pub status: String,
    pub data: StoredWallet,
}

impl WalletEnvelope {
    pub fn success(data: StoredWallet) -> Self {
        Self {
            status: "success".to_string(),
            data,
        }
    }
}

/// Response after provisioning a wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateWalletResponse {
    pub wallet: StoredWallet,
    pub message: String,
}

/// Custody-sourced balance for the provisioned asset.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletBalanceResponse {
    pub wallet_id: String,
    pub asset: String,
    /// Balance reported by the custody provider.
    pub balance: Decimal,
}

/// Display conversion of a crypto amount into fiat values.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletValueResponse {
    /// Crypto amount that was converted.
    pub amount: Decimal,
    /// Crypto→USD rate used.
    pub usd_rate: Decimal,
    /// USD→NGN rate used.
    pub ngn_rate: Decimal,
    /// Amount in USD, two-decimal string.
    pub usd_value: String,
    /// Amount in NGN, two-decimal string.
    pub ngn_value: String,
}

// =============================================================================
// Portfolio & Admin Models
// =============================================================================

/// Response containing a user's holdings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PortfolioListResponse {
    pub items: Vec<PortfolioItem>,
    pub total: usize,
}

/// Response listing failed provisioning attempts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttemptListResponse {
    pub attempts: Vec<ProvisioningAttempt>,
    pub total: usize,
}
