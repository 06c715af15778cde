// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! Shared test fixtures: mock custody provider, temp database, sample
//! records, and a fully wired `AppState` for handler tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::auth::AuthConfig;
use crate::events::EventBus;
use crate::providers::custody::{
    AssetActivation, CustodyError, CustodyProvider, VaultAccount, VaultAsset,
};
use crate::providers::{CryptoRateClient, ForexRateClient, MailClient};
use crate::provisioning::ProvisioningConfig;
use crate::state::AppState;
use crate::storage::{AppDatabase, Currency, Network, StoredProperty, StoredWallet};

/// Configurable in-memory custody provider.
pub struct MockCustody {
    pub fail_create: bool,
    pub fail_activate: bool,
    /// Address returned by activation; `None` simulates a provider that has
    /// not derived one.
    pub activation_address: Option<String>,
    /// Asset balance reported by `get_vault`.
    pub vault_balance: &'static str,
}

impl Default for MockCustody {
    fn default() -> Self {
        Self {
            fail_create: false,
            fail_activate: false,
            activation_address: Some("0.0.6761316".to_string()),
            vault_balance: "0",
        }
    }
}

#[async_trait]
impl CustodyProvider for MockCustody {
    async fn create_vault(
        &self,
        customer_ref_id: &str,
        name: &str,
    ) -> Result<VaultAccount, CustodyError> {
        if self.fail_create {
            return Err(CustodyError::Request(
                "POST /v1/vault/accounts returned 500".to_string(),
            ));
        }
        let _ = customer_ref_id;
        Ok(VaultAccount {
            id: "42".to_string(),
            name: Some(name.to_string()),
            assets: Vec::new(),
        })
    }

    async fn activate_asset(
        &self,
        _vault_id: &str,
        asset_id: &str,
        _idempotency_key: &str,
    ) -> Result<AssetActivation, CustodyError> {
        if self.fail_activate {
            return Err(CustodyError::Request(
                "POST activate returned 503".to_string(),
            ));
        }
        Ok(AssetActivation {
            id: Some(asset_id.to_string()),
            address: self.activation_address.clone(),
            legacy_address: None,
        })
    }

    async fn get_vault(&self, vault_id: &str) -> Result<VaultAccount, CustodyError> {
        Ok(VaultAccount {
            id: vault_id.to_string(),
            name: None,
            assets: vec![VaultAsset {
                id: "HBAR_TEST".to_string(),
                total: Some(self.vault_balance.to_string()),
                available: Some(self.vault_balance.to_string()),
            }],
        })
    }
}

/// Open a fresh database in a temp directory.
pub fn temp_db() -> (tempfile::TempDir, AppDatabase) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = AppDatabase::open(&dir.path().join("test.redb")).expect("open db");
    (dir, db)
}

/// Fully wired state for handler tests, backed by a temp database and the
/// given mock custody provider. The temp dir must outlive the state.
pub fn temp_state(custody: MockCustody) -> (tempfile::TempDir, AppState) {
    let (dir, db) = temp_db();
    let state = AppState {
        db: Arc::new(db),
        custody: Arc::new(custody),
        crypto_rates: Arc::new(CryptoRateClient::from_env().expect("rate client")),
        forex_rates: Arc::new(ForexRateClient::from_env().expect("forex client")),
        mail: Arc::new(MailClient::from_env().expect("mail client")),
        events: EventBus::new(),
        auth: AuthConfig::development(),
        provisioning: Arc::new(ProvisioningConfig {
            asset_id: "HBAR_TEST".to_string(),
            network: Network::Testnet,
            currency: Currency::Hbar,
        }),
    };
    (dir, state)
}

pub fn test_admin() -> crate::auth::AuthenticatedUser {
    crate::auth::AuthenticatedUser {
        user_id: "admin-1".to_string(),
        email: Some("admin@plotvault.local".to_string()),
        role: crate::auth::Role::Admin,
        issuer: "plotvault".to_string(),
    }
}

pub fn test_user(user_id: &str) -> crate::auth::AuthenticatedUser {
    crate::auth::AuthenticatedUser {
        user_id: user_id.to_string(),
        email: Some(format!("{user_id}@example.com")),
        role: crate::auth::Role::Client,
        issuer: "plotvault".to_string(),
    }
}

pub fn sample_property(id: &str) -> StoredProperty {
    StoredProperty {
        id: id.to_string(),
        title: "Lekki Pearl Towers".to_string(),
        token_symbol: "LEKKIA1B2C3D4".to_string(),
        property_price: "250000.00".to_string(),
        purchase_pct: Decimal::new(5, 0),
        transaction_pct: Decimal::new(5, 0),
        mof_pct: Decimal::new(3, 0),
        purchase_costs: "12500.00".to_string(),
        transaction_fees: "12500.00".to_string(),
        mof_fees: "7500.00".to_string(),
        listing_price: "282500.00".to_string(),
        price_per_unit: "282.50".to_string(),
        num_units: 1000,
        features: None,
        amenities: None,
        why_invest: None,
        image_urls: None,
        governors_consent_url: None,
        deed_of_assignment_url: None,
        survey_plan_url: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn sample_wallet(wallet_id: &str, owner: &str) -> StoredWallet {
    StoredWallet {
        wallet_id: wallet_id.to_string(),
        owner_user_id: owner.to_string(),
        network: Network::Testnet,
        vault_id: "42".to_string(),
        address: "0.0.6761316".to_string(),
        evm_address: "0x0000000000000000000000000000000000672b64".to_string(),
        asset: "HBAR_TEST".to_string(),
        currency: Currency::Hbar,
        is_active: true,
        balance: Decimal::ZERO,
        created_at: Utc::now(),
    }
}
