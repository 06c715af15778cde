// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! Wallet provisioning orchestrator.
//!
//! Linear flow with failure exits only:
//!
//! ```text
//! START → VAULT_CREATED → ASSET_ACTIVATED → ADDRESS_DERIVED → PERSISTED → DONE
//! ```
//!
//! Each step is recorded on a provisioning-attempt row before the next
//! external call, so a run that dies mid-flight leaves a failed record
//! naming the custody vault it may have orphaned. No step retries; no
//! compensation runs against the provider (vault accounts cannot be
//! deleted).

use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::providers::custody::{CustodyError, CustodyProvider};
use crate::storage::{
    AppDatabase, AttemptRepository, Currency, DbError, Network, ProvisioningAttempt,
    ProvisioningStep, StoredWallet, WalletRepository,
};

/// Provisioning parameters fixed at startup.
#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
    /// Network asset activated on every new vault.
    pub asset_id: String,
    pub network: Network,
    pub currency: Currency,
}

impl ProvisioningConfig {
    pub fn from_env() -> Self {
        Self {
            asset_id: crate::config::env_or_default("CUSTODY_ASSET_ID", "HBAR_TEST"),
            network: Network::Testnet,
            currency: Currency::Hbar,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    #[error("create_vault failed: {0}")]
    VaultCreation(#[source] CustodyError),

    #[error("activate_asset failed for vault {vault_id}: {source}")]
    AssetActivation {
        vault_id: String,
        #[source]
        source: CustodyError,
    },

    #[error("activation result for vault {0} contained no deposit address")]
    MissingAddress(String),

    #[error("native account id is not `shard.realm.num`: {0:?}")]
    InvalidNativeAddress(String),

    #[error("failed to persist wallet: {0}")]
    Persistence(#[from] DbError),
}

/// Deterministic idempotency token for one activation intent.
///
/// UUIDv5 over `user:asset:vault`, so a retry of the same intent presents
/// the same token and the provider can deduplicate it.
pub fn idempotency_token(user_id: &str, asset_id: &str, vault_id: &str) -> String {
    let intent = format!("{user_id}:{asset_id}:{vault_id}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, intent.as_bytes()).to_string()
}

/// Derive the EVM-compatible (long-zero) address from a native
/// `shard.realm.num` account id: 4 bytes shard, 8 bytes realm, 8 bytes num,
/// all big-endian, hex-encoded with a `0x` prefix.
pub fn evm_address_from_native(native: &str) -> Result<String, ProvisioningError> {
    let invalid = || ProvisioningError::InvalidNativeAddress(native.to_string());

    let mut parts = native.split('.');
    let shard: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let realm: u64 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let num: u64 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    if parts.next().is_some() {
        return Err(invalid());
    }

    let mut bytes = [0u8; 20];
    bytes[0..4].copy_from_slice(&shard.to_be_bytes());
    bytes[4..12].copy_from_slice(&realm.to_be_bytes());
    bytes[12..20].copy_from_slice(&num.to_be_bytes());

    Ok(format!("0x{}", hex::encode(bytes)))
}

/// Provision a custodial wallet for one user.
///
/// Any failure is wrapped with the operation that caused it; the attempt
/// record is marked failed with the same context and, once a vault exists,
/// its id.
pub async fn provision_wallet(
    custody: &dyn CustodyProvider,
    db: &AppDatabase,
    config: &ProvisioningConfig,
    user_id: &str,
    email: &str,
) -> Result<StoredWallet, ProvisioningError> {
    let attempts = AttemptRepository::new(db);
    let mut attempt = ProvisioningAttempt::start(user_id, &config.asset_id);
    attempts.save(&attempt)?;

    // START → VAULT_CREATED
    let vault = match custody.create_vault(user_id, email).await {
        Ok(vault) => vault,
        Err(e) => {
            record_failure(&attempts, &mut attempt, format!("create_vault: {e}"));
            return Err(ProvisioningError::VaultCreation(e));
        }
    };
    attempt.vault_id = Some(vault.id.clone());
    attempt.advance(ProvisioningStep::VaultCreated);
    attempts.save(&attempt)?;

    // VAULT_CREATED → ASSET_ACTIVATED
    let token = idempotency_token(user_id, &config.asset_id, &vault.id);
    let activation = match custody
        .activate_asset(&vault.id, &config.asset_id, &token)
        .await
    {
        Ok(activation) => activation,
        Err(e) => {
            record_failure(&attempts, &mut attempt, format!("activate_asset: {e}"));
            return Err(ProvisioningError::AssetActivation {
                vault_id: vault.id,
                source: e,
            });
        }
    };
    attempt.advance(ProvisioningStep::AssetActivated);
    attempts.save(&attempt)?;

    // ASSET_ACTIVATED → ADDRESS_DERIVED
    // A wallet without a deposit address is unusable, so absence is fatal.
    let address = match activation.address.filter(|a| !a.trim().is_empty()) {
        Some(address) => address,
        None => {
            record_failure(
                &attempts,
                &mut attempt,
                "activation result contained no deposit address".to_string(),
            );
            return Err(ProvisioningError::MissingAddress(vault.id));
        }
    };
    let evm_address = match evm_address_from_native(&address) {
        Ok(evm_address) => evm_address,
        Err(e) => {
            record_failure(&attempts, &mut attempt, e.to_string());
            return Err(e);
        }
    };
    attempt.advance(ProvisioningStep::AddressDerived);
    attempts.save(&attempt)?;

    // ADDRESS_DERIVED → PERSISTED
    let wallet = StoredWallet {
        wallet_id: Uuid::new_v4().to_string(),
        owner_user_id: user_id.to_string(),
        network: config.network,
        vault_id: vault.id,
        address,
        evm_address,
        asset: config.asset_id.clone(),
        currency: config.currency,
        is_active: true,
        balance: Decimal::ZERO,
        created_at: chrono::Utc::now(),
    };
    if let Err(e) = WalletRepository::new(db).create(&wallet) {
        record_failure(&attempts, &mut attempt, format!("persist wallet: {e}"));
        return Err(ProvisioningError::Persistence(e));
    }

    attempt.advance(ProvisioningStep::Persisted);
    attempt.complete();
    attempts.save(&attempt)?;

    info!(
        user_id,
        wallet_id = %wallet.wallet_id,
        vault_id = %wallet.vault_id,
        address = %wallet.address,
        "wallet provisioned"
    );

    Ok(wallet)
}

/// Failures on the attempt record must not mask the orchestration error.
fn record_failure(attempts: &AttemptRepository, attempt: &mut ProvisioningAttempt, context: String) {
    warn!(
        attempt_id = %attempt.attempt_id,
        user_id = %attempt.user_id,
        vault_id = ?attempt.vault_id,
        context = %context,
        "wallet provisioning failed"
    );
    attempt.fail(context);
    if let Err(e) = attempts.save(attempt) {
        warn!(error = %e, "failed to record provisioning failure");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::AttemptStatus;
    use crate::testkit::{temp_db, MockCustody};

    fn config() -> ProvisioningConfig {
        ProvisioningConfig {
            asset_id: "HBAR_TEST".to_string(),
            network: Network::Testnet,
            currency: Currency::Hbar,
        }
    }

    #[tokio::test]
    async fn happy_path_persists_active_wallet_and_completes_attempt() {
        let (_dir, db) = temp_db();
        let custody = MockCustody::default();

        let wallet = provision_wallet(&custody, &db, &config(), "user-1", "investor@example.com")
            .await
            .unwrap();

        assert!(wallet.is_active);
        assert_eq!(wallet.balance, Decimal::ZERO);
        assert_eq!(wallet.asset, "HBAR_TEST");
        assert_eq!(wallet.address, "0.0.6761316");
        assert_eq!(
            wallet.evm_address,
            "0x0000000000000000000000000000000000672b64"
        );

        let stored = WalletRepository::new(&db)
            .get_by_owner("user-1")
            .unwrap()
            .expect("wallet persisted");
        assert_eq!(stored, wallet);

        let failed = AttemptRepository::new(&db).list_failed().unwrap();
        assert!(failed.is_empty());
    }

    #[tokio::test]
    async fn missing_address_is_fatal_and_persists_nothing() {
        let (_dir, db) = temp_db();
        let custody = MockCustody {
            activation_address: None,
            ..MockCustody::default()
        };

        let err = provision_wallet(&custody, &db, &config(), "user-1", "investor@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisioningError::MissingAddress(_)));

        assert!(WalletRepository::new(&db)
            .get_by_owner("user-1")
            .unwrap()
            .is_none());

        // The failed attempt names the orphaned vault.
        let failed = AttemptRepository::new(&db).list_failed().unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].status, AttemptStatus::Failed);
        assert!(failed[0].vault_id.is_some());
    }

    #[tokio::test]
    async fn activation_failure_propagates() {
        let (_dir, db) = temp_db();
        let custody = MockCustody {
            fail_activate: true,
            ..MockCustody::default()
        };

        let err = provision_wallet(&custody, &db, &config(), "user-1", "investor@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisioningError::AssetActivation { .. }));

        assert!(WalletRepository::new(&db)
            .get_by_owner("user-1")
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn vault_creation_failure_leaves_no_vault_on_attempt() {
        let (_dir, db) = temp_db();
        let custody = MockCustody {
            fail_create: true,
            ..MockCustody::default()
        };

        let err = provision_wallet(&custody, &db, &config(), "user-1", "investor@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisioningError::VaultCreation(_)));

        let failed = AttemptRepository::new(&db).list_failed().unwrap();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].vault_id.is_none());
    }

    #[test]
    fn idempotency_tokens_are_deterministic_per_intent() {
        // A retry of the same intent presents the same token, so the
        // provider can deduplicate the activation.
        let first = idempotency_token("user-1", "HBAR_TEST", "42");
        let second = idempotency_token("user-1", "HBAR_TEST", "42");
        assert_eq!(first, second);

        let other_vault = idempotency_token("user-1", "HBAR_TEST", "43");
        assert_ne!(first, other_vault);

        let other_user = idempotency_token("user-2", "HBAR_TEST", "42");
        assert_ne!(first, other_user);
    }

    #[test]
    fn evm_address_is_long_zero_encoding() {
        let evm = evm_address_from_native("0.0.6761316").unwrap();
        assert_eq!(evm, "0x0000000000000000000000000000000000672b64");
        assert_eq!(evm.len(), 42);
    }

    #[test]
    fn malformed_native_account_ids_are_rejected() {
        for bad in ["", "6761316", "0.0", "0.0.x", "0.0.1.2"] {
            assert!(
                matches!(
                    evm_address_from_native(bad),
                    Err(ProvisioningError::InvalidNativeAddress(_))
                ),
                "expected rejection for {bad:?}"
            );
        }
    }
}
