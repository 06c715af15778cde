// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! User wallet repository.
//!
//! A wallet row is written once by the provisioning orchestrator after all
//! custody calls succeed. `vault_id` and the address pair are immutable from
//! then on; only the active flag and the cached display balance change.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::db::{AppDatabase, DbError, DbResult, WALLETS, WALLET_OWNERS};

/// Network environment a wallet was provisioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Testnet,
    Mainnet,
}

/// Settlement currency of the provisioned asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Hbar,
}

/// A custodial wallet record.
///
/// The custody provider remains the source of truth for balances; `balance`
/// here is a cached display value refreshed on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredWallet {
    /// Unique wallet identifier (UUID).
    pub wallet_id: String,
    /// User who owns this wallet.
    pub owner_user_id: String,
    pub network: Network,
    /// Custody-provider vault identifier. Immutable once set.
    pub vault_id: String,
    /// Native deposit address (`shard.realm.num`). Immutable once set.
    pub address: String,
    /// EVM-compatible encoding of the native address. Immutable once set.
    pub evm_address: String,
    /// Asset symbol activated on the vault (e.g. `HBAR_TEST`).
    pub asset: String,
    pub currency: Currency,
    pub is_active: bool,
    /// Cached display balance; not authoritative.
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Repository for custodial wallets.
pub struct WalletRepository<'a> {
    db: &'a AppDatabase,
}

impl<'a> WalletRepository<'a> {
    pub fn new(db: &'a AppDatabase) -> Self {
        Self { db }
    }

    /// Persist a freshly provisioned wallet.
    ///
    /// The per-user uniqueness check and both inserts happen in one write
    /// transaction, so at most one wallet row ever lands per user.
    pub fn create(&self, wallet: &StoredWallet) -> DbResult<()> {
        let json = serde_json::to_vec(wallet)?;

        let write_txn = self.db.raw().begin_write()?;
        {
            let mut owners = write_txn.open_table(WALLET_OWNERS)?;
            if owners.get(wallet.owner_user_id.as_str())?.is_some() {
                return Err(DbError::AlreadyExists(format!(
                    "Wallet for user {}",
                    wallet.owner_user_id
                )));
            }
            owners.insert(wallet.owner_user_id.as_str(), wallet.wallet_id.as_str())?;

            let mut wallets = write_txn.open_table(WALLETS)?;
            wallets.insert(wallet.wallet_id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get(&self, wallet_id: &str) -> DbResult<StoredWallet> {
        self.db
            .read_json(WALLETS, wallet_id)?
            .ok_or_else(|| DbError::NotFound(format!("Wallet {wallet_id}")))
    }

    /// Look up a user's wallet through the owner index.
    pub fn get_by_owner(&self, owner_user_id: &str) -> DbResult<Option<StoredWallet>> {
        let read_txn = self.db.raw().begin_read()?;
        let owners = read_txn.open_table(WALLET_OWNERS)?;
        let wallet_id = match owners.get(owner_user_id)? {
            Some(value) => value.value().to_string(),
            None => return Ok(None),
        };
        drop(owners);

        self.db.read_json(WALLETS, &wallet_id)
    }

    /// Flip the active flag, returning the updated record.
    pub fn set_active(&self, wallet_id: &str, is_active: bool) -> DbResult<StoredWallet> {
        self.update(wallet_id, |wallet| wallet.is_active = is_active)
    }

    /// Refresh the cached display balance, returning the updated record.
    pub fn update_cached_balance(
        &self,
        wallet_id: &str,
        balance: Decimal,
    ) -> DbResult<StoredWallet> {
        self.update(wallet_id, |wallet| wallet.balance = balance)
    }

    /// Read-modify-write a wallet inside one write transaction.
    fn update(
        &self,
        wallet_id: &str,
        mutate: impl FnOnce(&mut StoredWallet),
    ) -> DbResult<StoredWallet> {
        let write_txn = self.db.raw().begin_write()?;
        let wallet = {
            let mut table = write_txn.open_table(WALLETS)?;

            let existing_bytes = {
                let existing = table
                    .get(wallet_id)?
                    .ok_or_else(|| DbError::NotFound(format!("Wallet {wallet_id}")))?;
                existing.value().to_vec()
            };

            let mut wallet: StoredWallet = serde_json::from_slice(&existing_bytes)?;
            mutate(&mut wallet);

            let json = serde_json::to_vec(&wallet)?;
            table.insert(wallet_id, json.as_slice())?;
            wallet
        };
        write_txn.commit()?;
        Ok(wallet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::sample_wallet;
    use rust_decimal_macros::dec;

    fn temp_db() -> (tempfile::TempDir, AppDatabase) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = AppDatabase::open(&dir.path().join("test.redb")).expect("open db");
        (dir, db)
    }

    #[test]
    fn create_and_lookup_by_owner() {
        let (_dir, db) = temp_db();
        let repo = WalletRepository::new(&db);

        let wallet = sample_wallet("w1", "user-1");
        repo.create(&wallet).unwrap();

        let loaded = repo.get_by_owner("user-1").unwrap().expect("wallet");
        assert_eq!(loaded, wallet);
        assert!(repo.get_by_owner("user-2").unwrap().is_none());
    }

    #[test]
    fn second_wallet_for_same_user_is_rejected() {
        let (_dir, db) = temp_db();
        let repo = WalletRepository::new(&db);

        repo.create(&sample_wallet("w1", "user-1")).unwrap();
        let result = repo.create(&sample_wallet("w2", "user-1"));
        assert!(matches!(result, Err(DbError::AlreadyExists(_))));

        // The rejected transaction left neither the wallet nor index entry.
        assert!(matches!(repo.get("w2"), Err(DbError::NotFound(_))));
        assert_eq!(
            repo.get_by_owner("user-1").unwrap().unwrap().wallet_id,
            "w1"
        );
    }

    #[test]
    fn toggle_active_round_trips() {
        let (_dir, db) = temp_db();
        let repo = WalletRepository::new(&db);
        repo.create(&sample_wallet("w1", "user-1")).unwrap();

        let deactivated = repo.set_active("w1", false).unwrap();
        assert!(!deactivated.is_active);

        let reactivated = repo.set_active("w1", true).unwrap();
        assert!(reactivated.is_active);
    }

    #[test]
    fn cached_balance_updates_without_touching_addresses() {
        let (_dir, db) = temp_db();
        let repo = WalletRepository::new(&db);
        let wallet = sample_wallet("w1", "user-1");
        repo.create(&wallet).unwrap();

        let updated = repo.update_cached_balance("w1", dec!(12.5)).unwrap();
        assert_eq!(updated.balance, dec!(12.5));
        assert_eq!(updated.vault_id, wallet.vault_id);
        assert_eq!(updated.address, wallet.address);
    }

    #[test]
    fn set_active_on_missing_wallet_is_not_found() {
        let (_dir, db) = temp_db();
        let repo = WalletRepository::new(&db);
        assert!(matches!(
            repo.set_active("ghost", false),
            Err(DbError::NotFound(_))
        ));
    }
}
