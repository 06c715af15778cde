// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! Embedded application database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `properties`: property_id → serialized StoredProperty
//! - `wallets`: wallet_id → serialized StoredWallet
//! - `wallet_owners`: owner_user_id → wallet_id (one wallet per user)
//! - `portfolio`: composite key (user_id|property_id) → serialized PortfolioItem
//! - `provisioning_attempts`: attempt_id → serialized ProvisioningAttempt
//!
//! Every repository write is a single `begin_write … commit`, which is the
//! all-or-nothing transaction the orchestrators rely on: either the full
//! record lands or nothing does.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{de::DeserializeOwned, Serialize};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: property_id → serialized StoredProperty (JSON bytes).
pub(crate) const PROPERTIES: TableDefinition<&str, &[u8]> = TableDefinition::new("properties");

/// Primary table: wallet_id → serialized StoredWallet (JSON bytes).
pub(crate) const WALLETS: TableDefinition<&str, &[u8]> = TableDefinition::new("wallets");

/// Index: owner_user_id → wallet_id. Enforces one wallet per user inside
/// the same write transaction that inserts the wallet.
pub(crate) const WALLET_OWNERS: TableDefinition<&str, &str> = TableDefinition::new("wallet_owners");

/// Holdings: composite key `user_id|property_id` → serialized PortfolioItem.
pub(crate) const PORTFOLIO: TableDefinition<&str, &[u8]> = TableDefinition::new("portfolio");

/// Provisioning lifecycle records: attempt_id → serialized ProvisioningAttempt.
pub(crate) const ATTEMPTS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("provisioning_attempts");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// AppDatabase
// =============================================================================

/// Shared handle over the embedded database. Cheap to reference from every
/// repository; redb serializes writers internally.
pub struct AppDatabase {
    db: Database,
}

impl AppDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DbResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PROPERTIES)?;
            let _ = write_txn.open_table(WALLETS)?;
            let _ = write_txn.open_table(WALLET_OWNERS)?;
            let _ = write_txn.open_table(PORTFOLIO)?;
            let _ = write_txn.open_table(ATTEMPTS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Raw database handle for multi-table write transactions.
    pub(crate) fn raw(&self) -> &Database {
        &self.db
    }

    /// Read and deserialize a single record.
    pub(crate) fn read_json<T: DeserializeOwned>(
        &self,
        table: TableDefinition<'static, &'static str, &'static [u8]>,
        key: &str,
    ) -> DbResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Serialize and upsert a single record in its own write transaction.
    pub(crate) fn write_json<T: Serialize>(
        &self,
        table: TableDefinition<'static, &'static str, &'static [u8]>,
        key: &str,
        value: &T,
    ) -> DbResult<()> {
        let json = serde_json::to_vec(value)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(table)?;
            table.insert(key, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Deserialize every record in a table.
    pub(crate) fn list_json<T: DeserializeOwned>(
        &self,
        table: TableDefinition<'static, &'static str, &'static [u8]>,
    ) -> DbResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        let mut records = Vec::new();
        for entry in table.iter()? {
            let entry = entry?;
            records.push(serde_json::from_slice(entry.1.value())?);
        }
        Ok(records)
    }
}
