// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! Portfolio holdings repository.
//!
//! Keyed by composite `user_id|property_id`, unique per pair. The prefix
//! layout lets one range scan return everything a user holds.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::db::{AppDatabase, DbResult, PORTFOLIO};

/// Units of a property held by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PortfolioItem {
    /// Unique item identifier (UUID).
    pub id: String,
    pub user_id: String,
    pub property_id: String,
    pub units_owned: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Composite key: `user_id|property_id`.
fn make_key(user_id: &str, property_id: &str) -> String {
    format!("{user_id}|{property_id}")
}

/// Prefix for range-scanning all holdings of a user.
fn make_prefix(user_id: &str) -> String {
    format!("{user_id}|")
}

/// Upper bound for the prefix scan. `|` sorts below `}` in ASCII, so every
/// key starting with `user_id|` falls inside the range.
fn make_prefix_end(user_id: &str) -> String {
    format!("{user_id}}}")
}

/// Repository for portfolio holdings.
pub struct PortfolioRepository<'a> {
    db: &'a AppDatabase,
}

impl<'a> PortfolioRepository<'a> {
    pub fn new(db: &'a AppDatabase) -> Self {
        Self { db }
    }

    /// Insert or replace a holding for (user, property).
    pub fn upsert(&self, item: &PortfolioItem) -> DbResult<()> {
        let key = make_key(&item.user_id, &item.property_id);
        let json = serde_json::to_vec(item)?;

        let write_txn = self.db.raw().begin_write()?;
        {
            let mut table = write_txn.open_table(PORTFOLIO)?;
            table.insert(key.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// All holdings of one user.
    pub fn list_by_user(&self, user_id: &str) -> DbResult<Vec<PortfolioItem>> {
        let read_txn = self.db.raw().begin_read()?;
        let table = read_txn.open_table(PORTFOLIO)?;

        let prefix = make_prefix(user_id);
        let prefix_end = make_prefix_end(user_id);

        let mut items = Vec::new();
        for entry in table.range(prefix.as_str()..prefix_end.as_str())? {
            let entry = entry?;
            items.push(serde_json::from_slice(entry.1.value())?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(user: &str, property: &str, units: u32) -> PortfolioItem {
        PortfolioItem {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.to_string(),
            property_id: property.to_string(),
            units_owned: units,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn temp_db() -> (tempfile::TempDir, AppDatabase) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = AppDatabase::open(&dir.path().join("test.redb")).expect("open db");
        (dir, db)
    }

    #[test]
    fn list_by_user_returns_only_that_users_holdings() {
        let (_dir, db) = temp_db();
        let repo = PortfolioRepository::new(&db);

        repo.upsert(&item("user-1", "p1", 10)).unwrap();
        repo.upsert(&item("user-1", "p2", 3)).unwrap();
        repo.upsert(&item("user-2", "p1", 7)).unwrap();

        let holdings = repo.list_by_user("user-1").unwrap();
        assert_eq!(holdings.len(), 2);
        assert!(holdings.iter().all(|h| h.user_id == "user-1"));

        assert!(repo.list_by_user("user-3").unwrap().is_empty());
    }

    #[test]
    fn upsert_replaces_units_for_same_pair() {
        let (_dir, db) = temp_db();
        let repo = PortfolioRepository::new(&db);

        repo.upsert(&item("user-1", "p1", 10)).unwrap();
        repo.upsert(&item("user-1", "p1", 25)).unwrap();

        let holdings = repo.list_by_user("user-1").unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].units_owned, 25);
    }
}
