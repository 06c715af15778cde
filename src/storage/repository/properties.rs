// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! Property listing repository.
//!
//! A listing is created exactly once, inside a single write transaction,
//! with every derived monetary field already computed. Derived fields are
//! never mutated independently of the base inputs.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::super::db::{AppDatabase, DbError, DbResult, PROPERTIES};

/// A tokenized property listing.
///
/// Optional payloads are serialized without `skip_serializing_if`: an absent
/// field persists as an explicit `null`, so every stored record has the same
/// shape for downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredProperty {
    /// Unique listing identifier (UUID).
    pub id: String,
    /// Listing title.
    pub title: String,
    /// Ticker-style symbol derived from title and id.
    pub token_symbol: String,
    /// Base price, two-decimal string.
    pub property_price: String,
    /// Purchase-cost percentage applied to the base price.
    pub purchase_pct: Decimal,
    /// Transaction-fee percentage applied to the base price.
    pub transaction_pct: Decimal,
    /// Mandatory/official fee percentage applied to the base price.
    pub mof_pct: Decimal,
    /// `price * purchase_pct / 100`, two-decimal string.
    pub purchase_costs: String,
    /// `price * transaction_pct / 100`, two-decimal string.
    pub transaction_fees: String,
    /// `price * mof_pct / 100`, two-decimal string.
    pub mof_fees: String,
    /// Base price plus all fees, two-decimal string.
    pub listing_price: String,
    /// `listing_price / num_units`, two-decimal string.
    pub price_per_unit: String,
    /// Number of investable units (at least 1).
    pub num_units: u32,
    pub features: Option<Value>,
    pub amenities: Option<Value>,
    pub why_invest: Option<Value>,
    pub image_urls: Option<Vec<String>>,
    pub governors_consent_url: Option<String>,
    pub deed_of_assignment_url: Option<String>,
    pub survey_plan_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Repository for property listings.
pub struct PropertyRepository<'a> {
    db: &'a AppDatabase,
}

impl<'a> PropertyRepository<'a> {
    pub fn new(db: &'a AppDatabase) -> Self {
        Self { db }
    }

    /// Persist a new listing in one atomic write transaction.
    ///
    /// Either the full record becomes visible or, on any error before
    /// commit, nothing does.
    pub fn create(&self, property: &StoredProperty) -> DbResult<()> {
        let json = serde_json::to_vec(property)?;

        let write_txn = self.db.raw().begin_write()?;
        {
            let mut table = write_txn.open_table(PROPERTIES)?;
            if table.get(property.id.as_str())?.is_some() {
                return Err(DbError::AlreadyExists(format!(
                    "Property {}",
                    property.id
                )));
            }
            table.insert(property.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get(&self, property_id: &str) -> DbResult<StoredProperty> {
        self.db
            .read_json(PROPERTIES, property_id)?
            .ok_or_else(|| DbError::NotFound(format!("Property {property_id}")))
    }

    pub fn list(&self) -> DbResult<Vec<StoredProperty>> {
        self.db.list_json(PROPERTIES)
    }
}
