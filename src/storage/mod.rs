// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! # Persistence Module
//!
//! Embedded ACID storage via redb, behind per-entity repositories.
//!
//! ## Layout
//!
//! ```text
//! {DATA_DIR}/plotvault.redb
//!   properties             property_id → StoredProperty
//!   wallets                wallet_id   → StoredWallet
//!   wallet_owners          user_id     → wallet_id
//!   portfolio              user|property → PortfolioItem
//!   provisioning_attempts  attempt_id  → ProvisioningAttempt
//! ```
//!
//! Each repository write commits a single redb write transaction; that
//! commit is the only atomicity guarantee the orchestrators depend on.

pub mod db;
pub mod repository;

pub use db::{AppDatabase, DbError, DbResult};
pub use repository::{
    AttemptRepository, AttemptStatus, Currency, Network, PortfolioItem, PortfolioRepository,
    PropertyRepository, ProvisioningAttempt, ProvisioningStep, StoredProperty, StoredWallet,
    WalletRepository,
};
