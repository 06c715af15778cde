// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

pub mod attempts;
pub mod portfolio;
pub mod properties;
pub mod wallets;

pub use attempts::{AttemptRepository, AttemptStatus, ProvisioningAttempt, ProvisioningStep};
pub use portfolio::{PortfolioItem, PortfolioRepository};
pub use properties::{PropertyRepository, StoredProperty};
pub use wallets::{Currency, Network, StoredWallet, WalletRepository};
