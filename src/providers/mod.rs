// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! External provider clients: custody, price feeds, mail.

pub mod custody;
pub mod mail;
pub mod rates;

pub use custody::{AssetActivation, CustodyClient, CustodyError, CustodyProvider, VaultAccount};
pub use mail::{MailClient, MailError};
pub use rates::{convert, CryptoRateClient, ForexRateClient, RateError};
