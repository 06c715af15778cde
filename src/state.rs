// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

use std::sync::Arc;

use crate::auth::AuthConfig;
use crate::events::EventBus;
use crate::providers::custody::CustodyProvider;
use crate::providers::{CryptoRateClient, ForexRateClient, MailClient};
use crate::provisioning::ProvisioningConfig;
use crate::storage::AppDatabase;

/// Shared application state handed to every handler.
///
/// Everything inside is either immutable or internally synchronized, so the
/// state clones freely per request.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<AppDatabase>,
    pub custody: Arc<dyn CustodyProvider>,
    pub crypto_rates: Arc<CryptoRateClient>,
    pub forex_rates: Arc<ForexRateClient>,
    pub mail: Arc<MailClient>,
    pub events: EventBus,
    pub auth: AuthConfig,
    pub provisioning: Arc<ProvisioningConfig>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: AppDatabase,
        custody: Arc<dyn CustodyProvider>,
        crypto_rates: CryptoRateClient,
        forex_rates: ForexRateClient,
        mail: MailClient,
        events: EventBus,
        auth: AuthConfig,
        provisioning: ProvisioningConfig,
    ) -> Self {
        Self {
            db: Arc::new(db),
            custody,
            crypto_rates: Arc::new(crypto_rates),
            forex_rates: Arc::new(forex_rates),
            mail: Arc::new(mail),
            events,
            auth,
            provisioning: Arc::new(provisioning),
        }
    }
}
