// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! User wallet API endpoints: provisioning, retrieval, state toggles,
//! custody balance, and fiat display conversions.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::warn;
use utoipa::IntoParams;

use crate::{
    auth::Auth,
    error::ApiError,
    models::{CreateWalletResponse, WalletBalanceResponse, WalletEnvelope, WalletValueResponse},
    pricing::money_string,
    providers::custody::VaultAccount,
    providers::rates::convert,
    provisioning::{self, ProvisioningError},
    state::AppState,
    storage::{StoredWallet, WalletRepository},
};

use super::db_error;

/// CoinGecko asset id for the provisioned network asset.
const RATE_ASSET_ID: &str = "hedera-hashgraph";
const RATE_VS_CURRENCY: &str = "usd";
const DISPLAY_CURRENCY: &str = "NGN";

fn provisioning_error(e: ProvisioningError) -> ApiError {
    match e {
        ProvisioningError::Persistence(db) => db_error(db),
        external => ApiError::bad_gateway(external.to_string()),
    }
}

/// Get the authenticated user's wallet.
#[utoipa::path(
    get,
    path = "/v1/wallet",
    tag = "Wallet",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The user's wallet", body = WalletEnvelope),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found")
    )
)]
pub async fn get_wallet(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<WalletEnvelope>, ApiError> {
    let repo = WalletRepository::new(&state.db);
    let wallet = repo
        .get_by_owner(&user.user_id)
        .map_err(db_error)?
        .ok_or_else(|| ApiError::not_found("Wallet not found"))?;

    Ok(Json(WalletEnvelope::success(wallet)))
}

/// Provision a custodial wallet for the authenticated user.
///
/// Runs the vault → activation → address → persist chain against the
/// custody provider, then fires the wallet-ready email (best-effort).
#[utoipa::path(
    post,
    path = "/v1/wallet",
    tag = "Wallet",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Wallet provisioned", body = CreateWalletResponse),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "User already has a wallet"),
        (status = 502, description = "Custody provider failure")
    )
)]
pub async fn create_wallet(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<CreateWalletResponse>), ApiError> {
    let repo = WalletRepository::new(&state.db);
    if repo.get_by_owner(&user.user_id).map_err(db_error)?.is_some() {
        return Err(ApiError::conflict("User already has a wallet"));
    }

    let wallet = provisioning::provision_wallet(
        state.custody.as_ref(),
        &state.db,
        &state.provisioning,
        &user.user_id,
        &user.contact_email(),
    )
    .await
    .map_err(provisioning_error)?;

    state
        .mail
        .send_wallet_ready(user.contact_email(), wallet.address.clone());

    Ok((
        StatusCode::CREATED,
        Json(CreateWalletResponse {
            wallet,
            message: "Wallet provisioned successfully".to_string(),
        }),
    ))
}

/// Activate the authenticated user's wallet.
#[utoipa::path(
    post,
    path = "/v1/wallet/activate",
    tag = "Wallet",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Wallet activated", body = StoredWallet),
        (status = 404, description = "Wallet not found")
    )
)]
pub async fn activate_wallet(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<StoredWallet>, ApiError> {
    set_wallet_active(&state, &user.user_id, true).map(Json)
}

/// Deactivate the authenticated user's wallet.
#[utoipa::path(
    post,
    path = "/v1/wallet/deactivate",
    tag = "Wallet",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Wallet deactivated", body = StoredWallet),
        (status = 404, description = "Wallet not found")
    )
)]
pub async fn deactivate_wallet(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<StoredWallet>, ApiError> {
    set_wallet_active(&state, &user.user_id, false).map(Json)
}

fn set_wallet_active(
    state: &AppState,
    user_id: &str,
    is_active: bool,
) -> Result<StoredWallet, ApiError> {
    let repo = WalletRepository::new(&state.db);
    let wallet = repo
        .get_by_owner(user_id)
        .map_err(db_error)?
        .ok_or_else(|| ApiError::not_found("Wallet not found"))?;

    repo.set_active(&wallet.wallet_id, is_active).map_err(db_error)
}

/// Read the wallet's balance from the custody provider.
///
/// Custody is the source of truth; the stored balance is only a display
/// cache and is refreshed here.
#[utoipa::path(
    get,
    path = "/v1/wallet/balance",
    tag = "Wallet",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current custody balance", body = WalletBalanceResponse),
        (status = 404, description = "Wallet not found"),
        (status = 502, description = "Custody provider failure")
    )
)]
pub async fn wallet_balance(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<WalletBalanceResponse>, ApiError> {
    let repo = WalletRepository::new(&state.db);
    let wallet = repo
        .get_by_owner(&user.user_id)
        .map_err(db_error)?
        .ok_or_else(|| ApiError::not_found("Wallet not found"))?;

    let vault = state
        .custody
        .get_vault(&wallet.vault_id)
        .await
        .map_err(|e| ApiError::bad_gateway(format!("get_vault failed: {e}")))?;

    let balance = vault_asset_balance(&vault, &wallet.asset).ok_or_else(|| {
        ApiError::bad_gateway(format!(
            "asset {} not present on vault {}",
            wallet.asset, wallet.vault_id
        ))
    })?;

    if let Err(e) = repo.update_cached_balance(&wallet.wallet_id, balance) {
        warn!(error = %e, wallet_id = %wallet.wallet_id, "failed to refresh cached balance");
    }

    Ok(Json(WalletBalanceResponse {
        wallet_id: wallet.wallet_id,
        asset: wallet.asset,
        balance,
    }))
}

/// Query params for the display conversion endpoint.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct WalletValueQuery {
    /// Crypto amount to convert; defaults to the cached wallet balance.
    pub amount: Option<Decimal>,
}

/// Convert a crypto amount into USD and NGN display values.
///
/// Two independent lookups (crypto→USD, USD→NGN); no retries, no caching.
#[utoipa::path(
    get,
    path = "/v1/wallet/value",
    tag = "Wallet",
    security(("bearer_auth" = [])),
    params(WalletValueQuery),
    responses(
        (status = 200, description = "Fiat display values", body = WalletValueResponse),
        (status = 404, description = "Wallet not found"),
        (status = 502, description = "Price feed failure")
    )
)]
pub async fn wallet_value(
    Auth(user): Auth,
    State(state): State<AppState>,
    Query(query): Query<WalletValueQuery>,
) -> Result<Json<WalletValueResponse>, ApiError> {
    let repo = WalletRepository::new(&state.db);
    let wallet = repo
        .get_by_owner(&user.user_id)
        .map_err(db_error)?
        .ok_or_else(|| ApiError::not_found("Wallet not found"))?;

    let amount = query.amount.unwrap_or(wallet.balance);

    let usd_rate = state
        .crypto_rates
        .get_rate(RATE_ASSET_ID, RATE_VS_CURRENCY)
        .await
        .map_err(|e| ApiError::bad_gateway(format!("crypto rate lookup failed: {e}")))?;

    let ngn_rate = state
        .forex_rates
        .get_rate("USD", DISPLAY_CURRENCY)
        .await
        .map_err(|e| ApiError::bad_gateway(format!("forex rate lookup failed: {e}")))?;

    let usd_value = convert(amount, usd_rate);
    let ngn_value = convert(usd_value, ngn_rate);

    Ok(Json(WalletValueResponse {
        amount,
        usd_rate,
        ngn_rate,
        usd_value: money_string(usd_value),
        ngn_value: money_string(ngn_value),
    }))
}

/// Balance of one asset on a vault, parsed from the provider's decimal
/// string. Missing/blank totals count as zero.
fn vault_asset_balance(vault: &VaultAccount, asset_id: &str) -> Option<Decimal> {
    let entry = vault.assets.iter().find(|asset| asset.id == asset_id)?;
    let raw = entry.total.as_deref().unwrap_or("0").trim();
    if raw.is_empty() {
        return Some(Decimal::ZERO);
    }
    Decimal::from_str(raw).ok()
}
