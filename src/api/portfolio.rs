// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! Portfolio API: the authenticated user's property holdings.

use axum::{extract::State, Json};

use crate::{
    auth::Auth, error::ApiError, models::PortfolioListResponse, state::AppState,
    storage::PortfolioRepository,
};

use super::db_error;

/// List the authenticated user's holdings.
#[utoipa::path(
    get,
    path = "/v1/portfolio",
    tag = "Portfolio",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The user's holdings", body = PortfolioListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_portfolio(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<PortfolioListResponse>, ApiError> {
    let repo = PortfolioRepository::new(&state.db);
    let items = repo.list_by_user(&user.user_id).map_err(db_error)?;
    let total = items.len();

    Ok(Json(PortfolioListResponse { items, total }))
}
