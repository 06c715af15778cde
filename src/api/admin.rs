// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! Admin API: reconciliation surface for wallet provisioning.
//!
//! A provisioning run that fails after vault creation leaves a custody
//! vault with no local wallet row. The failed attempt records listed here
//! carry the orphaned vault ids so operators can reconcile them manually.

use axum::{extract::State, Json};

use crate::{
    auth::RequireAdmin, error::ApiError, models::AttemptListResponse, state::AppState,
    storage::AttemptRepository,
};

use super::db_error;

/// List failed provisioning attempts, newest first.
#[utoipa::path(
    get,
    path = "/v1/admin/provisioning-attempts",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Failed provisioning attempts", body = AttemptListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only")
    )
)]
pub async fn list_failed_attempts(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<AttemptListResponse>, ApiError> {
    let repo = AttemptRepository::new(&state.db);
    let attempts = repo.list_failed().map_err(db_error)?;
    let total = attempts.len();

    Ok(Json(AttemptListResponse { attempts, total }))
}
