// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::providers::CustodyClient;
use crate::state::AppState;
use crate::storage::PropertyRepository;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Embedded database readability.
    pub database: String,
    /// Custody provider configuration status.
    pub custody: String,
    /// Mail transport configuration status.
    pub mail: String,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Check that the database answers a read.
fn check_database(state: &AppState) -> String {
    match PropertyRepository::new(&state.db).list() {
        Ok(_) => "ok".to_string(),
        Err(_) => "unavailable".to_string(),
    }
}

/// Health check endpoint handler.
///
/// Returns 200 if all hard checks pass, 503 otherwise. Mail is optional
/// and never degrades the service.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is unhealthy", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let database = check_database(&state);
    let custody = if CustodyClient::is_configured() {
        "ok".to_string()
    } else {
        "unconfigured".to_string()
    };
    let mail = if state.mail.is_configured() {
        "ok".to_string()
    } else {
        "disabled".to_string()
    };

    let all_ok = database == "ok";

    let response = ReadyResponse {
        status: if all_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            database,
            custody,
            mail,
        },
    };

    let status = if all_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe handler.
///
/// Returns 200 only if all dependencies are available.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    health(state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{temp_state, MockCustody};

    #[tokio::test]
    async fn health_is_ok_with_working_database() {
        let (_dir, state) = temp_state(MockCustody::default());
        let (status, Json(response)) = health(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.status, "ok");
        assert_eq!(response.checks.database, "ok");
    }

    #[tokio::test]
    async fn liveness_always_ok() {
        let Json(response) = liveness().await;
        assert_eq!(response.status, "ok");
    }
}
