// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Plotvault

//! Property listing API endpoints.
//!
//! Creation runs the full pricing pipeline: parse the monetary input,
//! compute the cost breakdown, persist the fully-derived record in one
//! atomic write, then emit `property.created` for downstream listeners.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;

use crate::{
    auth::RequireAdmin,
    error::ApiError,
    events::DomainEvent,
    models::{CreatePropertyRequest, CreatePropertyResponse, PropertyListResponse},
    pricing::{self, FeeRates},
    state::AppState,
    storage::{PropertyRepository, StoredProperty},
};

use super::db_error;

/// List all property listings.
#[utoipa::path(
    get,
    path = "/v1/properties",
    tag = "Properties",
    responses(
        (status = 200, description = "All property listings", body = PropertyListResponse)
    )
)]
pub async fn list_properties(
    State(state): State<AppState>,
) -> Result<Json<PropertyListResponse>, ApiError> {
    let repo = PropertyRepository::new(&state.db);
    let properties = repo.list().map_err(db_error)?;
    let total = properties.len();

    Ok(Json(PropertyListResponse { properties, total }))
}

/// Get a single property listing by ID.
#[utoipa::path(
    get,
    path = "/v1/properties/{property_id}",
    tag = "Properties",
    params(
        ("property_id" = String, Path, description = "Property ID")
    ),
    responses(
        (status = 200, description = "Property details", body = StoredProperty),
        (status = 404, description = "Property not found")
    )
)]
pub async fn get_property(
    State(state): State<AppState>,
    Path(property_id): Path<String>,
) -> Result<Json<StoredProperty>, ApiError> {
    let repo = PropertyRepository::new(&state.db);
    let property = repo
        .get(&property_id)
        .map_err(|_| ApiError::not_found("Property not found"))?;

    Ok(Json(property))
}

/// Create a property listing with fully computed unit economics.
///
/// The record is persisted in one atomic transaction; the creation event is
/// emitted only after the commit has returned, so listeners never see
/// uncommitted state.
#[utoipa::path(
    post,
    path = "/v1/properties",
    tag = "Properties",
    security(("bearer_auth" = [])),
    request_body = CreatePropertyRequest,
    responses(
        (status = 201, description = "Property created successfully", body = CreatePropertyResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 422, description = "Unparsable price or zero unit count")
    )
)]
pub async fn create_property(
    RequireAdmin(user): RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<CreatePropertyResponse>), ApiError> {
    let price = request
        .property_price
        .to_decimal()
        .map_err(|e| ApiError::unprocessable(e.to_string()))?;
    if price.is_sign_negative() {
        return Err(ApiError::unprocessable("property_price must not be negative"));
    }

    let defaults = FeeRates::default();
    let rates = FeeRates {
        purchase_pct: request.purchase_pct.unwrap_or(defaults.purchase_pct),
        transaction_pct: request
            .transaction_pct
            .unwrap_or(defaults.transaction_pct),
        mof_pct: request.mof_pct.unwrap_or(defaults.mof_pct),
    };
    let num_units = request.num_units.unwrap_or(1);

    let costs = pricing::compute_unit_costs(price, &rates);
    let per_unit = pricing::price_per_unit(costs.total(), num_units)
        .map_err(|e| ApiError::unprocessable(e.to_string()))?;

    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now();
    let property = StoredProperty {
        token_symbol: generate_symbol(&request.title, &id),
        id,
        title: request.title,
        property_price: costs.property_price,
        purchase_pct: rates.purchase_pct,
        transaction_pct: rates.transaction_pct,
        mof_pct: rates.mof_pct,
        purchase_costs: costs.purchase_costs,
        transaction_fees: costs.transaction_fees,
        mof_fees: costs.mof_fees,
        listing_price: costs.total_cost,
        price_per_unit: pricing::money_string(per_unit),
        num_units,
        features: request.features,
        amenities: request.amenities,
        why_invest: request.why_invest,
        image_urls: request.image_urls,
        governors_consent_url: request.governors_consent_url,
        deed_of_assignment_url: request.deed_of_assignment_url,
        survey_plan_url: request.survey_plan_url,
        created_at: now,
        updated_at: now,
    };

    let repo = PropertyRepository::new(&state.db);
    repo.create(&property).map_err(db_error)?;

    info!(
        property_id = %property.id,
        listing_price = %property.listing_price,
        created_by = %user.user_id,
        "property listing created"
    );

    // Commit has returned; listeners can safely act on the record.
    state
        .events
        .emit(DomainEvent::PropertyCreated(property.clone()));

    Ok((
        StatusCode::CREATED,
        Json(CreatePropertyResponse {
            property,
            message: "Property created successfully".to_string(),
        }),
    ))
}

/// Derive a ticker-style token symbol from the listing title and id:
/// first five characters of the squashed uppercase title plus the first
/// UUID segment.
fn generate_symbol(title: &str, id: &str) -> String {
    let squashed: String = title
        .split_whitespace()
        .collect::<String>()
        .to_uppercase()
        .chars()
        .take(5)
        .collect();
    let id_segment = id.split('-').next().unwrap_or_default().to_uppercase();
    format!("{squashed}{id_segment}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MoneyInput;
    use crate::testkit::{temp_state, test_admin, MockCustody};
    use serde_json::json;

    fn create_request(price: MoneyInput, num_units: Option<u32>) -> CreatePropertyRequest {
        CreatePropertyRequest {
            title: "Lekki Pearl Towers".to_string(),
            property_price: price,
            purchase_pct: None,
            transaction_pct: None,
            mof_pct: None,
            num_units,
            features: Some(json!(["24/7 power"])),
            amenities: None,
            why_invest: None,
            image_urls: None,
            governors_consent_url: None,
            deed_of_assignment_url: None,
            survey_plan_url: None,
        }
    }

    #[tokio::test]
    async fn create_computes_derived_fields_and_emits_post_commit() {
        let (_dir, state) = temp_state(MockCustody::default());
        let mut events = state.events.subscribe();

        let (status, Json(response)) = create_property(
            RequireAdmin(test_admin()),
            State(state.clone()),
            Json(create_request(MoneyInput::Number(100.0), Some(2))),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        let property = &response.property;
        assert_eq!(property.property_price, "100.00");
        assert_eq!(property.purchase_costs, "5.00");
        assert_eq!(property.transaction_fees, "5.00");
        assert_eq!(property.mof_fees, "3.00");
        assert_eq!(property.listing_price, "113.00");
        assert_eq!(property.price_per_unit, "56.50");
        assert!(property.token_symbol.starts_with("LEKKI"));
        assert!(property.features.is_some());
        assert!(property.amenities.is_none());

        // The event carries the committed record.
        let event = events.recv().await.unwrap();
        match event {
            DomainEvent::PropertyCreated(emitted) => assert_eq!(emitted.id, property.id),
        }

        // And the row is visible.
        let loaded = PropertyRepository::new(&state.db).get(&property.id).unwrap();
        assert_eq!(loaded.listing_price, "113.00");
    }

    #[tokio::test]
    async fn create_parses_loose_monetary_strings() {
        let (_dir, state) = temp_state(MockCustody::default());

        let (_, Json(response)) = create_property(
            RequireAdmin(test_admin()),
            State(state),
            Json(create_request(
                MoneyInput::Text("₦1,000.50".to_string()),
                None,
            )),
        )
        .await
        .unwrap();

        assert_eq!(response.property.property_price, "1000.50");
        // num_units absent defaults to 1, so per-unit equals the total.
        assert_eq!(
            response.property.price_per_unit,
            response.property.listing_price
        );
    }

    #[tokio::test]
    async fn unparsable_price_is_rejected_not_zeroed() {
        let (_dir, state) = temp_state(MockCustody::default());

        let err = create_property(
            RequireAdmin(test_admin()),
            State(state.clone()),
            Json(create_request(
                MoneyInput::Text("not a price".to_string()),
                None,
            )),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(PropertyRepository::new(&state.db)
            .list()
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn explicit_zero_units_fails_fast() {
        let (_dir, state) = temp_state(MockCustody::default());

        let err = create_property(
            RequireAdmin(test_admin()),
            State(state),
            Json(create_request(MoneyInput::Number(100.0), Some(0))),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn list_and_get_round_trip() {
        let (_dir, state) = temp_state(MockCustody::default());

        let (_, Json(created)) = create_property(
            RequireAdmin(test_admin()),
            State(state.clone()),
            Json(create_request(MoneyInput::Number(100.0), None)),
        )
        .await
        .unwrap();

        let Json(listed) = list_properties(State(state.clone())).await.unwrap();
        assert_eq!(listed.total, 1);

        let Json(fetched) = get_property(
            State(state.clone()),
            Path(created.property.id.clone()),
        )
        .await
        .unwrap();
        assert_eq!(fetched.id, created.property.id);

        let missing = get_property(State(state), Path("ghost".to_string()))
            .await
            .unwrap_err();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn symbol_squashes_title_and_appends_id_segment() {
        let symbol = generate_symbol(
            "Lekki Pearl Towers",
            "a1b2c3d4-0000-0000-0000-000000000000",
        );
        assert_eq!(symbol, "LEKKIA1B2C3D4");

        // Short titles keep whatever is available.
        assert_eq!(generate_symbol("Oak", "ff-1"), "OAKFF");
    }
}
