//! Order submission and payment-location endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use domain::{BillingCountry, OrderRequest, TransactionLedger};
use fulfillment::{
    ErrorEnvelope, InMemoryOrchestrator, InMemoryPaymentGateway, InMemoryShippingService,
    PaymentGateway, UserProfile,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
///
/// Keeps handles to the in-memory collaborators so tests and diagnostics
/// can reach their knobs and counters.
pub struct AppState {
    pub orchestrator: InMemoryOrchestrator,
    pub gateway: InMemoryPaymentGateway,
    pub shipping: InMemoryShippingService,
}

// -- Response types --

#[derive(Serialize)]
pub struct SubmitOrderResponse {
    pub transaction: TransactionLedger,
    pub user: Option<UserProfile>,
    pub error: ErrorEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct LocationsQuery {
    pub country: String,
}

#[derive(Serialize)]
pub struct LocationResponse {
    pub id: String,
    pub name: String,
    pub capabilities: Vec<String>,
}

// -- Handlers --

/// POST /orders/submit — drive a final order through fulfillment.
///
/// Hard failures before capture come back as an error envelope with a
/// matching HTTP status. Once money has been taken the response is the
/// accumulated transaction/user payload, with the envelope flagging any
/// hard or soft failure that occurred along the way.
#[tracing::instrument(skip(state, order))]
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(order): Json<OrderRequest>,
) -> Result<Json<SubmitOrderResponse>, ApiError> {
    let outcome = state.orchestrator.submit_final_order(order).await?;

    Ok(Json(SubmitOrderResponse {
        transaction: outcome.transaction,
        user: outcome.user,
        error: outcome.error,
    }))
}

/// GET /payment/locations?country= — list processor locations for a
/// billing country, for diagnostics.
#[tracing::instrument(skip(state))]
pub async fn locations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocationsQuery>,
) -> Result<Json<Vec<LocationResponse>>, ApiError> {
    let country = parse_country(&query.country)?;
    let locations = state.gateway.list_locations(country).await?;

    Ok(Json(
        locations
            .into_iter()
            .map(|l| LocationResponse {
                id: l.id,
                name: l.name,
                capabilities: l.capabilities,
            })
            .collect(),
    ))
}

fn parse_country(code: &str) -> Result<BillingCountry, ApiError> {
    match code {
        "US" => Ok(BillingCountry::UnitedStates),
        "JP" => Ok(BillingCountry::Japan),
        other => Err(ApiError::BadRequest(format!(
            "Unknown billing country: {other}"
        ))),
    }
}
