use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use super::service::{DiscoveryService, SearchRequest, SearchResponse};
use crate::error::AppError;
use crate::finance::{
    amortization_schedule, AmortizationError, AmortizationInput, AmortizationResult,
    ScheduleEntry,
};

/// Router exposing search and the financing calculator.
pub fn discovery_router(service: Arc<DiscoveryService>) -> Router {
    Router::new()
        .route("/api/v1/discovery/search", post(search_handler))
        .route("/api/v1/finance/amortization", post(amortization_handler))
        .with_state(service)
}

pub(crate) async fn search_handler(
    State(service): State<Arc<DiscoveryService>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let response = service.search(request).await?;
    Ok(Json(response))
}

#[derive(Debug, Clone, Deserialize)]
pub struct AmortizationRequest {
    /// Property price; the financed principal when no down payment is given.
    pub price: f64,
    #[serde(default)]
    pub down_payment_percent: f64,
    pub annual_rate_percent: f64,
    pub term_years: u32,
    #[serde(default)]
    pub include_schedule: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AmortizationResponse {
    pub principal: f64,
    #[serde(flatten)]
    pub result: AmortizationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<ScheduleEntry>>,
}

fn build_amortization(
    request: &AmortizationRequest,
) -> Result<AmortizationResponse, AmortizationError> {
    let input = AmortizationInput::from_price(
        request.price,
        request.down_payment_percent,
        request.annual_rate_percent,
        request.term_years,
    )?;
    let result = input.amortize()?;
    let schedule = if request.include_schedule {
        Some(amortization_schedule(&input)?)
    } else {
        None
    };

    Ok(AmortizationResponse {
        principal: input.principal,
        result,
        schedule,
    })
}

pub(crate) async fn amortization_handler(
    Json(request): Json<AmortizationRequest>,
) -> Result<Json<AmortizationResponse>, AppError> {
    Ok(Json(build_amortization(&request)?))
}
