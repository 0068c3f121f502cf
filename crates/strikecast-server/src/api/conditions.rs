//! Current-conditions read endpoints.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use strikecast_core::{Domain, ScoredReading};

use super::{parse_domain, ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct ConditionsResponse {
    pub domain: Domain,
    pub last_cycle_completed_at: Option<DateTime<Utc>>,
    pub locations: BTreeMap<String, ScoredReading>,
}

/// `GET /api/conditions/{domain}`: latest scored readings for a domain.
///
/// Locations never successfully refreshed are simply absent from the map.
pub async fn list_for_domain(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<ConditionsResponse>, ApiError> {
    let domain = parse_domain(&domain)?;
    Ok(Json(ConditionsResponse {
        domain,
        last_cycle_completed_at: state.service.last_cycle_completed_at(),
        locations: state.service.current_conditions(domain),
    }))
}

/// `GET /api/locations/{id}`: one location's latest scored reading.
///
/// A location with no cache entry yet is 404, never an empty success.
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ScoredReading>, ApiError> {
    if state.service.location(&id).is_none() {
        return Err(ApiError::not_found(format!("unknown location '{id}'")));
    }
    state
        .service
        .location_conditions(&id)
        .map(|entry| Json((*entry).clone()))
        .ok_or_else(|| ApiError::not_found(format!("no conditions recorded yet for '{id}'")))
}
