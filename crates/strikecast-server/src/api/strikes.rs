//! Active-strike read endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use strikecast_core::Domain;
use strikecast_engine::ActiveStrike;

use super::{parse_domain, ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct StrikesResponse {
    pub domain: Domain,
    pub strikes: Vec<ActiveStrike>,
}

/// `GET /api/strikes/{domain}`: open strike events, best score first.
pub async fn list_active(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<StrikesResponse>, ApiError> {
    let domain = parse_domain(&domain)?;
    Ok(Json(StrikesResponse {
        domain,
        strikes: state.service.active_strikes(domain),
    }))
}
