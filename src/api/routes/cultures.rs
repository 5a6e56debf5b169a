//! Culture Routes
//!
//! Read-only access to the reference tables.
//!
//! - GET /api/v1/cultures - Harvest and crop coefficient tables
//! - GET /api/v1/cultures/:name - One culture, with coefficients picked
//!   for `relative_humidity` and `wind_speed` when given

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};

use crate::agro::{harvest_spec, kc_spec, AgroError, HARVEST_TABLE, KC_TABLE};
use crate::api::dto::{CultureQuery, CultureResponse, CulturesResponse};
use crate::api::error::ApiResult;

/// GET /api/v1/cultures
pub async fn list_cultures() -> (StatusCode, Json<CulturesResponse>) {
    (
        StatusCode::OK,
        Json(CulturesResponse {
            harvest: HARVEST_TABLE.to_vec(),
            crop_coefficients: KC_TABLE.to_vec(),
        }),
    )
}

/// GET /api/v1/cultures/:name
pub async fn get_culture(
    Path(name): Path<String>,
    Query(query): Query<CultureQuery>,
) -> ApiResult<(StatusCode, Json<CultureResponse>)> {
    let harvest = harvest_spec(&name).ok().copied();
    let crop_coefficients = kc_spec(&name).ok().copied();

    if harvest.is_none() && crop_coefficients.is_none() {
        return Err(AgroError::UnknownCulture(name).into());
    }

    let selected = crop_coefficients
        .map(|spec| spec.coefficients(query.relative_humidity, query.wind_speed))
        .transpose()?;

    Ok((
        StatusCode::OK,
        Json(CultureResponse {
            culture: name.trim().to_lowercase(),
            harvest,
            crop_coefficients,
            selected,
        }),
    ))
}
