use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    errors::AppError,
    models::{
        pagination::{Page, Paginated},
        spot::{Spot, SpotFilter, SpotHit},
    },
    services::SpotSearchParams,
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSpotsQuery {
    pub category: Option<String>,
    pub country_code: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSpotsQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub country_code: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

pub async fn get_spot_handler(
    Path(spot_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Spot>, (StatusCode, String)> {
    let spot = state.spot_search.get_spot(&spot_id).await.map_err(|e| {
        tracing::error!("Error retrieving spot {}: {}", spot_id, e);
        e.to_response()
    })?;

    Ok(Json(spot))
}

pub async fn list_spots_handler(
    Query(query): Query<ListSpotsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Paginated<Spot>>, (StatusCode, String)> {
    let filter = SpotFilter::new(query.category, query.country_code);
    let spots = state
        .spot_search
        .list_spots(filter, Page::new(query.page, query.page_size))
        .await
        .map_err(|e| {
            tracing::error!("Error listing spots: {}", e);
            e.to_response()
        })?;

    Ok(Json(spots))
}

pub async fn nearby_spots_handler(
    Query(query): Query<NearbyQuery>,
    State(state): State<AppState>,
) -> Result<Json<Paginated<SpotHit>>, (StatusCode, String)> {
    let (Some(lat), Some(lng), Some(radius_km)) = (query.lat, query.lng, query.radius_km) else {
        return Err(
            AppError::InvalidInput("lat, lng and radiusKm are required".into()).to_response(),
        );
    };

    let spots = state
        .spot_search
        .search_by_radius(lat, lng, radius_km, Page::new(query.page, query.page_size))
        .await
        .map_err(|e| {
            tracing::error!("Error searching spots near ({}, {}): {}", lat, lng, e);
            e.to_response()
        })?;

    tracing::info!(
        "Found {} spots within {}km of ({}, {})",
        spots.total_count,
        radius_km,
        lat,
        lng
    );
    Ok(Json(spots))
}

pub async fn search_spots_handler(
    Query(query): Query<SearchSpotsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Paginated<SpotHit>>, (StatusCode, String)> {
    let page = Page::new(query.page, query.page_size);
    let params = SpotSearchParams {
        query: query.q,
        category: query.category,
        country_code: query.country_code,
        lat: query.lat,
        lng: query.lng,
        radius_km: query.radius_km,
    };

    let spots = state.spot_search.search(params, page).await.map_err(|e| {
        tracing::error!("Error searching spots: {}", e);
        e.to_response()
    })?;

    Ok(Json(spots))
}
