use std::sync::Arc;

use crate::{
    db::SpotStore,
    errors::AppError,
    geo::RadiusFilter,
    models::{
        pagination::{Page, Paginated},
        spot::{Spot, SpotFilter, SpotHit, SpotTextQuery},
    },
};

/// Text search parameters. `lat`, `lng` and `radius_km` go together.
#[derive(Debug, Clone, Default)]
pub struct SpotSearchParams {
    pub query: Option<String>,
    pub category: Option<String>,
    pub country_code: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
}

impl SpotSearchParams {
    pub fn into_query(self) -> Result<SpotTextQuery, AppError> {
        let text = self
            .query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AppError::InvalidInput("Search query is required".into()))?;

        let radius = match (self.lat, self.lng, self.radius_km) {
            (Some(lat), Some(lng), Some(radius_km)) => Some(RadiusFilter::new(lat, lng, radius_km)?),
            (None, None, None) => None,
            _ => {
                return Err(AppError::InvalidInput(
                    "lat, lng and radiusKm must be supplied together".into(),
                ));
            }
        };

        Ok(SpotTextQuery {
            text,
            filter: SpotFilter::new(self.category, self.country_code),
            radius,
        })
    }
}

#[derive(Clone)]
pub struct SpotSearchService {
    spots: Arc<dyn SpotStore>,
}

impl SpotSearchService {
    pub fn new(spots: Arc<dyn SpotStore>) -> Self {
        Self { spots }
    }

    pub async fn get_spot(&self, spot_id: &str) -> Result<Spot, AppError> {
        let spot_id = spot_id.trim();
        if spot_id.is_empty() {
            return Err(AppError::InvalidInput("Spot ID is required".into()));
        }

        self.spots
            .get_spot(spot_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Spot {} not found", spot_id)))
    }

    pub async fn list_spots(
        &self,
        filter: SpotFilter,
        page: Page,
    ) -> Result<Paginated<Spot>, AppError> {
        let (spots, total_count) = self.spots.list_spots(&filter, page).await?;
        Ok(Paginated::new(spots, total_count, page))
    }

    /// Spots within `radius_km` of the point, nearest first. The boundary is inclusive.
    pub async fn search_by_radius(
        &self,
        lat: f64,
        lng: f64,
        radius_km: f64,
        page: Page,
    ) -> Result<Paginated<SpotHit>, AppError> {
        let radius = RadiusFilter::new(lat, lng, radius_km)?;
        let (spots, total_count) = self.spots.search_by_radius(&radius, page).await?;

        tracing::debug!(
            "Radius search ({}, {}) r={}km matched {} spots",
            lat,
            lng,
            radius_km,
            total_count
        );

        Ok(Paginated::new(spots, total_count, page))
    }

    pub async fn search(
        &self,
        params: SpotSearchParams,
        page: Page,
    ) -> Result<Paginated<SpotHit>, AppError> {
        let query = params.into_query()?;
        let (spots, total_count) = self.spots.search_text(&query, page).await?;
        Ok(Paginated::new(spots, total_count, page))
    }
}
