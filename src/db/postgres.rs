use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions};
use uuid::Uuid;

use super::{ReviewStore, SpotStore, review, spot};
use crate::{
    config::Config,
    errors::AppError,
    geo::RadiusFilter,
    models::{
        pagination::Page,
        review::{NewReview, Review, UserReview},
        spot::{Spot, SpotFilter, SpotHit, SpotTextQuery},
    },
};

/// Postgres-backed review and spot store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect to Postgres: {}", e)))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to run migrations: {}", e)))?;

        tracing::info!("Connected to Postgres and applied migrations");

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn create_review(&self, new_review: &NewReview) -> Result<(), AppError> {
        review::create_review(new_review, &self.pool).await
    }

    async fn get_review(&self, id: Uuid) -> Result<Option<Review>, AppError> {
        review::get_review_by_id(id, &self.pool).await
    }

    async fn review_exists(&self, user_id: &str, spot_id: &str) -> Result<bool, AppError> {
        review::review_exists(user_id, spot_id, &self.pool).await
    }

    async fn spot_reviews(
        &self,
        spot_id: &str,
        page: Page,
    ) -> Result<(Vec<Review>, i64), AppError> {
        review::get_spot_reviews(spot_id, page, &self.pool).await
    }

    async fn user_reviews(
        &self,
        user_id: &str,
        page: Page,
    ) -> Result<(Vec<UserReview>, i64), AppError> {
        review::get_user_reviews(user_id, page, &self.pool).await
    }

    async fn rating_counts(&self, spot_id: &str) -> Result<Vec<(i16, i64)>, AppError> {
        review::get_rating_counts(spot_id, &self.pool).await
    }
}

#[async_trait]
impl SpotStore for PgStore {
    async fn get_spot(&self, id: &str) -> Result<Option<Spot>, AppError> {
        spot::get_spot_by_id(id, &self.pool).await
    }

    async fn list_spots(
        &self,
        filter: &SpotFilter,
        page: Page,
    ) -> Result<(Vec<Spot>, i64), AppError> {
        spot::list_spots(filter, page, &self.pool).await
    }

    async fn search_by_radius(
        &self,
        radius: &RadiusFilter,
        page: Page,
    ) -> Result<(Vec<SpotHit>, i64), AppError> {
        spot::search_spots_by_radius(radius, page, &self.pool).await
    }

    async fn search_text(
        &self,
        query: &SpotTextQuery,
        page: Page,
    ) -> Result<(Vec<SpotHit>, i64), AppError> {
        spot::search_spots_by_text(query, page, &self.pool).await
    }

    async fn update_rating_stats(
        &self,
        spot_id: &str,
        average_rating: f64,
        review_count: i64,
    ) -> Result<(), AppError> {
        spot::update_spot_rating_stats(spot_id, average_rating, review_count, &self.pool).await
    }
}
