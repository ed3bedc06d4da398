pub mod memory;
pub mod postgres;
pub mod review;
pub mod spot;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    errors::AppError,
    geo::RadiusFilter,
    models::{
        pagination::Page,
        review::{NewReview, Review, UserReview},
        spot::{Spot, SpotFilter, SpotHit, SpotTextQuery},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence for review rows.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Fails with `AlreadyExists` if the author already reviewed the spot.
    async fn create_review(&self, review: &NewReview) -> Result<(), AppError>;

    async fn get_review(&self, id: Uuid) -> Result<Option<Review>, AppError>;

    async fn review_exists(&self, user_id: &str, spot_id: &str) -> Result<bool, AppError>;

    /// Newest first, with the total count for the spot.
    async fn spot_reviews(&self, spot_id: &str, page: Page)
    -> Result<(Vec<Review>, i64), AppError>;

    /// Newest first, joined with spot names, with the total count for the author.
    async fn user_reviews(
        &self,
        user_id: &str,
        page: Page,
    ) -> Result<(Vec<UserReview>, i64), AppError>;

    /// `(rating, count)` pairs for the spot's reviews.
    async fn rating_counts(&self, spot_id: &str) -> Result<Vec<(i16, i64)>, AppError>;
}

/// Persistence for spot rows.
#[async_trait]
pub trait SpotStore: Send + Sync {
    async fn get_spot(&self, id: &str) -> Result<Option<Spot>, AppError>;

    async fn list_spots(&self, filter: &SpotFilter, page: Page)
    -> Result<(Vec<Spot>, i64), AppError>;

    /// Spots within the circle, nearest first.
    async fn search_by_radius(
        &self,
        radius: &RadiusFilter,
        page: Page,
    ) -> Result<(Vec<SpotHit>, i64), AppError>;

    /// Spots matching the text, exact and prefix name matches first.
    async fn search_text(
        &self,
        query: &SpotTextQuery,
        page: Page,
    ) -> Result<(Vec<SpotHit>, i64), AppError>;

    /// Overwrites `average_rating` and `review_count`.
    async fn update_rating_stats(
        &self,
        spot_id: &str,
        average_rating: f64,
        review_count: i64,
    ) -> Result<(), AppError>;
}
