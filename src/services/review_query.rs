use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    db::ReviewStore,
    errors::AppError,
    models::{
        pagination::{Page, Paginated},
        rating::RatingDistribution,
        review::{Review, UserReview},
    },
    services::rating::RatingAggregator,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotReviews {
    #[serde(flatten)]
    pub reviews: Paginated<Review>,
    pub rating_distribution: RatingDistribution,
}

#[derive(Clone)]
pub struct ReviewQueryService {
    reviews: Arc<dyn ReviewStore>,
    aggregator: RatingAggregator,
}

impl ReviewQueryService {
    pub fn new(reviews: Arc<dyn ReviewStore>, aggregator: RatingAggregator) -> Self {
        Self {
            reviews,
            aggregator,
        }
    }

    /// A page of the spot's reviews plus a distribution read fresh from the
    /// review rows rather than the spot's denormalized fields.
    pub async fn spot_reviews(&self, spot_id: &str, page: Page) -> Result<SpotReviews, AppError> {
        let spot_id = spot_id.trim();
        if spot_id.is_empty() {
            return Err(AppError::InvalidInput("Spot ID is required".into()));
        }

        let ((reviews, total_count), rating_distribution) = tokio::try_join!(
            self.reviews.spot_reviews(spot_id, page),
            self.aggregator.distribution(spot_id),
        )?;

        Ok(SpotReviews {
            reviews: Paginated::new(reviews, total_count, page),
            rating_distribution,
        })
    }

    pub async fn user_reviews(
        &self,
        user_id: &str,
        page: Page,
    ) -> Result<Paginated<UserReview>, AppError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::InvalidInput("User ID is required".into()));
        }

        let (reviews, total_count) = self.reviews.user_reviews(user_id, page).await?;

        Ok(Paginated::new(reviews, total_count, page))
    }
}
