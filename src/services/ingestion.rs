use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    db::ReviewStore,
    errors::AppError,
    models::review::{CreateReviewInput, NewReview, Review},
    services::rating::RatingRefresher,
};

/// Write path for reviews: validate, enforce one review per author and spot,
/// persist, then refresh the spot's rating stats in the background.
#[derive(Clone)]
pub struct ReviewIngestionService {
    reviews: Arc<dyn ReviewStore>,
    refresher: RatingRefresher,
}

impl ReviewIngestionService {
    pub fn new(reviews: Arc<dyn ReviewStore>, refresher: RatingRefresher) -> Self {
        Self { reviews, refresher }
    }

    /// `parent` bounds the background refresh; the call itself never waits on it.
    pub async fn create_review(
        &self,
        author_id: &str,
        input: CreateReviewInput,
        parent: &CancellationToken,
    ) -> Result<Review, AppError> {
        if author_id.trim().is_empty() {
            return Err(AppError::Unauthorized("Missing author identity".into()));
        }

        let new_review = NewReview::from_input(author_id, input)?;

        // Not atomic with the insert; the store's unique index covers the race.
        if self
            .reviews
            .review_exists(&new_review.user_id, &new_review.spot_id)
            .await?
        {
            return Err(AppError::AlreadyExists(format!(
                "User {} has already reviewed spot {}",
                new_review.user_id, new_review.spot_id
            )));
        }

        self.reviews.create_review(&new_review).await?;

        tracing::info!(
            "Review {} created for spot {} by {}",
            new_review.id,
            new_review.spot_id,
            new_review.user_id
        );

        // Detached: the outcome only reaches the failure sink.
        let _ = self
            .refresher
            .spawn(new_review.spot_id.clone(), parent.child_token());

        // The row is committed from here on; a failed read-back must not look
        // like a failed write, since a retry by the caller will hit AlreadyExists.
        match self.reviews.get_review(new_review.id).await {
            Ok(Some(review)) => Ok(review),
            Ok(None) => {
                tracing::error!(
                    review_id = %new_review.id,
                    spot_id = %new_review.spot_id,
                    "Review stored but missing on read-back"
                );
                Err(AppError::InternalError)
            }
            Err(e) => {
                tracing::error!(
                    review_id = %new_review.id,
                    spot_id = %new_review.spot_id,
                    "Review stored but read-back failed: {}",
                    e
                );
                Err(AppError::InternalError)
            }
        }
    }
}
