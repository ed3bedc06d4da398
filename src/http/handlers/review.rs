use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    auth::AuthClaims,
    models::{
        pagination::{PageQuery, Paginated},
        rating::RatingDistribution,
        review::{CreateReviewInput, RatingAspects, Review, UserReview},
    },
    services::SpotReviews,
    state::AppState,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewPayload {
    pub rating: f64,
    pub comment: Option<String>,
    pub rating_aspects: Option<RatingAspects>,
}

pub async fn create_review_handler(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(spot_id): Path<String>,
    Json(payload): Json<CreateReviewPayload>,
) -> Result<(StatusCode, Json<Review>), (StatusCode, String)> {
    let input = CreateReviewInput {
        spot_id,
        rating: payload.rating,
        comment: payload.comment,
        rating_aspects: payload.rating_aspects,
    };

    let review = state
        .ingestion
        .create_review(&claims.sub, input, &state.shutdown)
        .await
        .map_err(|e| {
            tracing::error!("Error creating review: {}", e);
            e.to_response()
        })?;

    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn get_spot_reviews_handler(
    Path(spot_id): Path<String>,
    Query(query): Query<PageQuery>,
    State(state): State<AppState>,
) -> Result<Json<SpotReviews>, (StatusCode, String)> {
    let reviews = state
        .review_queries
        .spot_reviews(&spot_id, query.normalize())
        .await
        .map_err(|e| {
            tracing::error!("Error retrieving reviews for spot {}: {}", spot_id, e);
            e.to_response()
        })?;

    tracing::info!(
        "Retrieved {} of {} reviews for spot {}",
        reviews.reviews.items.len(),
        reviews.reviews.total_count,
        spot_id
    );
    Ok(Json(reviews))
}

pub async fn get_user_reviews_handler(
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
    State(state): State<AppState>,
) -> Result<Json<Paginated<UserReview>>, (StatusCode, String)> {
    let reviews = state
        .review_queries
        .user_reviews(&user_id, query.normalize())
        .await
        .map_err(|e| {
            tracing::error!("Error retrieving reviews by user {}: {}", user_id, e);
            e.to_response()
        })?;

    Ok(Json(reviews))
}

pub async fn get_my_reviews_handler(
    AuthClaims(claims): AuthClaims,
    Query(query): Query<PageQuery>,
    State(state): State<AppState>,
) -> Result<Json<Paginated<UserReview>>, (StatusCode, String)> {
    let reviews = state
        .review_queries
        .user_reviews(&claims.sub, query.normalize())
        .await
        .map_err(|e| {
            tracing::error!("Error retrieving own reviews: {}", e);
            e.to_response()
        })?;

    Ok(Json(reviews))
}

pub async fn refresh_spot_rating_handler(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(spot_id): Path<String>,
) -> Result<Json<RatingDistribution>, (StatusCode, String)> {
    let distribution = state.aggregator.recompute(&spot_id).await.map_err(|e| {
        tracing::error!("Error recomputing rating for spot {}: {}", spot_id, e);
        e.to_response()
    })?;

    tracing::info!(
        "Rating for spot {} recomputed by {}: {} over {} reviews",
        spot_id,
        claims.sub,
        distribution.average,
        distribution.total
    );
    Ok(Json(distribution))
}
