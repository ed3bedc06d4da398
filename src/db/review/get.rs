use sqlx::PgPool;
use uuid::Uuid;

use super::REVIEW_COLUMNS;
use crate::{
    errors::AppError,
    models::{
        pagination::Page,
        review::{Review, UserReview},
    },
};

pub async fn get_review_by_id(id: Uuid, postgres: &PgPool) -> Result<Option<Review>, AppError> {
    let query = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");

    sqlx::query_as::<_, Review>(&query)
        .bind(id)
        .fetch_optional(postgres)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch review {}: {}", id, e)))
}

pub async fn review_exists(
    user_id: &str,
    spot_id: &str,
    postgres: &PgPool,
) -> Result<bool, AppError> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM reviews WHERE user_id = $1 AND spot_id = $2)",
    )
    .bind(user_id)
    .bind(spot_id)
    .fetch_one(postgres)
    .await
    .map_err(|e| AppError::DatabaseError(format!("Failed to check existing review: {}", e)))
}

pub async fn get_spot_reviews(
    spot_id: &str,
    page: Page,
    postgres: &PgPool,
) -> Result<(Vec<Review>, i64), AppError> {
    let reviews_query = format!(
        "SELECT {REVIEW_COLUMNS}
            FROM reviews
            WHERE spot_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3"
    );

    let (reviews, total) = tokio::try_join!(
        sqlx::query_as::<_, Review>(&reviews_query)
            .bind(spot_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(postgres),
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews WHERE spot_id = $1")
            .bind(spot_id)
            .fetch_one(postgres),
    )
    .map_err(|e| AppError::DatabaseError(format!("Failed to fetch spot reviews: {}", e)))?;

    Ok((reviews, total))
}

pub async fn get_user_reviews(
    user_id: &str,
    page: Page,
    postgres: &PgPool,
) -> Result<(Vec<UserReview>, i64), AppError> {
    let (reviews, total) = tokio::try_join!(
        sqlx::query_as::<_, UserReview>(
            "SELECT r.id, r.spot_id, r.user_id, r.rating, r.comment, r.rating_aspects,
                r.created_at, r.updated_at, s.name AS spot_name
            FROM reviews r
            JOIN spots s ON s.id = r.spot_id
            WHERE r.user_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(postgres),
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)
            FROM reviews r
            JOIN spots s ON s.id = r.spot_id
            WHERE r.user_id = $1",
        )
        .bind(user_id)
        .fetch_one(postgres),
    )
    .map_err(|e| AppError::DatabaseError(format!("Failed to fetch user reviews: {}", e)))?;

    Ok((reviews, total))
}

/// `(rating, count)` for every star value that has at least one review.
pub async fn get_rating_counts(
    spot_id: &str,
    postgres: &PgPool,
) -> Result<Vec<(i16, i64)>, AppError> {
    sqlx::query_as::<_, (i16, i64)>(
        "SELECT rating, COUNT(*)
            FROM reviews
            WHERE spot_id = $1
            GROUP BY rating",
    )
    .bind(spot_id)
    .fetch_all(postgres)
    .await
    .map_err(|e| {
        AppError::DatabaseError(format!(
            "Failed to fetch rating distribution for spot {}: {}",
            spot_id, e
        ))
    })
}
