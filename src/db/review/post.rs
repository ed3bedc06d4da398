use sqlx::{PgPool, types::Json};

use crate::{errors::AppError, models::review::NewReview};

pub async fn create_review(review: &NewReview, postgres: &PgPool) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO reviews (id, spot_id, user_id, rating, comment, rating_aspects)
        VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(review.id)
    .bind(&review.spot_id)
    .bind(&review.user_id)
    .bind(review.rating)
    .bind(&review.comment)
    .bind(Json(&review.rating_aspects))
    .execute(postgres)
    .await
    .map_err(|e| match &e {
        // The unique index on (user_id, spot_id) catches the race the
        // existence check cannot.
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::AlreadyExists(
            format!("User {} has already reviewed spot {}", review.user_id, review.spot_id),
        ),
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::InvalidInput(format!("Spot {} does not exist", review.spot_id))
        }
        _ => AppError::DatabaseError(format!("Failed to create review: {}", e)),
    })?;

    tracing::debug!("Inserted review {} for spot {}", review.id, review.spot_id);

    Ok(())
}
