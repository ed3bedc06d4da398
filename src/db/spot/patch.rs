use sqlx::PgPool;

use crate::errors::AppError;

/// Overwrites the denormalized rating fields. Only this path mutates them.
pub async fn update_spot_rating_stats(
    spot_id: &str,
    average_rating: f64,
    review_count: i64,
    postgres: &PgPool,
) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE spots
            SET average_rating = $2, review_count = $3, updated_at = NOW()
            WHERE id = $1",
    )
    .bind(spot_id)
    .bind(average_rating)
    .bind(review_count)
    .execute(postgres)
    .await
    .map_err(|e| {
        AppError::DatabaseError(format!(
            "Failed to update rating stats for spot {}: {}",
            spot_id, e
        ))
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Spot {} not found", spot_id)));
    }

    Ok(())
}
