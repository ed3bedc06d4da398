use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{SPOT_COLUMNS, search::push_filter};
use crate::{
    errors::AppError,
    models::{
        pagination::Page,
        spot::{Spot, SpotFilter},
    },
};

pub async fn get_spot_by_id(id: &str, postgres: &PgPool) -> Result<Option<Spot>, AppError> {
    let query = format!("SELECT {SPOT_COLUMNS} FROM spots WHERE id = $1");

    sqlx::query_as::<_, Spot>(&query)
        .bind(id)
        .fetch_optional(postgres)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch spot {}: {}", id, e)))
}

pub async fn list_spots(
    filter: &SpotFilter,
    page: Page,
    postgres: &PgPool,
) -> Result<(Vec<Spot>, i64), AppError> {
    let mut spots_query = QueryBuilder::<Postgres>::new("SELECT ");
    spots_query.push(SPOT_COLUMNS).push(" FROM spots WHERE TRUE");
    push_filter(&mut spots_query, filter);
    spots_query
        .push(" ORDER BY average_rating DESC, review_count DESC, id ASC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());

    let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM spots WHERE TRUE");
    push_filter(&mut count_query, filter);

    let (spots, total) = tokio::try_join!(
        spots_query.build_query_as::<Spot>().fetch_all(postgres),
        count_query.build_query_scalar::<i64>().fetch_one(postgres),
    )
    .map_err(|e| AppError::DatabaseError(format!("Failed to list spots: {}", e)))?;

    Ok((spots, total))
}
