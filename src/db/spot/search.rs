use sqlx::{PgPool, Postgres, QueryBuilder};

use super::SPOT_COLUMNS;
use crate::{
    errors::AppError,
    geo::{EARTH_RADIUS_KM, RadiusFilter},
    models::{
        pagination::Page,
        spot::{SpotFilter, SpotHit, SpotTextQuery},
    },
};

pub async fn search_spots_by_radius(
    radius: &RadiusFilter,
    page: Page,
    postgres: &PgPool,
) -> Result<(Vec<SpotHit>, i64), AppError> {
    let mut spots_query = QueryBuilder::<Postgres>::new("SELECT ");
    spots_query.push(SPOT_COLUMNS).push(", distance_km");
    push_matched_spots(&mut spots_query, None, &SpotFilter::default(), Some(radius));
    spots_query
        .push(" ORDER BY distance_km ASC, id ASC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());

    let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
    push_matched_spots(&mut count_query, None, &SpotFilter::default(), Some(radius));

    let (spots, total) = tokio::try_join!(
        spots_query.build_query_as::<SpotHit>().fetch_all(postgres),
        count_query.build_query_scalar::<i64>().fetch_one(postgres),
    )
    .map_err(|e| AppError::DatabaseError(format!("Failed to search spots by radius: {}", e)))?;

    Ok((spots, total))
}

pub async fn search_spots_by_text(
    query: &SpotTextQuery,
    page: Page,
    postgres: &PgPool,
) -> Result<(Vec<SpotHit>, i64), AppError> {
    let text = Some(query.text.as_str());

    let mut spots_query = QueryBuilder::<Postgres>::new("SELECT ");
    spots_query.push(SPOT_COLUMNS).push(", distance_km");
    push_matched_spots(&mut spots_query, text, &query.filter, query.radius.as_ref());
    spots_query
        .push(" ORDER BY CASE WHEN lower(name) = lower(")
        .push_bind(query.text.clone())
        .push(") THEN 0 WHEN lower(name) LIKE lower(")
        .push_bind(format!("{}%", escape_like(&query.text)))
        .push(") THEN 1 ELSE 2 END, average_rating DESC, review_count DESC, id ASC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());

    let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
    push_matched_spots(&mut count_query, text, &query.filter, query.radius.as_ref());

    let (spots, total) = tokio::try_join!(
        spots_query.build_query_as::<SpotHit>().fetch_all(postgres),
        count_query.build_query_scalar::<i64>().fetch_one(postgres),
    )
    .map_err(|e| AppError::DatabaseError(format!("Failed to search spots: {}", e)))?;

    Ok((spots, total))
}

/// Pushes the `FROM ... WHERE ...` part shared by a search and its count query,
/// so both always see the same predicates.
fn push_matched_spots(
    qb: &mut QueryBuilder<'_, Postgres>,
    text: Option<&str>,
    filter: &SpotFilter,
    radius: Option<&RadiusFilter>,
) {
    qb.push(" FROM (SELECT ").push(SPOT_COLUMNS);

    match radius {
        Some(radius) => {
            qb.push(", 2 * ")
                .push_bind(EARTH_RADIUS_KM)
                .push(
                    " * atan2(sqrt(LEAST(1, GREATEST(0, h))), sqrt(LEAST(1, GREATEST(0, 1 - h)))) \
                    AS distance_km FROM (SELECT ",
                )
                .push(SPOT_COLUMNS)
                .push(", power(sin(radians(latitude - ")
                .push_bind(radius.center.lat)
                .push(") / 2), 2) + cos(radians(")
                .push_bind(radius.center.lat)
                .push(")) * cos(radians(latitude)) * power(sin(radians(longitude - ")
                .push_bind(radius.center.lng)
                .push(") / 2), 2) AS h FROM spots WHERE TRUE");

            let bbox = radius.bounding_box();
            qb.push(" AND latitude BETWEEN ")
                .push_bind(bbox.min_lat)
                .push(" AND ")
                .push_bind(bbox.max_lat)
                .push(" AND longitude BETWEEN ")
                .push_bind(bbox.min_lng)
                .push(" AND ")
                .push_bind(bbox.max_lng);
            push_text(qb, text);
            push_filter(qb, filter);

            qb.push(") AS scored) AS matched WHERE distance_km <= ")
                .push_bind(radius.max_distance_km());
        }
        None => {
            qb.push(", NULL::float8 AS distance_km FROM spots WHERE TRUE");
            push_text(qb, text);
            push_filter(qb, filter);
            qb.push(") AS matched");
        }
    }
}

fn push_text(qb: &mut QueryBuilder<'_, Postgres>, text: Option<&str>) {
    let Some(text) = text else {
        return;
    };
    let pattern = format!("%{}%", escape_like(text));

    qb.push(" AND (name ILIKE ")
        .push_bind(pattern.clone())
        .push(" OR address ILIKE ")
        .push_bind(pattern.clone())
        .push(" OR EXISTS (SELECT 1 FROM jsonb_each_text(name_i18n) AS localized(locale, value) WHERE localized.value ILIKE ")
        .push_bind(pattern)
        .push("))");
}

pub(super) fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &SpotFilter) {
    if let Some(category) = &filter.category {
        qb.push(" AND lower(category) = lower(")
            .push_bind(category.clone())
            .push(")");
    }
    if let Some(country_code) = &filter.country_code {
        qb.push(" AND upper(country_code) = ")
            .push_bind(country_code.clone());
    }
}

/// Escapes LIKE wildcards so user text matches literally.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
