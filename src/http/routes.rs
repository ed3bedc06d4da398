use axum::{
    Router,
    routing::{get, post},
};

use crate::{
    http::handlers::{
        create_review_handler, get_my_reviews_handler, get_spot_handler, get_spot_reviews_handler,
        get_user_reviews_handler, list_spots_handler, nearby_spots_handler,
        refresh_spot_rating_handler, search_spots_handler,
    },
    state::AppState,
};

pub fn create_http_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/spots", get(list_spots_handler))
        .route("/spots/nearby", get(nearby_spots_handler))
        .route("/spots/search", get(search_spots_handler))
        .route("/spots/{spot_id}", get(get_spot_handler))
        .route(
            "/spots/{spot_id}/reviews",
            get(get_spot_reviews_handler).post(create_review_handler),
        )
        .route(
            "/spots/{spot_id}/rating/refresh",
            post(refresh_spot_rating_handler),
        )
        .route("/users/{user_id}/reviews", get(get_user_reviews_handler))
        .route("/me/reviews", get(get_my_reviews_handler))
        .with_state(state)
}
