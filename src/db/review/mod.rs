pub mod get;
pub mod post;

pub use get::{get_rating_counts, get_review_by_id, get_spot_reviews, get_user_reviews, review_exists};
pub use post::create_review;

pub(crate) const REVIEW_COLUMNS: &str =
    "id, spot_id, user_id, rating, comment, rating_aspects, created_at, updated_at";
