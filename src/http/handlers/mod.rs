pub mod review;
pub mod spot;

pub use review::{
    create_review_handler, get_my_reviews_handler, get_spot_reviews_handler,
    get_user_reviews_handler, refresh_spot_rating_handler,
};
pub use spot::{get_spot_handler, list_spots_handler, nearby_spots_handler, search_spots_handler};
