pub mod get;
pub mod patch;
pub mod search;

pub use get::{get_spot_by_id, list_spots};
pub use patch::update_spot_rating_stats;
pub use search::{search_spots_by_radius, search_spots_by_text};

pub(crate) const SPOT_COLUMNS: &str = "id, name, name_i18n, latitude, longitude, category, address, \
    address_i18n, country_code, average_rating, review_count, created_at, updated_at";
