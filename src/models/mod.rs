pub mod pagination;
pub mod rating;
pub mod review;
pub mod spot;

pub use pagination::{Page, PageQuery, Paginated};
pub use rating::RatingDistribution;
pub use review::{CreateReviewInput, NewReview, RatingAspects, Review, UserReview};
pub use spot::{Spot, SpotFilter, SpotHit, SpotTextQuery};
