pub mod ingestion;
pub mod rating;
pub mod review_query;
pub mod spot_search;

pub use ingestion::ReviewIngestionService;
pub use rating::{
    FailureSink, RatingAggregator, RatingRefresher, RefreshEvent, RefreshOutcome, RetryPolicy,
    TracingSink,
};
pub use review_query::{ReviewQueryService, SpotReviews};
pub use spot_search::{SpotSearchParams, SpotSearchService};
