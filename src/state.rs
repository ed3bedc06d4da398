use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    db::{ReviewStore, SpotStore},
    services::{
        FailureSink, RatingAggregator, RatingRefresher, RetryPolicy, ReviewIngestionService,
        ReviewQueryService, SpotSearchService, TracingSink,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub ingestion: ReviewIngestionService,
    pub review_queries: ReviewQueryService,
    pub spot_search: SpotSearchService,
    pub aggregator: RatingAggregator,
    pub jwt_secret: Arc<str>,
    /// Root of every background refresh's cancellation; cancelled on shutdown.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        reviews: Arc<dyn ReviewStore>,
        spots: Arc<dyn SpotStore>,
        jwt_secret: impl Into<Arc<str>>,
        shutdown: CancellationToken,
    ) -> Self {
        Self::with_refresh_policy(
            reviews,
            spots,
            RetryPolicy::default(),
            Arc::new(TracingSink),
            jwt_secret,
            shutdown,
        )
    }

    pub fn with_refresh_policy(
        reviews: Arc<dyn ReviewStore>,
        spots: Arc<dyn SpotStore>,
        policy: RetryPolicy,
        sink: Arc<dyn FailureSink>,
        jwt_secret: impl Into<Arc<str>>,
        shutdown: CancellationToken,
    ) -> Self {
        let aggregator = RatingAggregator::new(reviews.clone(), spots.clone());
        let refresher = RatingRefresher::new(aggregator.clone(), policy, sink);

        Self {
            ingestion: ReviewIngestionService::new(reviews.clone(), refresher),
            review_queries: ReviewQueryService::new(reviews, aggregator.clone()),
            spot_search: SpotSearchService::new(spots),
            aggregator,
            jwt_secret: jwt_secret.into(),
            shutdown,
        }
    }
}
