use std::{sync::Arc, time::Duration};

use rand::Rng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    db::{ReviewStore, SpotStore},
    errors::AppError,
    models::rating::RatingDistribution,
};

/// Recomputes a spot's average rating and review count from its reviews and
/// overwrites the denormalized fields on the spot. Safe to run repeatedly:
/// every run writes the aggregate as of its own read.
#[derive(Clone)]
pub struct RatingAggregator {
    reviews: Arc<dyn ReviewStore>,
    spots: Arc<dyn SpotStore>,
}

impl RatingAggregator {
    pub fn new(reviews: Arc<dyn ReviewStore>, spots: Arc<dyn SpotStore>) -> Self {
        Self { reviews, spots }
    }

    pub async fn distribution(&self, spot_id: &str) -> Result<RatingDistribution, AppError> {
        let counts = self.reviews.rating_counts(spot_id).await?;
        Ok(RatingDistribution::from_counts(counts))
    }

    pub async fn recompute(&self, spot_id: &str) -> Result<RatingDistribution, AppError> {
        if spot_id.trim().is_empty() {
            return Err(AppError::InvalidInput("Spot ID is required".into()));
        }

        let distribution = self.distribution(spot_id).await?;
        self.spots
            .update_rating_stats(spot_id, distribution.average, distribution.total)
            .await?;

        tracing::debug!(
            "Rating stats for spot {} set to {} over {} reviews",
            spot_id,
            distribution.average,
            distribution.total
        );

        Ok(distribution)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(30),
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// `base_delay * 2^(attempt - 1)` for the 1-based attempt that just failed.
    pub fn base_backoff(&self, failed_attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(failed_attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// Base backoff plus jitter drawn uniformly from `[0, base/2)`.
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        let delay = self.base_backoff(failed_attempt);
        let half_ms = (delay.as_millis() / 2) as u64;
        if half_ms == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::rng().random_range(0..half_ms))
    }
}

/// What the background refresh reports to the failure sink. Success is silent.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEvent {
    AttemptFailed {
        spot_id: String,
        attempt: u32,
        error: String,
        /// `None` when this was the last allowed attempt.
        retry_in: Option<Duration>,
    },
    Exhausted {
        spot_id: String,
        attempts: u32,
        error: String,
    },
    Cancelled {
        spot_id: String,
        attempts: u32,
    },
}

pub trait FailureSink: Send + Sync {
    fn report(&self, event: RefreshEvent);
}

/// Sends refresh failures to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn report(&self, event: RefreshEvent) {
        match event {
            RefreshEvent::AttemptFailed {
                spot_id,
                attempt,
                error,
                retry_in,
            } => tracing::warn!(
                spot_id = %spot_id,
                attempt,
                retry_in_ms = retry_in.map(|d| d.as_millis() as u64),
                "Rating refresh attempt failed: {}",
                error
            ),
            RefreshEvent::Exhausted {
                spot_id,
                attempts,
                error,
            } => tracing::error!(
                spot_id = %spot_id,
                attempts,
                "Rating refresh gave up, spot stats left stale: {}",
                error
            ),
            RefreshEvent::Cancelled { spot_id, attempts } => tracing::info!(
                spot_id = %spot_id,
                attempts,
                "Rating refresh cancelled"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Updated {
        attempts: u32,
        distribution: RatingDistribution,
    },
    Exhausted {
        attempts: u32,
    },
    Cancelled {
        attempts: u32,
    },
}

/// Runs the aggregator in the background with bounded retries, exponential
/// backoff with jitter, and a per-attempt timeout, stopping as soon as the
/// parent token is cancelled.
#[derive(Clone)]
pub struct RatingRefresher {
    aggregator: RatingAggregator,
    policy: RetryPolicy,
    sink: Arc<dyn FailureSink>,
}

impl RatingRefresher {
    pub fn new(aggregator: RatingAggregator, policy: RetryPolicy, sink: Arc<dyn FailureSink>) -> Self {
        Self {
            aggregator,
            policy,
            sink,
        }
    }

    pub fn spawn(&self, spot_id: String, parent: CancellationToken) -> JoinHandle<RefreshOutcome> {
        let refresher = self.clone();
        tokio::spawn(async move { refresher.run(&spot_id, &parent).await })
    }

    pub async fn run(&self, spot_id: &str, parent: &CancellationToken) -> RefreshOutcome {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            if parent.is_cancelled() {
                return self.cancelled(spot_id, attempts);
            }
            attempts += 1;

            // Cancelled mid-attempt still counts the attempt that was started.
            let result = tokio::select! {
                biased;
                _ = parent.cancelled() => return self.cancelled(spot_id, attempts),
                result = tokio::time::timeout(
                    self.policy.attempt_timeout,
                    self.aggregator.recompute(spot_id),
                ) => result,
            };

            let error = match result {
                Ok(Ok(distribution)) => {
                    return RefreshOutcome::Updated {
                        attempts,
                        distribution,
                    };
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!(
                    "attempt timed out after {}s",
                    self.policy.attempt_timeout.as_secs_f64()
                ),
            };

            if attempts >= max_attempts {
                self.sink.report(RefreshEvent::AttemptFailed {
                    spot_id: spot_id.to_string(),
                    attempt: attempts,
                    error: error.clone(),
                    retry_in: None,
                });
                self.sink.report(RefreshEvent::Exhausted {
                    spot_id: spot_id.to_string(),
                    attempts,
                    error,
                });
                return RefreshOutcome::Exhausted { attempts };
            }

            let delay = self.policy.backoff(attempts);
            self.sink.report(RefreshEvent::AttemptFailed {
                spot_id: spot_id.to_string(),
                attempt: attempts,
                error,
                retry_in: Some(delay),
            });

            tokio::select! {
                biased;
                _ = parent.cancelled() => return self.cancelled(spot_id, attempts),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn cancelled(&self, spot_id: &str, attempts: u32) -> RefreshOutcome {
        self.sink.report(RefreshEvent::Cancelled {
            spot_id: spot_id.to_string(),
            attempts,
        });
        RefreshOutcome::Cancelled { attempts }
    }
}
