//! Exponential backoff for flaky recipe sources

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::warn;
use trellis_core::types::{ProjectId, Recipe};

use crate::source::RecipeSource;
use crate::RegistryResult;

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay to wait after the attempt that just failed
    pub fn next_delay(&self, current: Duration) -> Duration {
        let scaled = Duration::from_millis((current.as_millis() as f64 * self.multiplier) as u64);
        std::cmp::min(scaled, self.max_delay)
    }
}

/// Retries recoverable fetch failures of the wrapped source.
///
/// Errors that retrying cannot fix (unknown project, malformed recipe) are
/// returned immediately.
#[derive(Debug)]
pub struct RetryingRecipeSource<S> {
    inner: S,
    config: RetryConfig,
}

impl<S: RecipeSource> RetryingRecipeSource<S> {
    pub fn new(inner: S) -> Self {
        Self::with_config(inner, RetryConfig::default())
    }

    pub fn with_config(inner: S, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: RecipeSource> RecipeSource for RetryingRecipeSource<S> {
    fn fetch<'a>(&'a self, project: &'a ProjectId) -> BoxFuture<'a, RegistryResult<Recipe>> {
        async move {
            let mut delay = self.config.initial_delay;
            let mut attempt = 0;

            loop {
                match self.inner.fetch(project).await {
                    Ok(recipe) => return Ok(recipe),
                    Err(error) if !error.is_recoverable() || attempt >= self.config.max_retries => {
                        return Err(error);
                    }
                    Err(error) => {
                        attempt += 1;
                        warn!(
                            "Fetching {} failed (attempt {}/{}): {}; retrying in {:?}",
                            project, attempt, self.config.max_retries, error, delay
                        );
                        tokio::time::sleep(delay).await;
                        delay = self.config.next_delay(delay);
                    }
                }
            }
        }
        .boxed()
    }
}
