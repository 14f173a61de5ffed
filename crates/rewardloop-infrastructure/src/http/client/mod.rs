mod types;

pub use types::RetryConfig;

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;

use rewardloop_domain::gateway::ApiError;
use types::USER_AGENT;

/// Every remote call carries a bounded wait; past it the call is aborted and
/// treated as transient.
pub const REQUEST_TIMEOUT_SECS: u64 = 20;

pub struct HttpClient {
    pub(super) client: Client,
    pub(super) retry_config: RetryConfig,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        Self::with_retry_config(RetryConfig::default())
    }

    pub fn with_retry_config(retry_config: RetryConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            retry_config,
        })
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Execute a request with retry logic.
    ///
    /// Retries on network errors, timeouts, and 5xx responses. Never retries
    /// risk signals, auth rejections, or other 4xx responses.
    pub async fn execute_with_retry<F, Fut, T>(
        &self,
        operation_name: &str,
        mut request_fn: F,
    ) -> std::result::Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, ApiError>>,
    {
        let mut attempt = 0;
        let mut backoff_ms = self.retry_config.initial_backoff_ms;

        loop {
            attempt += 1;

            match request_fn().await {
                Ok(response) => {
                    if attempt > 1 {
                        debug!("✅ {} succeeded after {} attempts", operation_name, attempt);
                    }
                    return Ok(response);
                }
                Err(e) => {
                    let should_retry =
                        attempt <= self.retry_config.max_retries && is_retryable(&e);

                    if should_retry {
                        warn!(
                            "⚠️  {} failed (attempt {}/{}): {}. Retrying in {}ms...",
                            operation_name, attempt, self.retry_config.max_retries, e, backoff_ms
                        );

                        sleep(Duration::from_millis(backoff_ms)).await;

                        backoff_ms = ((backoff_ms as f64 * self.retry_config.backoff_multiplier)
                            as u64)
                            .min(self.retry_config.max_backoff_ms);
                    } else {
                        if attempt > self.retry_config.max_retries {
                            warn!(
                                "❌ {} failed after {} attempts",
                                operation_name, self.retry_config.max_retries
                            );
                        }
                        return Err(e);
                    }
                }
            }
        }
    }
}

fn is_retryable(error: &ApiError) -> bool {
    match error {
        ApiError::Timeout | ApiError::Network(_) => true,
        ApiError::Http { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Map a transport-level failure into the API error taxonomy.
pub(super) fn map_reqwest_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout
    } else if error.is_connect() || error.is_request() {
        ApiError::Network(error.to_string())
    } else if error.is_decode() {
        ApiError::Decode(error.to_string())
    } else {
        ApiError::Network(error.to_string())
    }
}
