use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use super::trade_lookup_errors::TradeLookupError;
use super::trade_lookup_model::TradeServiceExecutionResponse;
use crate::Result;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_OVERALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait defining the contract for resolving a portfolio id from an external
/// execution id.
#[async_trait]
pub trait TradeLookupTrait: Send + Sync {
    async fn resolve_portfolio(&self, external_execution_id: i64) -> Result<String>;
}

/// Retry and timeout knobs for the trade lookup client.
///
/// `max_retries` counts additional attempts after the first; backoff is
/// linear (`attempt * base_delay`). The overall timeout bounds the whole
/// resolve call, backoff waits included.
#[derive(Debug, Clone)]
pub struct TradeLookupConfig {
    pub base_url: String,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub overall_timeout: Duration,
}

impl TradeLookupConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            overall_timeout: DEFAULT_OVERALL_TIMEOUT,
        }
    }
}

/// HTTP resolver that maps an external execution id to a portfolio id via the
/// trade service, with bounded linear-backoff retry.
///
/// Transport failures and 5xx responses are retried; 4xx responses and decode
/// failures are permanent. A deadline elapsing during a backoff wait returns
/// promptly with `TradeLookupError::Cancelled`.
pub struct TradeLookupClient {
    base_url: String,
    client: Client,
    max_retries: u32,
    base_delay: Duration,
    overall_timeout: Duration,
}

impl TradeLookupClient {
    pub fn new(config: TradeLookupConfig) -> Self {
        let client = Client::builder()
            .timeout(config.overall_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: config.base_url,
            client,
            max_retries: config.max_retries,
            base_delay: config.base_delay,
            overall_timeout: config.overall_timeout,
        }
    }

    /// Performs a single lookup request bounded by `attempt_timeout`.
    async fn fetch_execution(
        &self,
        external_execution_id: i64,
        attempt_timeout: Duration,
    ) -> std::result::Result<TradeServiceExecutionResponse, TradeLookupError> {
        let url = format!("{}/api/v2/executions", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&[("executionServiceId", external_execution_id)])
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(attempt_timeout)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status.is_client_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(TradeLookupError::PermanentRemote {
                status: status.as_u16(),
                message,
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TradeLookupError::Transient(format!(
                "HTTP {}: {}",
                status.as_u16(),
                message
            )));
        }

        response.json().await.map_err(|err| {
            if err.is_decode() {
                TradeLookupError::Decode(err.to_string())
            } else {
                classify_transport_error(err)
            }
        })
    }
}

#[async_trait]
impl TradeLookupTrait for TradeLookupClient {
    async fn resolve_portfolio(&self, external_execution_id: i64) -> Result<String> {
        let deadline = Instant::now() + self.overall_timeout;
        let mut last_error = TradeLookupError::Transient("no attempts made".to_string());

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * attempt;
                // Yield promptly instead of sleeping past the deadline.
                if Instant::now() + delay >= deadline {
                    return Err(TradeLookupError::Cancelled.into());
                }
                debug!(
                    "retrying trade service call for {} (attempt {}, delay {:?})",
                    external_execution_id, attempt, delay
                );
                sleep(delay).await;
            }

            let remaining = match deadline.checked_duration_since(Instant::now()) {
                Some(remaining) if !remaining.is_zero() => remaining,
                _ => return Err(TradeLookupError::Cancelled.into()),
            };

            match self
                .fetch_execution(external_execution_id, remaining)
                .await
            {
                Ok(response) => {
                    return Ok(extract_portfolio_id(response, external_execution_id)?)
                }
                Err(err @ TradeLookupError::PermanentRemote { .. })
                | Err(err @ TradeLookupError::Decode(_))
                | Err(err @ TradeLookupError::Cancelled) => return Err(err.into()),
                Err(err) => {
                    warn!(
                        "trade service call for {} failed (attempt {}): {}",
                        external_execution_id,
                        attempt + 1,
                        err
                    );
                    last_error = err;
                }
            }
        }

        Err(TradeLookupError::Transient(format!(
            "all retry attempts failed: {}",
            last_error
        ))
        .into())
    }
}

fn classify_transport_error(err: reqwest::Error) -> TradeLookupError {
    // The per-attempt timeout is derived from the overall deadline, so a
    // timeout means the deadline elapsed mid-request.
    if err.is_timeout() {
        TradeLookupError::Cancelled
    } else {
        TradeLookupError::Transient(err.to_string())
    }
}

fn extract_portfolio_id(
    response: TradeServiceExecutionResponse,
    external_execution_id: i64,
) -> std::result::Result<String, TradeLookupError> {
    let execution = response.executions.into_iter().next().ok_or_else(|| {
        TradeLookupError::NotResolvable(format!(
            "no execution found in trade service for id {}",
            external_execution_id
        ))
    })?;

    let portfolio_id = execution.trade_order.portfolio.portfolio_id;
    if portfolio_id.is_empty() {
        return Err(TradeLookupError::NotResolvable(format!(
            "portfolio id is empty for external execution {}",
            external_execution_id
        )));
    }

    Ok(portfolio_id)
}
