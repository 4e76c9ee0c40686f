use std::{future::Future, time::Duration};

use log::*;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{Amount, OrderNumber};

/// Used when a 429 response carries no usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccrualStatus {
    /// Known to the accrual service, but not looked at yet.
    Registered,
    Processing,
    /// No accrual will be granted for this order.
    Invalid,
    /// The accrual has been calculated.
    Processed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualStatusResponse {
    pub order: OrderNumber,
    pub status: AccrualStatus,
    /// Only present for `PROCESSED` orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Amount>,
}

/// What the accrual service had to say about an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualResponse {
    Status(AccrualStatusResponse),
    /// The service does not know this order (yet).
    NotRegistered,
    /// Too many requests. Nobody should call again before `retry_after` has elapsed.
    RateLimited { retry_after: Duration },
}

#[derive(Debug, Clone, Error)]
pub enum AccrualClientError {
    #[error("Could not reach the accrual service: {0}")]
    Transport(String),
    #[error("The accrual service replied with an unexpected status code {0}")]
    UnexpectedStatus(u16),
    #[error("Could not decode the accrual service reply: {0}")]
    Decode(String),
}

/// Anything that can ask the accrual service about an order.
pub trait AccrualClient: Send + Sync + 'static {
    fn fetch_accrual(
        &self,
        number: &OrderNumber,
    ) -> impl Future<Output = Result<AccrualResponse, AccrualClientError>> + Send;
}

//--------------------------------------   HttpAccrualClient   ---------------------------------------------------------
/// Talks to the accrual service over HTTP: `GET {base_url}/api/orders/{number}`.
#[derive(Debug, Clone)]
pub struct HttpAccrualClient {
    base_url: String,
    client: Client,
}

impl HttpAccrualClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AccrualClientError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| AccrualClientError::Transport(e.to_string()))?;
        Ok(Self { base_url: normalize_base_url(base_url), client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl AccrualClient for HttpAccrualClient {
    async fn fetch_accrual(&self, number: &OrderNumber) -> Result<AccrualResponse, AccrualClientError> {
        let url = format!("{}/api/orders/{}", self.base_url, number.as_str());
        trace!("🕰️ GET {url}");
        let response = self.client.get(&url).send().await.map_err(|e| AccrualClientError::Transport(e.to_string()))?;
        match response.status() {
            StatusCode::OK => {
                let body = response
                    .json::<AccrualStatusResponse>()
                    .await
                    .map_err(|e| AccrualClientError::Decode(e.to_string()))?;
                Ok(AccrualResponse::Status(body))
            },
            StatusCode::NO_CONTENT => Ok(AccrualResponse::NotRegistered),
            StatusCode::TOO_MANY_REQUESTS => {
                let header = response.headers().get(RETRY_AFTER).and_then(|v| v.to_str().ok());
                let retry_after = parse_retry_after(header, DEFAULT_RETRY_AFTER);
                debug!("🕰️ Accrual service asked us to back off for {}s", retry_after.as_secs());
                Ok(AccrualResponse::RateLimited { retry_after })
            },
            status => Err(AccrualClientError::UnexpectedStatus(status.as_u16())),
        }
    }
}

/// Strips trailing slashes and assumes `http://` when no scheme is given, so that `localhost:8081` works.
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

/// `Retry-After` in delta-seconds. Anything else (missing, a date, garbage) falls back to `default`.
pub fn parse_retry_after(header: Option<&str>, default: Duration) -> Duration {
    header.and_then(|v| v.trim().parse::<u64>().ok()).map(Duration::from_secs).unwrap_or(default)
}
