//! HTTP client for the external accrual service.
//!
//! The service answers `GET {base_url}/api/orders/{number}` with one of
//! * `200 OK` and a JSON body `{"order": "...", "status": "...", "accrual": 500}`,
//! * `204 No Content` if it has never heard of the order,
//! * `429 Too Many Requests` with a plain text body `No more than N requests per minute allowed`, and optionally a
//!   `Retry-After` header in seconds.
use std::{
    future::Future,
    sync::{Arc, OnceLock},
    time::Duration,
};

use log::*;
use lpg_common::Points;
use regex::Regex;
use reqwest::{header::RETRY_AFTER, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use super::governor::RateGovernor;
use crate::db_types::{AccrualResult, OrderNumber, OrderStatusType};

#[derive(Debug, Clone, Error)]
pub enum AccrualClientError {
    #[error("Could not set up the accrual service client: {0}")]
    Setup(String),
    #[error("Request to the accrual service failed: {0}")]
    Transport(String),
    #[error("Accrual service quota exceeded. Advertised rate: {requests_per_minute:?} rpm")]
    QuotaExceeded { requests_per_minute: Option<i64>, retry_after: Option<Duration> },
    #[error("Accrual service replied with HTTP {0}")]
    UnexpectedStatus(u16),
    #[error("Could not decode the accrual service response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for AccrualClientError {
    fn from(e: reqwest::Error) -> Self {
        AccrualClientError::Transport(e.to_string())
    }
}

/// Somewhere to look up the accrual service's verdict on an order.
///
/// `None` means "no verdict this time": the order stays as it is and will be offered again on a later scan.
pub trait AccrualSource: Send + Sync + 'static {
    fn fetch(&self, order_number: &OrderNumber) -> impl Future<Output = Option<AccrualResult>> + Send;
}

#[derive(Debug, Deserialize)]
struct AccrualResponse {
    order: OrderNumber,
    status: OrderStatusType,
    #[serde(default)]
    accrual: Option<Points>,
}

#[derive(Debug, Clone)]
pub struct AccrualClient {
    http: reqwest::Client,
    base_url: String,
    governor: Arc<RateGovernor>,
}

impl AccrualClient {
    /// Every request is bounded by `timeout`. Quota information from `429` replies is passed on to `governor`.
    pub fn new(base_url: &str, timeout: Duration, governor: Arc<RateGovernor>) -> Result<Self, AccrualClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AccrualClientError::Setup(e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self { http, base_url, governor })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Makes exactly one request for the order and reports the typed outcome. There are no retries and no side
    /// effects; see [`AccrualSource::fetch`] for the version that feeds quota changes to the governor.
    pub async fn lookup(&self, order_number: &OrderNumber) -> Result<AccrualResult, AccrualClientError> {
        let url = format!("{}/api/orders/{}", self.base_url, order_number.as_str());
        trace!("🧾️ GET {url}");
        let response = self.http.get(&url).send().await?;
        match response.status() {
            StatusCode::OK => {
                let body = response.bytes().await?;
                let reply = serde_json::from_slice::<AccrualResponse>(&body)
                    .map_err(|e| AccrualClientError::Decode(e.to_string()))?;
                if reply.order != *order_number {
                    warn!("🧾️ Asked about order {order_number}, but the accrual service replied about {}", reply.order);
                }
                Ok(AccrualResult::new(order_number.clone(), reply.status, reply.accrual))
            },
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                let body = response.text().await.unwrap_or_default();
                let requests_per_minute = parse_quota_body(&body);
                if requests_per_minute.is_none() {
                    warn!("🧾️ Could not read the request quota from the accrual service's 429 reply: '{body}'");
                }
                Err(AccrualClientError::QuotaExceeded { requests_per_minute, retry_after })
            },
            status => Err(AccrualClientError::UnexpectedStatus(status.as_u16())),
        }
    }
}

impl AccrualSource for AccrualClient {
    async fn fetch(&self, order_number: &OrderNumber) -> Option<AccrualResult> {
        match self.lookup(order_number).await {
            Ok(result) => {
                debug!("🧾️ Order {order_number} is {}", result.status);
                Some(result)
            },
            Err(AccrualClientError::QuotaExceeded { requests_per_minute: Some(rpm), retry_after }) => {
                info!("🧾️ Accrual service quota exceeded while looking up order {order_number}. Limit is {rpm} rpm");
                match retry_after {
                    Some(delay) => self.governor.update_after(rpm, delay),
                    None => self.governor.update(rpm),
                }
                None
            },
            Err(AccrualClientError::UnexpectedStatus(204)) => {
                debug!("🧾️ The accrual service does not know order {order_number} yet");
                None
            },
            Err(e) => {
                warn!("🧾️ Could not look up order {order_number}. {e}");
                None
            },
        }
    }
}

/// Extracts the rate from a quota message such as `No more than 10 requests per minute allowed`. Case and spacing
/// are not significant.
pub fn parse_quota_body(body: &str) -> Option<i64> {
    static QUOTA: OnceLock<Option<Regex>> = OnceLock::new();
    let re = QUOTA.get_or_init(|| Regex::new(r"(?i)no\s+more\s+than\s+(-?\d+)\s+requests?\s+per\s+minute").ok());
    re.as_ref()?.captures(body)?.get(1)?.as_str().parse::<i64>().ok()
}
