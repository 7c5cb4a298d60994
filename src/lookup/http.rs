//! reqwest-backed facility lookup.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, warn};

use super::{FacilityLookup, LookupOutcome, RequestTemplate};
use crate::error::{LookupError, Result, SweepError};
use crate::models::SamplePoint;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Headers recomputed by the client for every request
const SKIPPED_HEADERS: &[&str] = &["content-length", "host"];

/// POSTs the template form with per-point coordinates
pub struct HttpLookup {
    client: Client,
    template: RequestTemplate,
    headers: HeaderMap,
    timeout: Duration,
    max_attempts: u32,
    retry_delay: Duration,
}

impl HttpLookup {
    /// Build a lookup with an explicit per-request timeout
    pub fn new(template: RequestTemplate, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SweepError::Client(e.to_string()))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &template.headers {
            if SKIPPED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                continue;
            }
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| SweepError::Template(format!("header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| SweepError::Template(format!("header {}: {}", name.as_str(), e)))?;
            headers.append(name, value);
        }
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        }

        Ok(Self {
            client,
            template,
            headers,
            timeout,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    /// Retry transient failures up to `max_attempts` in total, doubling the delay each time
    pub fn with_retries(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Worst-case time for one lookup: every attempt timing out plus all backoff delays.
    ///
    /// A per-point deadline shorter than this cuts retries off.
    pub fn retry_budget(&self) -> Duration {
        let mut budget = self.timeout * self.max_attempts;
        let mut delay = self.retry_delay;
        for _ in 1..self.max_attempts {
            budget += delay;
            delay *= 2;
        }
        budget
    }

    async fn send_once(&self, point: SamplePoint) -> LookupOutcome {
        let response = self
            .client
            .post(self.template.url.clone())
            .headers(self.headers.clone())
            .body(self.template.body_for(point))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            let fragment: String = body.chars().take(200).collect();
            LookupError::MalformedPayload(format!("{} in body: {}", e, fragment))
        })
    }
}

#[async_trait]
impl FacilityLookup for HttpLookup {
    async fn lookup(&self, point: SamplePoint) -> LookupOutcome {
        let mut attempts = 0;
        let mut delay = self.retry_delay;

        loop {
            attempts += 1;

            match self.send_once(point).await {
                Ok(payload) => {
                    debug!("Lookup at ({}, {}) succeeded", point.lon, point.lat);
                    return Ok(payload);
                }
                Err(e) if e.is_retryable() && attempts < self.max_attempts => {
                    warn!(
                        "Lookup at ({}, {}) failed (attempt {}/{}): {}",
                        point.lon, point.lat, attempts, self.max_attempts, e
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
