//! Remote facility lookup: one request per sample point.

mod http;
mod template;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::LookupError;
use crate::models::SamplePoint;

pub use http::HttpLookup;
pub use template::RequestTemplate;

/// Raw payload for one point, or the reason it could not be obtained
pub type LookupOutcome = Result<Value, LookupError>;

/// Capability that queries the facility service at a single point.
#[async_trait]
pub trait FacilityLookup: Send + Sync {
    async fn lookup(&self, point: SamplePoint) -> LookupOutcome;
}
