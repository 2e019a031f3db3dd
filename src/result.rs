use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level error carried by the snapshot served before any cycle finished.
pub const NO_DATA_YET: &str = "no data yet";

/// Top-level error carried once the engine has been stopped.
pub const NOT_RUNNING: &str = "scraper is not running";

/// Aggregate outcome of one scrape cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    /// Sequence number of the cycle, starting at 1. The sentinel uses 0.
    pub cycle: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub endpoints: BTreeMap<String, EndpointResult>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EndpointResult {
    Fields(BTreeMap<String, FieldResult>),
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldResult {
    Values(Vec<String>),
    Error(String),
}

impl ScrapeResult {
    /// Snapshot served before the first cycle has completed.
    pub fn no_data() -> Self {
        Self {
            cycle: 0,
            timestamp: None,
            endpoints: BTreeMap::new(),
            error: Some(NO_DATA_YET.to_string()),
        }
    }

    pub fn completed(cycle: u64, endpoints: BTreeMap<String, EndpointResult>) -> Self {
        Self {
            cycle,
            timestamp: Some(Utc::now()),
            endpoints,
            error: None,
        }
    }

    /// True until a cycle has been published.
    pub fn is_placeholder(&self) -> bool {
        self.cycle == 0
    }

    pub fn endpoint(&self, url: &str) -> Option<&EndpointResult> {
        self.endpoints.get(url)
    }

    pub fn failed_endpoints(&self) -> usize {
        self.endpoints
            .values()
            .filter(|e| matches!(e, EndpointResult::Failure(_)))
            .count()
    }
}

impl Default for ScrapeResult {
    fn default() -> Self {
        Self::no_data()
    }
}

impl EndpointResult {
    pub fn fields(&self) -> Option<&BTreeMap<String, FieldResult>> {
        match self {
            EndpointResult::Fields(fields) => Some(fields),
            EndpointResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            EndpointResult::Failure(reason) => Some(reason),
            EndpointResult::Fields(_) => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldResult> {
        self.fields().and_then(|fields| fields.get(name))
    }
}

impl FieldResult {
    pub fn values(&self) -> Option<&[String]> {
        match self {
            FieldResult::Values(values) => Some(values),
            FieldResult::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FieldResult::Error(_))
    }
}
