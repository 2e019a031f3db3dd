use serde::{Deserialize, Serialize};
use validator::Validate;

/// On-disk shape of a scrape configuration.
///
/// Field names are camelCase; the all-lowercase spelling used by older YAML
/// files (`scrapeintervalinseconds`, `typeofselector`, ...) is accepted too.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeConfigFile {
    #[serde(alias = "scrapeintervalinseconds")]
    #[validate(range(min = 1))]
    pub scrape_interval_in_seconds: i64,

    #[serde(default, alias = "scrapeendpoints")]
    pub scrape_endpoints: Vec<EndpointSpec>,

    #[serde(default, alias = "requesttimeoutinseconds")]
    #[validate(range(min = 1))]
    pub request_timeout_in_seconds: Option<u64>,

    #[serde(default, alias = "maxconcurrency")]
    #[validate(range(min = 1))]
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSpec {
    #[validate(length(min = 1))]
    pub endpoint: String,

    #[serde(default)]
    pub selectors: Vec<SelectorSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SelectorSpec {
    #[validate(length(min = 1))]
    pub name: String,

    #[serde(alias = "typeofselector")]
    pub type_of_selector: String,

    pub value: String,
}

pub(crate) fn default_request_timeout() -> u64 {
    10
}
