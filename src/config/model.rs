use crate::config::schema::{default_request_timeout, EndpointSpec, ScrapeConfigFile};
use crate::error::ConfigError;
use crate::selector::{Selector, SelectorKind};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Validated, immutable scrape configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub interval: Duration,
    pub request_timeout: Duration,
    pub max_concurrency: Option<usize>,
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: Url,
    pub selectors: Vec<Selector>,
}

impl Config {
    /// Number of endpoints fetched at the same time during one cycle.
    pub fn concurrency(&self) -> usize {
        self.max_concurrency
            .unwrap_or(self.endpoints.len())
            .max(1)
    }
}

impl TryFrom<ScrapeConfigFile> for Config {
    type Error = ConfigError;

    fn try_from(file: ScrapeConfigFile) -> Result<Self, Self::Error> {
        file.validate()?;

        let mut seen = HashSet::new();
        let mut endpoints = Vec::with_capacity(file.scrape_endpoints.len());
        for spec in file.scrape_endpoints {
            let endpoint = Endpoint::try_from(spec)?;
            if !seen.insert(endpoint.url.clone()) {
                return Err(ConfigError::DuplicateEndpoint(endpoint.url.to_string()));
            }
            endpoints.push(endpoint);
        }

        // range(min = 1) has already rejected non-positive intervals
        let interval = Duration::from_secs(file.scrape_interval_in_seconds as u64);
        let timeout = file
            .request_timeout_in_seconds
            .unwrap_or_else(default_request_timeout);

        Ok(Config {
            interval,
            request_timeout: Duration::from_secs(timeout),
            max_concurrency: file.max_concurrency,
            endpoints,
        })
    }
}

impl TryFrom<EndpointSpec> for Endpoint {
    type Error = ConfigError;

    fn try_from(spec: EndpointSpec) -> Result<Self, Self::Error> {
        spec.validate()?;

        let url = Url::parse(spec.endpoint.trim()).map_err(|source| ConfigError::InvalidUrl {
            url: spec.endpoint.clone(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(spec.endpoint));
        }

        let mut names = HashSet::new();
        let mut selectors = Vec::with_capacity(spec.selectors.len());
        for selector in spec.selectors {
            selector.validate()?;
            let name = selector.name.trim().to_string();
            if name.is_empty() {
                return Err(ConfigError::BlankSelectorName(url.to_string()));
            }
            if !names.insert(name.clone()) {
                return Err(ConfigError::DuplicateSelector {
                    endpoint: url.to_string(),
                    name,
                });
            }

            let kind: SelectorKind = selector.type_of_selector.parse()?;
            let compiled = Selector::new(name.clone(), kind, selector.value).map_err(|source| {
                ConfigError::InvalidPattern {
                    endpoint: url.to_string(),
                    name,
                    source,
                }
            })?;
            selectors.push(compiled);
        }

        Ok(Endpoint { url, selectors })
    }
}
