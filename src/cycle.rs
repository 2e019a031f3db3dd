use crate::config::{Config, Endpoint};
use crate::extractor::extract_fields;
use crate::fetcher::Fetcher;
use crate::result::{EndpointResult, ScrapeResult};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

type EndpointFuture<'a> = Pin<Box<dyn Future<Output = (String, EndpointResult)> + Send + 'a>>;

/// Runs one scrape cycle over every configured endpoint.
///
/// Never fails: a fetch failure is recorded against its endpoint and an
/// extraction failure against its field, so the result always has exactly one
/// entry per endpoint. Endpoints are processed concurrently, up to
/// [`Config::concurrency`] at a time.
pub async fn run_cycle(config: &Config, fetcher: &dyn Fetcher, cycle: u64) -> ScrapeResult {
    let start_time = Instant::now();
    log::info!(
        "Starting scrape cycle {} over {} endpoint(s)",
        cycle,
        config.endpoints.len()
    );

    let timeout = config.request_timeout;
    let pending: Vec<EndpointFuture<'_>> = config
        .endpoints
        .iter()
        .map(|endpoint| -> EndpointFuture<'_> {
            Box::pin(async move {
                let result = scrape_endpoint(endpoint, fetcher, timeout).await;
                (endpoint.url.to_string(), result)
            })
        })
        .collect();

    let endpoints: BTreeMap<String, EndpointResult> = stream::iter(pending)
        .buffer_unordered(config.concurrency())
        .collect()
        .await;

    let result = ScrapeResult::completed(cycle, endpoints);
    log::info!(
        "Scrape cycle {} finished in {}ms ({} of {} endpoint(s) failed)",
        cycle,
        start_time.elapsed().as_millis(),
        result.failed_endpoints(),
        result.endpoints.len()
    );
    result
}

async fn scrape_endpoint(
    endpoint: &Endpoint,
    fetcher: &dyn Fetcher,
    timeout: Duration,
) -> EndpointResult {
    match fetcher.fetch(&endpoint.url, timeout).await {
        Ok(page) => EndpointResult::Fields(extract_fields(&page.body, &endpoint.selectors)),
        Err(e) => {
            log::warn!("Failed to scrape {}: {}", endpoint.url, e);
            EndpointResult::Failure(e.to_string())
        }
    }
}
