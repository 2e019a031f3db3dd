pub mod config;
pub mod cycle;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod metrics;
pub mod result;
pub mod selector;
pub mod server;
pub mod store;

pub use config::{parse_config, Config, ConfigLoader, Endpoint};
pub use cycle::run_cycle;
pub use engine::{EngineState, ScrapeEngine};
pub use error::{ConfigError, Error, ExtractionError, FetchError, LifecycleError, Result};
pub use extractor::{extract, ExtractedValue};
pub use fetcher::{FetchedPage, Fetcher, HttpFetcher};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use result::{EndpointResult, FieldResult, ScrapeResult};
pub use selector::{Selector, SelectorKind};
pub use store::ResultStore;
