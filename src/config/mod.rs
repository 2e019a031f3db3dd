pub mod loader;
pub mod model;
pub mod schema;

pub use loader::{parse_config, ConfigLoader};
pub use model::{Config, Endpoint};
pub use schema::{EndpointSpec, ScrapeConfigFile, SelectorSpec};
