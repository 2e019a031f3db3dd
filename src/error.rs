use crate::engine::EngineState;
use crate::selector::SelectorKind;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raised while turning a configuration document into a [`crate::Config`].
/// Fatal: an engine is never built from a configuration that fails here.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file extension: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid endpoint URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Endpoint URL '{0}' must use http or https")]
    UnsupportedScheme(String),

    #[error("Endpoint '{0}' is configured more than once")]
    DuplicateEndpoint(String),

    #[error("Selector name for endpoint '{0}' is blank")]
    BlankSelectorName(String),

    #[error("Selector '{name}' is defined more than once for endpoint '{endpoint}'")]
    DuplicateSelector { endpoint: String, name: String },

    #[error("Unknown selector type '{0}'")]
    UnknownSelectorKind(String),

    #[error("Selector '{name}' for endpoint '{endpoint}': {source}")]
    InvalidPattern {
        endpoint: String,
        name: String,
        #[source]
        source: ExtractionError,
    },
}

/// A single GET that did not produce a usable body.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("Connection to {url} failed: {message}")]
    Connect { url: String, message: String },

    #[error("Request to {url} timed out after {}s", .timeout.as_secs_f64())]
    Timeout { url: String, timeout: Duration },

    #[error("HTTP {status} from {url}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Failed to read response body from {url}: {message}")]
    Body { url: String, message: String },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("HTTP client error: {0}")]
    Client(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("invalid {kind} pattern '{pattern}': {message}")]
    InvalidPattern {
        kind: SelectorKind,
        pattern: String,
        message: String,
    },

    #[error("unparsable document: {0}")]
    UnparsableDocument(String),
}

/// Misuse of the engine's start/stop contract.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("engine cannot be started from state {0:?}")]
    AlreadyStarted(EngineState),

    #[error("engine is not running (state {0:?})")]
    NotRunning(EngineState),

    #[error("engine must be started from within a tokio runtime")]
    NoRuntime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_keeps_diagnostics() {
        let err = FetchError::Status {
            url: "http://example.com/".into(),
            status: 503,
            body: "maintenance".into(),
        };
        assert_eq!(err.to_string(), "HTTP 503 from http://example.com/");
        if let FetchError::Status { body, .. } = err {
            assert_eq!(body, "maintenance");
        }
    }

    #[test]
    fn lifecycle_errors_name_the_state() {
        let err = LifecycleError::AlreadyStarted(EngineState::Running);
        assert!(err.to_string().contains("Running"));
    }
}
