use crate::error::{ConfigError, ExtractionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator the extraction engine uses to chain post-processing functions
/// onto a query; a pattern containing it would be split apart.
const PIPE_DELIMITER: &str = ">>";

/// The query language a selector's pattern is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    /// XPath 1.0, evaluated against the document parsed as HTML.
    Xpath,

    /// CSS selector (e.g. "div.quote > span")
    Css,

    /// Regular expression over the raw document text.
    Regex,
}

impl SelectorKind {
    /// Prefix understood by the extraction engine for this query language.
    pub fn query_prefix(self) -> &'static str {
        match self {
            SelectorKind::Xpath => "xpath",
            SelectorKind::Css => "css",
            SelectorKind::Regex => "regex",
        }
    }

    /// Checks that `pattern` compiles for this kind without touching a document.
    pub fn validate(self, pattern: &str) -> Result<(), ExtractionError> {
        let invalid = |message: String| ExtractionError::InvalidPattern {
            kind: self,
            pattern: pattern.to_string(),
            message,
        };

        if pattern.trim().is_empty() {
            return Err(invalid("pattern is empty".to_string()));
        }
        if pattern.contains(PIPE_DELIMITER) {
            return Err(invalid(format!(
                "'{}' is reserved by the extraction engine",
                PIPE_DELIMITER
            )));
        }

        match self {
            SelectorKind::Xpath => sxd_xpath::Factory::new()
                .build(pattern)
                .map(|_| ())
                .map_err(|e| invalid(e.to_string())),
            SelectorKind::Css => scraper::Selector::parse(pattern)
                .map(|_| ())
                .map_err(|e| invalid(format!("{:?}", e))),
            SelectorKind::Regex => regex::Regex::new(pattern)
                .map(|_| ())
                .map_err(|e| invalid(e.to_string())),
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_prefix())
    }
}

impl FromStr for SelectorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xpath" => Ok(SelectorKind::Xpath),
            "css" => Ok(SelectorKind::Css),
            "regex" => Ok(SelectorKind::Regex),
            _ => Err(ConfigError::UnknownSelectorKind(s.to_string())),
        }
    }
}

/// A named extraction rule. Only [`Selector::new`] builds one, so the pattern
/// of every `Selector` has already been validated for its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selector {
    name: String,
    kind: SelectorKind,
    pattern: String,
}

impl Selector {
    pub fn new(
        name: impl Into<String>,
        kind: SelectorKind,
        pattern: impl Into<String>,
    ) -> Result<Self, ExtractionError> {
        let pattern = pattern.into();
        kind.validate(&pattern)?;
        Ok(Self {
            name: name.into(),
            kind,
            pattern,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SelectorKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Query string in the `<kind>:<pattern>` form the extraction engine expects.
    pub fn to_query(&self) -> String {
        format!("{}:{}", self.kind.query_prefix(), self.pattern)
    }
}
