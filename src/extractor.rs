use crate::error::ExtractionError;
use crate::result::FieldResult;
use crate::selector::Selector;
use chadselect::ChadSelect;
use std::collections::BTreeMap;

/// Text of every node matched by a selector, in document order.
pub type ExtractedValue = Vec<String>;

/// A fetched body loaded into the extraction engine, ready to be queried by
/// any number of selectors.
pub struct Document {
    cs: ChadSelect,
}

impl Document {
    pub fn parse(body: &[u8]) -> Result<Self, ExtractionError> {
        let html = std::str::from_utf8(body)
            .map_err(|e| ExtractionError::UnparsableDocument(e.to_string()))?;

        let mut cs = ChadSelect::new();
        cs.add_html(html.to_string());
        Ok(Self { cs })
    }

    /// Runs one selector. Zero matches is an empty value, not an error; the
    /// pattern was checked when the `Selector` was built.
    pub fn select(&mut self, selector: &Selector) -> ExtractedValue {
        self.cs
            .query(-1, &selector.to_query())
            .into_iter()
            .map(|value| value.trim().to_string())
            .collect()
    }
}

/// Applies a single selector to a document body.
pub fn extract(body: &[u8], selector: &Selector) -> Result<ExtractedValue, ExtractionError> {
    Ok(Document::parse(body)?.select(selector))
}

/// Applies every selector to `body`, recording failures per field.
pub fn extract_fields(body: &[u8], selectors: &[Selector]) -> BTreeMap<String, FieldResult> {
    let mut document = match Document::parse(body) {
        Ok(document) => document,
        Err(e) => {
            return selectors
                .iter()
                .map(|s| (s.name().to_string(), FieldResult::Error(e.to_string())))
                .collect();
        }
    };

    selectors
        .iter()
        .map(|selector| {
            let values = document.select(selector);
            log::debug!("Field '{}' matched {} node(s)", selector.name(), values.len());
            (selector.name().to_string(), FieldResult::Values(values))
        })
        .collect()
}
