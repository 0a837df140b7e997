//! Call options. Both structs load from camelCase configuration, e.g.
//! `{"captureSpans": true, "budgets": {"maxNodes": 5000}}`.

use crate::budget::Budgets;
use serde::Deserialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseOptions {
    /// Attach input spans to nodes.
    #[serde(alias = "includeSpans")]
    pub capture_spans: bool,
    /// Record a structured trace on the returned tree.
    pub trace: bool,
    /// Encoding label supplied by the transport, used by byte and stream
    /// entry points.
    pub transport_encoding_label: Option<String>,
    pub budgets: Budgets,
}

impl ParseOptions {
    pub fn with_spans() -> Self {
        Self {
            capture_spans: true,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenizeOptions {
    pub transport_encoding_label: Option<String>,
    pub budgets: Budgets,
}
