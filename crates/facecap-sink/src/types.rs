//! Sink response types.

use serde::{Deserialize, Serialize};

/// Body returned by the ingestion endpoint.
///
/// The endpoint's schema is not fixed; only the presence of a JSON document
/// is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SinkResponse(pub serde_json::Value);

impl SinkResponse {
    /// Borrow the raw JSON document.
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}
