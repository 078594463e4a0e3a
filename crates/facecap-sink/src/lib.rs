//! Client for the remote ingestion endpoint.
//!
//! Captured faces are posted as `{ "image": <base64>, "timestamp": <ISO-8601> }`
//! and the endpoint answers with a JSON document that is logged but not
//! otherwise interpreted. There are no automatic retries; a failed submission
//! is reported to the caller as is.

pub mod client;
pub mod error;
pub mod types;

pub use client::{PayloadSink, SinkClient, SinkConfig};
pub use error::{SinkError, SinkResult};
pub use types::SinkResponse;
