//! Capture lifecycle phases and the ingestion payload.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Phase of the capture pipeline.
///
/// `Idle → Capturing → (Cropping | Encoding) → Submitting → Idle`, with
/// `Errored` reachable from any non-idle phase before returning to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CapturePhase {
    #[default]
    Idle,
    /// Acquiring the full-resolution photo.
    Capturing,
    /// Mapping bounds into photo space and cropping.
    Cropping,
    /// Encoding the full photo without a crop.
    Encoding,
    /// Posting the payload to the ingestion endpoint.
    Submitting,
    /// The attempt failed; the pipeline returns to `Idle` right after.
    Errored,
}

impl CapturePhase {
    /// Phase label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            CapturePhase::Idle => "idle",
            CapturePhase::Capturing => "capturing",
            CapturePhase::Cropping => "cropping",
            CapturePhase::Encoding => "encoding",
            CapturePhase::Submitting => "submitting",
            CapturePhase::Errored => "errored",
        }
    }

    /// Whether an attempt is in flight in this phase.
    pub fn is_busy(&self) -> bool {
        !matches!(self, CapturePhase::Idle | CapturePhase::Errored)
    }
}

impl fmt::Display for CapturePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON body posted to the ingestion endpoint.
///
/// Serializes as `{"image": "<base64>", "timestamp": "2024-05-01T10:00:00.000Z"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturePayload {
    /// Base64-encoded image (standard alphabet, padded, no data-URL prefix)
    pub image: String,
    /// Capture time, ISO-8601 with millisecond precision
    #[serde(serialize_with = "serialize_millis", deserialize_with = "deserialize_rfc3339")]
    pub timestamp: DateTime<Utc>,
}

impl CapturePayload {
    /// Create a payload stamped with the current time.
    pub fn now(image: String) -> Self {
        Self {
            image,
            timestamp: Utc::now(),
        }
    }

    /// Length of the encoded image in characters.
    pub fn image_len(&self) -> usize {
        self.image.len()
    }
}

fn serialize_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn deserialize_rfc3339<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}
