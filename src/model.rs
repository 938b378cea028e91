//! Request and response records exchanged with the services, and the log
//! records written to disk.
//!
//! Response shapes are owned by the services. Each record names only the
//! fields this crate reads and keeps everything else in an `extra` map, so a
//! parsed body serialises back to the same JSON and logs show exactly what
//! the server sent.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Body of `POST file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadRequest {
    pub name: String,
    /// Always 1: uploads are single-part.
    pub parts: u32,
}

impl UploadRequest {
    pub fn single_part(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parts: 1,
        }
    }
}

/// One pre-signed upload slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPart {
    pub upload_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `POST file` (HTTP 201).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadTarget {
    /// File-entry id.
    pub id: String,
    pub parts: Vec<UploadPart>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UploadTarget {
    /// URL of the first (and only used) part.
    pub fn upload_url(&self) -> Option<&str> {
        self.parts.first().map(|p| p.upload_url.as_str())
    }
}

/// Response of `GET file/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub id: String,
    pub download_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST process`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    pub download_url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A conversion process as returned by `POST process` and `GET process/{id}`.
///
/// The server decides which status fields are present; only `id` is
/// guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionJob {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Combined health of both services.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    #[serde(serialize_with = "iso_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub converter_status: Value,
    pub storage_status: Value,
}

/// A timestamped log payload.
///
/// The payload's fields are written next to `timestamp`:
/// `{"timestamp": "...", "fileUpload": {...}, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord<T> {
    #[serde(serialize_with = "iso_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: T,
}

impl<T> LogRecord<T> {
    pub fn new(timestamp: DateTime<Utc>, payload: T) -> Self {
        Self { timestamp, payload }
    }
}

/// Everything produced by `convert-ifc-xkt`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequestLog {
    pub file_upload: UploadTarget,
    pub file_entry: FileEntry,
    /// Key spelled `procesEntry` in the on-disk format.
    #[serde(rename = "procesEntry")]
    pub process_entry: ConversionJob,
}

/// Everything produced by `check-process`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessStatusLog {
    pub process_response: ConversionJob,
}

/// ISO-8601 UTC with milliseconds, e.g. `2025-01-31T09:15:02.123Z`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn iso_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}
