//! JSON log files: one file per command run, never read back.
//!
//! Records are written pretty-printed (two-space indent) to
//! `<logs_dir>/<filename>`, replacing any earlier file of the same name.

use crate::error::XeoError;
use crate::sanitize::{sanitize_name, to_valid_filename, DEFAULT_REPLACEMENT};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Log file written by the `health` command.
pub const HEALTH_LOG_FILE: &str = "health.log.json";

/// `<sanitised input name>-convert-request.log.json`
pub fn convert_log_filename(input_path: &str) -> String {
    format!(
        "{}-convert-request.log.json",
        to_valid_filename(input_path, DEFAULT_REPLACEMENT)
    )
}

/// `<process id>-process-status.log.json`, with the id made file-name safe.
pub fn process_log_filename(process_id: &str) -> String {
    format!(
        "{}-process-status.log.json",
        sanitize_name(process_id, DEFAULT_REPLACEMENT)
    )
}

/// A log record together with the file it was written to.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenLog<T> {
    pub path: PathBuf,
    pub record: T,
}

/// Serialise `record` and write it to `<directory>/<filename>`.
///
/// Creates `directory` when missing. The JSON goes to a short uniquely named
/// temp file first and is renamed into place, so a crash never leaves a
/// half-written log behind and a 255-byte `filename` still fits. Returns the
/// final path.
pub async fn write_log<T: Serialize + ?Sized>(
    directory: impl AsRef<Path>,
    filename: &str,
    record: &T,
) -> Result<PathBuf, XeoError> {
    let directory = directory.as_ref();
    let path = directory.join(filename);
    let write_failed = |source: std::io::Error| XeoError::LogWriteFailed {
        path: path.clone(),
        source,
    };

    let json = serde_json::to_string_pretty(record)
        .map_err(|e| write_failed(std::io::Error::other(e)))?;

    tokio::fs::create_dir_all(directory)
        .await
        .map_err(write_failed)?;

    let tmp_path = tempfile::Builder::new()
        .prefix(".log-")
        .suffix(".tmp")
        .tempfile_in(directory)
        .map_err(write_failed)?
        .into_temp_path();
    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(write_failed)?;
    tmp_path
        .persist(&path)
        .map_err(|e| write_failed(e.error))?;

    info!(path = %path.display(), "Log written");
    Ok(path)
}
