//! Metadata lookup: fetch a file entry (and its download URL) by id.

use crate::client::{decode_json, expect_status, ServiceClient};
use crate::error::XeoError;
use crate::model::FileEntry;
use reqwest::StatusCode;
use tracing::{error, info};

/// `GET file/{file_entry_id}` on the storage service; expects 200.
pub async fn get_file_entry(
    storage: &ServiceClient,
    file_entry_id: &str,
) -> Result<FileEntry, XeoError> {
    let response = expect_status(storage.get(&["file", file_entry_id]).await, StatusCode::OK)
        .await
        .map_err(|failure| {
            error!(error = %failure, file_id = file_entry_id, "Failed to fetch file entry metadata");
            XeoError::MetadataFetchFailed {
                file_id: file_entry_id.to_string(),
                failure,
            }
        })?;

    let entry: FileEntry = decode_json(response, "fetch file entry").await?;
    info!(file_id = %entry.id, "File entry metadata fetched successfully");
    Ok(entry)
}
