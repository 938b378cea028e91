//! Upload: push a local file to the storage service.
//!
//! Two requests, in order:
//!
//! 1. `POST file {name, parts: 1}` on the storage service, which must answer
//!    201 with an [`UploadTarget`] holding the file-entry id and a pre-signed
//!    URL per part;
//! 2. `PUT <parts[0].uploadUrl>` with the raw file bytes.
//!
//! The pre-signed URL carries its own authorisation, so the PUT goes to the
//! URL verbatim without the storage base URL or bearer token.

use crate::client::{decode_json, expect_status, ServiceClient};
use crate::error::XeoError;
use crate::model::{UploadRequest, UploadTarget};
use reqwest::StatusCode;
use std::path::Path;
use tracing::{error, info};

const UPLOAD_PATH: &str = "file";

/// Upload `file_path` and return the server's upload target.
///
/// # Errors
/// - [`XeoError::FileNotFound`] when the file does not exist (no request is sent)
/// - [`XeoError::UploadLinkFailed`] when `POST file` does not answer 201
/// - [`XeoError::InvalidResponse`] when the body is malformed or has no parts
/// - [`XeoError::ReadFailed`] when the file cannot be read
/// - [`XeoError::UploadFailed`] when the PUT fails
pub async fn upload_file(
    storage: &ServiceClient,
    file_path: impl AsRef<Path>,
) -> Result<UploadTarget, XeoError> {
    let target = create_upload_link(storage, file_path.as_ref()).await?;
    put_file(storage, &target, file_path.as_ref()).await?;
    Ok(target)
}

/// `POST file` for `file_path`; checks the file exists first.
pub async fn create_upload_link(
    storage: &ServiceClient,
    file_path: &Path,
) -> Result<UploadTarget, XeoError> {
    if !file_path.is_file() {
        error!(path = %file_path.display(), "File not found");
        return Err(XeoError::FileNotFound {
            path: file_path.to_path_buf(),
        });
    }

    let request = UploadRequest::single_part(upload_name(file_path));
    let response = expect_status(
        storage.post_json(&[UPLOAD_PATH], &request).await,
        StatusCode::CREATED,
    )
    .await
    .map_err(|f| {
        error!(error = %f, "Failed to create upload link");
        XeoError::UploadLinkFailed(f)
    })?;

    let target: UploadTarget = decode_json(response, "create upload link").await?;
    if target.parts.is_empty() {
        return Err(XeoError::InvalidResponse {
            operation: "create upload link",
            detail: "response contains no upload parts".into(),
        });
    }

    info!(file_id = %target.id, name = %request.name, "Upload link created successfully");
    Ok(target)
}

/// `PUT` the file bytes to the target's first pre-signed URL.
pub async fn put_file(
    storage: &ServiceClient,
    target: &UploadTarget,
    file_path: &Path,
) -> Result<(), XeoError> {
    let url = target.upload_url().ok_or_else(|| XeoError::InvalidResponse {
        operation: "create upload link",
        detail: "response contains no upload parts".into(),
    })?;

    let bytes = tokio::fs::read(file_path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            XeoError::FileNotFound {
                path: file_path.to_path_buf(),
            }
        } else {
            XeoError::ReadFailed {
                path: file_path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let size = bytes.len();

    storage.put_presigned(url, bytes).await.map_err(|f| {
        error!(error = %f, file_id = %target.id, "Upload failed");
        XeoError::UploadFailed(f)
    })?;

    info!(file_id = %target.id, size, "File uploaded");
    Ok(())
}

/// Name announced to the storage service: the file's last path component.
fn upload_name(file_path: &Path) -> String {
    file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
