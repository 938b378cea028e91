//! Conversion: ask the converter service to start a job for a download URL.

use crate::client::{decode_json, expect_status, ServiceClient};
use crate::error::XeoError;
use crate::model::{ConversionJob, ConversionRequest};
use reqwest::StatusCode;
use tracing::{error, info};

const CONVERSION_PATH: &str = "process";

/// `POST process {downloadUrl, type}` on the converter service; expects 201.
///
/// `kind` is the conversion type, `ifc-xkt` for IFC models.
pub async fn create_conversion_job(
    converter: &ServiceClient,
    download_url: &str,
    kind: &str,
) -> Result<ConversionJob, XeoError> {
    let request = ConversionRequest {
        download_url: download_url.to_string(),
        kind: kind.to_string(),
    };

    let response = expect_status(
        converter.post_json(&[CONVERSION_PATH], &request).await,
        StatusCode::CREATED,
    )
    .await
    .map_err(|f| {
        error!(error = %f, kind, "Failed to start conversion");
        XeoError::ConversionStartFailed(f)
    })?;

    let job: ConversionJob = decode_json(response, "start conversion").await?;
    info!(process_id = %job.id, kind, "Conversion started successfully");
    Ok(job)
}
