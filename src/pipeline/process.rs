//! Process status: re-fetch a conversion job by id.

use crate::client::{decode_json, expect_status, ServiceClient};
use crate::error::XeoError;
use crate::model::ConversionJob;
use reqwest::StatusCode;
use tracing::{error, info};

/// `GET process/{process_id}` on the converter service; expects 200.
pub async fn get_process_status(
    converter: &ServiceClient,
    process_id: &str,
) -> Result<ConversionJob, XeoError> {
    let response = expect_status(converter.get(&["process", process_id]).await, StatusCode::OK)
        .await
        .map_err(|failure| {
            error!(error = %failure, process_id, "Error checking process status");
            XeoError::StatusFetchFailed {
                process_id: process_id.to_string(),
                failure,
            }
        })?;

    let job: ConversionJob = decode_json(response, "fetch process status").await?;
    info!(process_id = %job.id, "Process status fetched successfully");
    Ok(job)
}
