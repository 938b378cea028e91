//! Health: query `GET health` on both services.
//!
//! The converter is checked first, then storage. A failing converter stops
//! the check before storage is contacted; the returned error names the
//! service that failed.

use crate::client::{expect_status, Service, ServiceClient};
use crate::error::XeoError;
use crate::model::HealthReport;
use reqwest::{Response, StatusCode};
use serde_json::{Map, Value};
use tracing::{error, info};

const HEALTH_PATH: &str = "health";

/// Check the converter, then storage, and combine both bodies.
pub async fn check_health(
    storage: &ServiceClient,
    converter: &ServiceClient,
) -> Result<HealthReport, XeoError> {
    let timestamp = chrono::Utc::now();
    let converter_status = service_health(converter).await?;
    let storage_status = service_health(storage).await?;

    Ok(HealthReport {
        timestamp,
        converter_status,
        storage_status,
    })
}

async fn service_health(client: &ServiceClient) -> Result<Value, XeoError> {
    let service: Service = client.service();
    let response = expect_status(client.get(&[HEALTH_PATH]).await, StatusCode::OK)
        .await
        .map_err(|failure| {
            error!(error = %failure, %service, "Health check failed");
            XeoError::HealthCheckFailed { service, failure }
        })?;

    let body = health_body(response).await?;
    info!(%service, "Fetched health status");
    Ok(body)
}

/// Some deployments answer 200 with an empty body; treat that as `{}`.
async fn health_body(response: Response) -> Result<Value, XeoError> {
    let invalid = |detail: String| {
        error!(error = %detail, "Invalid health response body");
        XeoError::InvalidResponse {
            operation: "health check",
            detail,
        }
    };
    let text = response.text().await.map_err(|e| invalid(e.to_string()))?;
    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))
}
