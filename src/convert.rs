//! Command-level workflows.
//!
//! Each workflow runs its remote calls strictly in order and stops at the
//! first failure. Nothing is rolled back: a file uploaded before a failing
//! metadata lookup stays in storage.
//!
//! The `*_to_log` variants are what the CLI runs: workflow first, then the
//! JSON log. They hand back the in-memory record next to the path it was
//! written to. When the workflow fails no log is written.

use crate::client::ServiceClients;
use crate::error::XeoError;
use crate::logger::{
    convert_log_filename, process_log_filename, write_log, WrittenLog, HEALTH_LOG_FILE,
};
use crate::model::{ConvertRequestLog, HealthReport, LogRecord, ProcessStatusLog};
use crate::pipeline::{conversion, health, metadata, process, upload};
use crate::progress::WorkflowStep;
use chrono::Utc;
use std::future::Future;
use std::path::Path;
use tracing::info;

/// Upload an IFC file, look up its download URL and start an IFC→XKT job.
///
/// Requests the configured conversion type (`ifc-xkt` unless overridden);
/// see [`convert_with_type`] to pass one explicitly.
pub async fn convert_ifc_to_xkt(
    clients: &ServiceClients,
    file_path: impl AsRef<Path>,
) -> Result<LogRecord<ConvertRequestLog>, XeoError> {
    convert_with_type(clients, file_path, &clients.conversion_type).await
}

/// Same as [`convert_ifc_to_xkt`] with an explicit conversion type.
pub async fn convert_with_type(
    clients: &ServiceClients,
    file_path: impl AsRef<Path>,
    kind: &str,
) -> Result<LogRecord<ConvertRequestLog>, XeoError> {
    let file_path = file_path.as_ref();
    let timestamp = Utc::now();
    info!(path = %file_path.display(), kind, "Starting conversion request");

    // ── Step 1: Upload ───────────────────────────────────────────────────
    let file_upload = step(clients, WorkflowStep::CreateUploadLink, async {
        upload::create_upload_link(&clients.storage, file_path).await
    })
    .await?;
    step(clients, WorkflowStep::UploadFile, async {
        upload::put_file(&clients.storage, &file_upload, file_path).await
    })
    .await?;

    // ── Step 2: Metadata ─────────────────────────────────────────────────
    let file_entry = step(clients, WorkflowStep::FetchFileEntry, async {
        metadata::get_file_entry(&clients.storage, &file_upload.id).await
    })
    .await?;

    // ── Step 3: Conversion ───────────────────────────────────────────────
    let process_entry = step(clients, WorkflowStep::StartConversion, async {
        conversion::create_conversion_job(&clients.converter, &file_entry.download_url, kind)
            .await
    })
    .await?;

    Ok(LogRecord::new(
        timestamp,
        ConvertRequestLog {
            file_upload,
            file_entry,
            process_entry,
        },
    ))
}

/// Fetch the current state of a conversion process.
pub async fn check_process(
    clients: &ServiceClients,
    process_id: &str,
) -> Result<LogRecord<ProcessStatusLog>, XeoError> {
    let timestamp = Utc::now();
    let process_response = step(clients, WorkflowStep::FetchProcessStatus, async {
        process::get_process_status(&clients.converter, process_id).await
    })
    .await?;

    Ok(LogRecord::new(timestamp, ProcessStatusLog { process_response }))
}

/// Check both services' health, converter first.
pub async fn check_services_health(clients: &ServiceClients) -> Result<HealthReport, XeoError> {
    step(clients, WorkflowStep::CheckHealth, async {
        health::check_health(&clients.storage, &clients.converter).await
    })
    .await
}

/// Run [`convert_ifc_to_xkt`] and write
/// `<logs_dir>/<name>-convert-request.log.json`.
pub async fn convert_ifc_to_xkt_to_log(
    clients: &ServiceClients,
    file_path: &str,
    logs_dir: impl AsRef<Path>,
) -> Result<WrittenLog<LogRecord<ConvertRequestLog>>, XeoError> {
    let record = convert_ifc_to_xkt(clients, file_path).await?;
    let filename = convert_log_filename(file_path);
    let path = step(clients, WorkflowStep::WriteLog, async {
        write_log(logs_dir, &filename, &record).await
    })
    .await?;
    Ok(WrittenLog { path, record })
}

/// Run [`check_process`] and write `<logs_dir>/<id>-process-status.log.json`.
pub async fn check_process_to_log(
    clients: &ServiceClients,
    process_id: &str,
    logs_dir: impl AsRef<Path>,
) -> Result<WrittenLog<LogRecord<ProcessStatusLog>>, XeoError> {
    let record = check_process(clients, process_id).await?;
    let filename = process_log_filename(process_id);
    let path = step(clients, WorkflowStep::WriteLog, async {
        write_log(logs_dir, &filename, &record).await
    })
    .await?;
    Ok(WrittenLog { path, record })
}

/// Run [`check_services_health`] and write `<logs_dir>/health.log.json`.
pub async fn check_health_to_log(
    clients: &ServiceClients,
    logs_dir: impl AsRef<Path>,
) -> Result<WrittenLog<HealthReport>, XeoError> {
    let report = check_services_health(clients).await?;
    let path = step(clients, WorkflowStep::WriteLog, async {
        write_log(logs_dir, HEALTH_LOG_FILE, &report).await
    })
    .await?;
    Ok(WrittenLog {
        path,
        record: report,
    })
}

/// Await `fut`, reporting start/complete/error for `which` to the progress
/// callback when one is configured.
async fn step<T, F>(clients: &ServiceClients, which: WorkflowStep, fut: F) -> Result<T, XeoError>
where
    F: Future<Output = Result<T, XeoError>>,
{
    if let Some(ref cb) = clients.progress {
        cb.on_step_start(which);
    }
    let result = fut.await;
    if let Some(ref cb) = clients.progress {
        match &result {
            Ok(_) => cb.on_step_complete(which),
            Err(e) => cb.on_step_error(which, &e.to_string()),
        }
    }
    result
}
