//! # xeoservices
//!
//! Upload IFC models to the xeo storage service, start IFC→XKT conversions
//! on the xeo converter service, and check on them later.
//!
//! ## Workflow Overview
//!
//! ```text
//! model.ifc
//!  │
//!  ├─ 1. Upload    POST file → pre-signed PUT of the bytes   (storage)
//!  ├─ 2. Metadata  GET file/{id} → download URL              (storage)
//!  ├─ 3. Convert   POST process {downloadUrl, type}          (converter)
//!  └─ 4. Log       logs/<model>-convert-request.log.json
//! ```
//!
//! `check-process` re-fetches a job with `GET process/{id}`; `health` queries
//! `GET health` on the converter and then on storage.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xeoservices::{convert_ifc_to_xkt, create_clients, ServicesConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads XEO_SERVICES_ACCESS_TOKEN
//!     let config = ServicesConfig::from_env()?;
//!     let clients = create_clients(&config)?;
//!     let record = convert_ifc_to_xkt(&clients, "model.ifc").await?;
//!     println!("process id: {}", record.payload.process_entry.id);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `xeoservices` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! xeoservices = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod logger;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod sanitize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{create_clients, Service, ServiceClient, ServiceClients};
pub use config::{ServicesConfig, ServicesConfigBuilder, ACCESS_TOKEN_ENV};
pub use convert::{
    check_health_to_log, check_process, check_process_to_log, check_services_health,
    convert_ifc_to_xkt, convert_ifc_to_xkt_to_log, convert_with_type,
};
pub use error::{ErrorKind, HttpFailure, XeoError};
pub use logger::{write_log, WrittenLog, HEALTH_LOG_FILE};
pub use model::{
    ConversionJob, ConvertRequestLog, FileEntry, HealthReport, LogRecord, ProcessStatusLog,
    UploadTarget,
};
pub use pipeline::conversion::create_conversion_job;
pub use pipeline::health::check_health;
pub use pipeline::metadata::get_file_entry;
pub use pipeline::process::get_process_status;
pub use pipeline::upload::upload_file;
pub use progress::{ProgressCallback, WorkflowProgress, WorkflowStep};
pub use sanitize::to_valid_filename;
