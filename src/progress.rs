//! Progress-callback trait for workflow step events.
//!
//! Inject an [`Arc<dyn WorkflowProgress>`] via
//! [`crate::config::ServicesConfigBuilder::progress_callback`] to be told
//! when each remote call of a command starts, succeeds or fails. The CLI
//! uses it to drive a terminal spinner; tests use it to record the order of
//! calls. The library itself never prints.
//!
//! # Example
//!
//! ```rust
//! use xeoservices::{ServicesConfig, WorkflowProgress, WorkflowStep};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl WorkflowProgress for Printer {
//!     fn on_step_complete(&self, step: WorkflowStep) {
//!         eprintln!("done: {step}");
//!     }
//! }
//!
//! let config = ServicesConfig::builder()
//!     .access_token("secret")
//!     .progress_callback(Arc::new(Printer) as Arc<dyn WorkflowProgress>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// One remote call in a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowStep {
    /// `POST file` on the storage service.
    CreateUploadLink,
    /// `PUT` of the file bytes to the pre-signed URL.
    UploadFile,
    /// `GET file/{id}` on the storage service.
    FetchFileEntry,
    /// `POST process` on the converter service.
    StartConversion,
    /// `GET process/{id}` on the converter service.
    FetchProcessStatus,
    /// `GET health` on both services.
    CheckHealth,
    /// Writing the JSON log file.
    WriteLog,
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkflowStep::CreateUploadLink => "Creating upload link",
            WorkflowStep::UploadFile => "Uploading file",
            WorkflowStep::FetchFileEntry => "Fetching file entry",
            WorkflowStep::StartConversion => "Starting conversion",
            WorkflowStep::FetchProcessStatus => "Fetching process status",
            WorkflowStep::CheckHealth => "Checking service health",
            WorkflowStep::WriteLog => "Writing log",
        };
        f.write_str(label)
    }
}

/// Called by the command entry points in [`crate::convert`] as they run.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Steps run strictly one after another.
pub trait WorkflowProgress: Send + Sync {
    /// Called just before the step's request is sent.
    fn on_step_start(&self, step: WorkflowStep) {
        let _ = step;
    }

    /// Called when the step succeeded.
    fn on_step_complete(&self, step: WorkflowStep) {
        let _ = step;
    }

    /// Called when the step failed; no further steps follow.
    fn on_step_error(&self, step: WorkflowStep, error: &str) {
        let _ = (step, error);
    }
}

/// Convenience alias matching the type stored in [`crate::config::ServicesConfig`].
pub type ProgressCallback = Arc<dyn WorkflowProgress>;
