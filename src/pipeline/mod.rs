//! Remote calls against the storage and converter services.
//!
//! Each submodule wraps exactly one service operation: build the request,
//! check the status the service promises, decode the body, and map every
//! failure onto a specific [`crate::error::XeoError`]. They take the
//! individual [`crate::client::ServiceClient`] they need and nothing else,
//! so each is testable against a single mock server.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ metadata ──▶ conversion        (convert-ifc-xkt)
//! (storage)  (storage)    (converter)
//!
//! process                                   (check-process)
//! (converter)
//!
//! health: converter ──▶ storage             (health)
//! ```
//!
//! 1. [`upload`]:     `POST file`, then `PUT` the bytes to the pre-signed URL
//! 2. [`metadata`]:   `GET file/{id}` for the download URL
//! 3. [`conversion`]: `POST process` to start the job
//! 4. [`process`]:    `GET process/{id}` for the job's current state
//! 5. [`health`]:     `GET health` on both services, converter first
//!
//! Composition into commands lives in [`crate::convert`].

pub mod conversion;
pub mod health;
pub mod metadata;
pub mod process;
pub mod upload;
