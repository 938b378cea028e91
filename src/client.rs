//! HTTP clients for the storage and converter services.
//!
//! [`create_clients`] turns a validated [`ServicesConfig`] into a
//! [`ServiceClients`] pair. Each [`ServiceClient`] resolves request paths
//! against its service's base URL and attaches `Authorization: Bearer
//! <token>`. Both share one pooled `reqwest::Client`, which is also used for
//! the unauthenticated PUT to pre-signed upload URLs.
//!
//! No retries and no timeouts are configured; transport defaults apply.

use crate::config::ServicesConfig;
use crate::error::{HttpFailure, XeoError};
use crate::progress::ProgressCallback;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use tracing::{debug, error};

/// Which remote service a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Storage,
    Converter,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Storage => f.write_str("storage"),
            Service::Converter => f.write_str("converter"),
        }
    }
}

/// An authenticated client bound to one service's base URL.
#[derive(Clone)]
pub struct ServiceClient {
    service: Service,
    base_url: Url,
    token: String,
    http: reqwest::Client,
}

impl fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClient")
            .field("service", &self.service)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ServiceClient {
    /// Build a client for `service` rooted at `base_url`.
    pub fn new(
        service: Service,
        base_url: &str,
        token: impl Into<String>,
        http: reqwest::Client,
    ) -> Result<Self, XeoError> {
        let mut base_url = Url::parse(base_url).map_err(|e| {
            XeoError::InvalidConfig(format!("{service} URL '{base_url}' is invalid: {e}"))
        })?;
        // `Url::join` drops the last segment unless the path ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            service,
            base_url,
            token: token.into(),
            http,
        })
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append `segments` to the base URL, each percent-encoded as a single
    /// path segment (`/`, `?`, `#` in an id cannot change the target).
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, XeoError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                XeoError::InvalidConfig(format!(
                    "{} URL '{}' cannot take a path",
                    self.service, self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Authenticated `GET <base>/<segments…>`.
    pub async fn get(&self, segments: &[&str]) -> Result<Response, HttpFailure> {
        let url = self.endpoint(segments).map_err(config_failure)?;
        debug!(service = %self.service, %url, "GET");
        self.http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| HttpFailure::transport(&e))
    }

    /// Authenticated `POST <base>/<segments…>` with a JSON body.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<Response, HttpFailure> {
        let url = self.endpoint(segments).map_err(config_failure)?;
        debug!(service = %self.service, %url, "POST");
        self.http
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| HttpFailure::transport(&e))
    }

    /// `PUT` raw bytes to a pre-signed URL.
    ///
    /// The URL is used verbatim: no base-URL prefix and no `Authorization`
    /// header. Any non-2xx status is a failure.
    pub async fn put_presigned(&self, url: &str, bytes: Vec<u8>) -> Result<(), HttpFailure> {
        debug!(%url, size = bytes.len(), "PUT pre-signed");
        let response = self
            .http
            .put(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| HttpFailure::transport(&e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(failure_from_response(response).await)
        }
    }
}

/// The two configured service clients plus the optional progress callback.
#[derive(Clone)]
pub struct ServiceClients {
    pub storage: ServiceClient,
    pub converter: ServiceClient,
    /// Conversion `type` sent by [`crate::convert::convert_ifc_to_xkt`].
    pub conversion_type: String,
    pub progress: Option<ProgressCallback>,
}

impl fmt::Debug for ServiceClients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClients")
            .field("storage", &self.storage)
            .field("converter", &self.converter)
            .field("conversion_type", &self.conversion_type)
            .finish_non_exhaustive()
    }
}

/// Build the storage and converter clients from `config`.
pub fn create_clients(config: &ServicesConfig) -> Result<ServiceClients, XeoError> {
    if config.access_token.trim().is_empty() {
        return Err(XeoError::MissingAccessToken {
            var: crate::config::ACCESS_TOKEN_ENV,
        });
    }

    let http = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| XeoError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

    Ok(ServiceClients {
        storage: ServiceClient::new(
            Service::Storage,
            &config.storage_url,
            &config.access_token,
            http.clone(),
        )?,
        converter: ServiceClient::new(
            Service::Converter,
            &config.converter_url,
            &config.access_token,
            http,
        )?,
        conversion_type: config.conversion_type.clone(),
        progress: config.progress_callback.clone(),
    })
}

/// Pass the response through when its status is `expected`, otherwise turn
/// it into a failure carrying the status and response text.
pub(crate) async fn expect_status(
    sent: Result<Response, HttpFailure>,
    expected: StatusCode,
) -> Result<Response, HttpFailure> {
    let response = sent?;
    if response.status() == expected {
        Ok(response)
    } else {
        Err(failure_from_response(response).await)
    }
}

/// Decode a JSON body, reporting `operation` on failure.
pub(crate) async fn decode_json<T: DeserializeOwned>(
    response: Response,
    operation: &'static str,
) -> Result<T, XeoError> {
    response.json::<T>().await.map_err(|e| {
        error!(error = %e, operation, "Invalid response body");
        XeoError::InvalidResponse {
            operation,
            detail: e.to_string(),
        }
    })
}

async fn failure_from_response(response: Response) -> HttpFailure {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let detail = if text.trim().is_empty() {
        status.canonical_reason().unwrap_or_default().to_string()
    } else {
        text
    };
    HttpFailure::status(status.as_u16(), detail)
}

fn config_failure(err: XeoError) -> HttpFailure {
    HttpFailure {
        status: None,
        detail: err.to_string(),
    }
}
