//! Async registrar client for the aggregator REST API.

use serde::Deserialize;
use std::fmt;

use super::payload::{RestCancellation, RestInvoice};
use super::status::SubmissionStatus;

/// Error from the registrar API.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SubmitError {
    /// Registrar unreachable, connection failure, or 5xx — transient.
    /// Safe to retry `status`, unsafe to blindly retry `create`.
    Network(String),
    /// The registrar returned a structured validation error (HTTP 400).
    /// Not retryable without fixing the record.
    Rejected(String),
    /// Unexpected non-2xx response.
    Api(String),
    /// Failed to parse the response body.
    Parse(String),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(e) => write!(f, "registrar network error: {e}"),
            Self::Rejected(e) => write!(f, "registrar rejected record: {e}"),
            Self::Api(e) => write!(f, "registrar API error: {e}"),
            Self::Parse(e) => write!(f, "registrar parse error: {e}"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// Result of a successful `create` or `cancel` call.
#[derive(Debug, Clone)]
pub struct CreateResponse {
    /// Tracking identifier to poll `status` with. Persist it before any
    /// retry — submission is not idempotent.
    pub tracking_id: String,
    /// Base64 PNG of the QR tributario, when the aggregator returns one.
    pub qr: Option<String>,
    pub status: SubmissionStatus,
}

/// Query flags for cancellation edge cases.
#[derive(Debug, Clone, Copy, Default)]
pub struct CancelOptions {
    /// The invoice being cancelled was previously rejected by AEAT.
    pub previously_rejected: bool,
    /// No prior registration exists for the invoice being cancelled.
    pub no_prior_registration: bool,
}

#[derive(Debug, Deserialize)]
struct CreateApiResponse {
    uuid: Option<String>,
    qr: Option<String>,
    estado: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusApiResponse {
    estado: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Client for a VeriFactu aggregator (bearer-token REST API).
///
/// Performs network I/O — invoke from an async task. Each call is
/// independently retryable per the [`SubmitError`] taxonomy.
pub struct SubmissionClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl SubmissionClient {
    /// # Errors
    ///
    /// Returns `SubmitError::Network` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, SubmitError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| SubmitError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Submit an issuance record. Returns the tracking id (state `Pending`
    /// unless the aggregator already reports otherwise) and QR artifact.
    pub async fn create(&self, invoice: &RestInvoice) -> Result<CreateResponse, SubmitError> {
        let url = format!("{}/verifactu/create", self.base_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(invoice)
            .send()
            .await
            .map_err(|e| SubmitError::Network(e.to_string()))?;
        self.parse_create_response(resp).await
    }

    /// Poll the registrar for the current status of a submission.
    pub async fn status(&self, tracking_id: &str) -> Result<SubmissionStatus, SubmitError> {
        let url = format!("{}/verifactu/status", self.base_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("uuid", tracking_id)])
            .send()
            .await
            .map_err(|e| SubmitError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SubmitError::Network(e.to_string()))?;
        if status.is_server_error() {
            return Err(SubmitError::Network(format!("HTTP {status}: {body}")));
        }
        if !status.is_success() {
            return Err(SubmitError::Api(format!("HTTP {status}: {body}")));
        }

        let api: StatusApiResponse =
            serde_json::from_str(&body).map_err(|e| SubmitError::Parse(e.to_string()))?;
        Ok(SubmissionStatus::from_raw(api.estado.as_deref().unwrap_or("")))
    }

    /// Submit a cancellation record. The record must already be correctly
    /// chained (its previous hash is the issuer's last known huella).
    pub async fn cancel(
        &self,
        cancellation: &RestCancellation,
        options: CancelOptions,
    ) -> Result<CreateResponse, SubmitError> {
        let url = format!("{}/verifactu/cancel", self.base_url);
        let mut req = self.http.post(&url).bearer_auth(&self.token);
        if options.previously_rejected {
            req = req.query(&[("rechazo_previo", "S")]);
        }
        if options.no_prior_registration {
            req = req.query(&[("sin_registro_previo", "S")]);
        }
        let resp = req
            .json(cancellation)
            .send()
            .await
            .map_err(|e| SubmitError::Network(e.to_string()))?;
        self.parse_create_response(resp).await
    }

    async fn parse_create_response(
        &self,
        resp: reqwest::Response,
    ) -> Result<CreateResponse, SubmitError> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SubmitError::Network(e.to_string()))?;

        if status.is_client_error() {
            let msg = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|e| e.message.or(e.error))
                .unwrap_or_else(|| body.clone());
            return Err(SubmitError::Rejected(msg));
        }
        if !status.is_success() {
            return Err(SubmitError::Network(format!("HTTP {status}: {body}")));
        }

        let api: CreateApiResponse =
            serde_json::from_str(&body).map_err(|e| SubmitError::Parse(e.to_string()))?;
        let tracking_id = api
            .uuid
            .ok_or_else(|| SubmitError::Parse("response without uuid".into()))?;
        let status = api
            .estado
            .as_deref()
            .map(SubmissionStatus::from_raw)
            .unwrap_or(SubmissionStatus::Pending);
        Ok(CreateResponse {
            tracking_id,
            qr: api.qr,
            status,
        })
    }
}
