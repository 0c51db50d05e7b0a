//! Signed HTTP round trips shared by the service client and queue handles.

use crate::credentials::SharedKeyCredential;
use crate::error::{ConfigurationError, QueueError, ServiceError};
use crate::wire;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Protocol version sent as `x-ms-version` on every request
const STORAGE_API_VERSION: &str = "2018-03-28";

const XML_CONTENT_TYPE: &str = "application/xml";

/// One shared, immutable transport: connection pool, credential, deadline.
/// Holds no per-call state, so concurrent callers need no locking.
#[derive(Debug, Clone)]
pub(crate) struct Transport {
    http: reqwest::Client,
    credential: SharedKeyCredential,
    operation_timeout: Duration,
}

impl Transport {
    pub(crate) fn new(
        credential: SharedKeyCredential,
        operation_timeout: Duration,
    ) -> Result<Self, ConfigurationError> {
        let http = reqwest::Client::builder()
            .timeout(operation_timeout)
            .build()
            .map_err(|e| ConfigurationError::HttpClient {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            credential,
            operation_timeout,
        })
    }

    /// Sign and send one request. The configured deadline surfaces as
    /// [`QueueError::Timeout`]; other transport failures as
    /// [`ServiceError::Network`]. Status is not checked here.
    pub(crate) async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<String>,
    ) -> Result<Response, QueueError> {
        let mut x_ms_headers = BTreeMap::new();
        x_ms_headers.insert(
            "x-ms-date".to_string(),
            Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        );
        x_ms_headers.insert("x-ms-version".to_string(), STORAGE_API_VERSION.to_string());

        let content_length = body.as_deref().map(str::len).unwrap_or(0);
        let content_type = match &body {
            Some(b) if !b.is_empty() => XML_CONTENT_TYPE,
            _ => "",
        };

        let authorization = self.credential.authorization(
            method.as_str(),
            &url,
            &x_ms_headers,
            content_length,
            content_type,
        );

        let mut request = self.http.request(method, url);
        for (name, value) in &x_ms_headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request = request.header(AUTHORIZATION, authorization);
        if let Some(body) = body {
            if !body.is_empty() {
                request = request.header(CONTENT_TYPE, XML_CONTENT_TYPE);
            }
            request = request.body(body);
        }

        request.send().await.map_err(|e| {
            if e.is_timeout() {
                QueueError::Timeout {
                    duration: self.operation_timeout,
                }
            } else {
                QueueError::Service(ServiceError::Network {
                    message: e.to_string(),
                })
            }
        })
    }

    /// Accept the response if its status is one of `accepted`; otherwise
    /// read the diagnostic body and surface a [`ServiceError::Status`].
    pub(crate) async fn expect(
        &self,
        response: Response,
        accepted: &[StatusCode],
    ) -> Result<Response, QueueError> {
        let status = response.status();
        if accepted.contains(&status) {
            return Ok(response);
        }

        let header_code = response
            .headers()
            .get("x-ms-error-code")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.unwrap_or_default();
        let decoded = wire::decode_error_body(&body);

        let code = header_code
            .or_else(|| decoded.as_ref().map(|e| e.code.clone()))
            .unwrap_or_default();
        let message = decoded
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or(body);

        warn!(status = status.as_u16(), code = %code, "queue service rejected request");
        Err(QueueError::Service(ServiceError::Status {
            status: status.as_u16(),
            code,
            message,
        }))
    }

    /// Read a successful response body, mapping read failures to the
    /// network taxonomy.
    pub(crate) async fn read_body(&self, response: Response) -> Result<String, QueueError> {
        response.text().await.map_err(|e| {
            QueueError::Service(ServiceError::Network {
                message: format!("failed to read response body: {}", e),
            })
        })
    }
}
