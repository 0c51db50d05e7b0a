//! Service-level client: configuration, queue administration, handle minting.

use crate::credentials::SharedKeyCredential;
use crate::error::{ConfigurationError, QueueError};
use crate::message::QueueName;
use crate::queue::QueueHandle;
use crate::transport::Transport;
use reqwest::{Method, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Canonical service address, parameterized by account name
const DEFAULT_SERVICE_URL: &str = "https://{account}.queue.core.windows.net";

/// Configuration for the queue service client.
///
/// # Examples
///
/// ```
/// use storage_queue::ServiceConfig;
/// use std::time::Duration;
///
/// let config = ServiceConfig::new("account", "a2V5")
///     .with_operation_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Storage account name
    pub account_name: String,
    /// Base64-encoded account key
    pub account_key: String,
    /// Service URL template with an `{account}` placeholder; overriding the
    /// default targets emulators and test doubles
    pub service_url: Option<String>,
    /// Deadline for each operation's round trip
    pub operation_timeout: Duration,
}

impl ServiceConfig {
    /// Create a configuration for the given account
    pub fn new(account_name: impl Into<String>, account_key: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            account_key: account_key.into(),
            service_url: None,
            operation_timeout: Duration::from_secs(30),
        }
    }

    /// Override the service URL template
    pub fn with_service_url(mut self, service_url: impl Into<String>) -> Self {
        self.service_url = Some(service_url.into());
        self
    }

    /// Set the per-operation deadline
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }
}

/// Client for the queue service as a whole.
///
/// Creates and destroys queues and mints [`QueueHandle`]s. Holds only the
/// resolved base address and the signing credential, so it is safe to share
/// across concurrent callers. Construction performs no network I/O.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    base_url: Url,
    transport: Transport,
}

impl ServiceClient {
    /// Construct a client from configuration.
    ///
    /// Validates the account key decodes and the resolved service address
    /// parses as a usable base URL.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Configuration`] for malformed key material or
    /// an unusable service URL.
    pub fn new(config: ServiceConfig) -> Result<Self, QueueError> {
        let credential = SharedKeyCredential::new(&config.account_name, &config.account_key)?;

        let template = config
            .service_url
            .as_deref()
            .unwrap_or(DEFAULT_SERVICE_URL);
        let resolved = template.replace("{account}", &config.account_name);

        let base_url = Url::parse(&resolved).map_err(|e| ConfigurationError::InvalidServiceUrl {
            url: resolved.clone(),
            message: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigurationError::InvalidServiceUrl {
                url: resolved,
                message: "not a usable base URL".to_string(),
            }
            .into());
        }

        let transport = Transport::new(credential, config.operation_timeout)?;

        Ok(Self {
            base_url,
            transport,
        })
    }

    /// Create a queue and return a handle for it.
    ///
    /// Creation is idempotent on the service side: a queue that already
    /// exists with the same metadata also succeeds.
    pub async fn create_queue(&self, name: &QueueName) -> Result<QueueHandle, QueueError> {
        let url = child_url(&self.base_url, name.as_str());
        debug!(queue = %name, "creating queue");

        let response = self
            .transport
            .send(Method::PUT, url.clone(), Some(String::new()))
            .await?;
        self.transport
            .expect(response, &[StatusCode::CREATED, StatusCode::NO_CONTENT])
            .await?;

        Ok(QueueHandle::new(url, self.transport.clone()))
    }

    /// Delete a queue. No client-side existence check is made; a missing
    /// queue surfaces as the service's own error.
    pub async fn delete_queue(&self, name: &QueueName) -> Result<(), QueueError> {
        let url = child_url(&self.base_url, name.as_str());
        debug!(queue = %name, "deleting queue");

        let response = self.transport.send(Method::DELETE, url, None).await?;
        self.transport
            .expect(response, &[StatusCode::NO_CONTENT])
            .await?;

        Ok(())
    }

    /// Derive a handle for a queue without any network call or existence
    /// check. Operations on the handle surface any "not found" condition.
    pub fn queue(&self, name: &QueueName) -> QueueHandle {
        let url = child_url(&self.base_url, name.as_str());
        QueueHandle::new(url, self.transport.clone())
    }
}

/// Append one path segment to a base URL. The base is validated as usable
/// at construction, so the segment mutation cannot fail.
pub(crate) fn child_url(base: &Url, segment: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(segment);
    }
    url
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
