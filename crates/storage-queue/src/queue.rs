//! The `Queue` trait and its REST implementation.

use crate::error::{QueueError, ServiceError, ValidationError};
use crate::message::{Message, MessageTtl};
use crate::transport::Transport;
use crate::wire;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// One named queue. Provides the message lifecycle operations.
///
/// Implementations hold no mutable per-call state; correctness under
/// concurrent dequeue is enforced by the service's visibility-timeout
/// mechanism, not client-side locking.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Approximate number of messages in the queue. The service may report
    /// stale values; callers must not treat the count as exact.
    async fn message_count(&self) -> Result<u64, QueueError>;

    /// Add a message. `visibility_timeout` is how long the new message stays
    /// hidden from consumers (zero means immediately visible); `ttl` bounds
    /// its retention. The returned [`Message`] echoes the input body and has
    /// a dequeue count of 0.
    async fn enqueue(
        &self,
        body: &str,
        visibility_timeout: Duration,
        ttl: MessageTtl,
    ) -> Result<Message, QueueError>;

    /// Retrieve up to `count` messages, hiding each from other consumers for
    /// `visibility_timeout`. An undeleted message reappears after the
    /// timeout with its dequeue count incremented. Zero available messages
    /// yield an empty list, not an error.
    async fn dequeue(
        &self,
        count: u32,
        visibility_timeout: Duration,
    ) -> Result<Vec<Message>, QueueError>;

    /// Inspect up to `count` messages without altering visibility or
    /// dequeue counts. Peeked messages never carry a pop receipt.
    async fn peek(&self, count: u32) -> Result<Vec<Message>, QueueError>;

    /// Remove a message, addressed by its id and the receipt from the
    /// dequeue that produced it. A stale receipt (the message was dequeued
    /// again, became visible again, or was already deleted) fails rather
    /// than silently succeeding.
    async fn delete(&self, message: &Message) -> Result<(), QueueError>;
}

/// REST-backed [`Queue`] bound to one queue's endpoints.
///
/// Immutable after construction: a queue URL for queue-level operations,
/// the derived messages URL for message-level ones, and the shared signed
/// transport.
#[derive(Debug, Clone)]
pub struct QueueHandle {
    queue_url: Url,
    messages_url: Url,
    transport: Transport,
}

impl QueueHandle {
    pub(crate) fn new(queue_url: Url, transport: Transport) -> Self {
        let messages_url = crate::service::child_url(&queue_url, "messages");
        Self {
            queue_url,
            messages_url,
            transport,
        }
    }

    /// URL of the queue endpoint
    pub fn url(&self) -> &Url {
        &self.queue_url
    }
}

#[async_trait]
impl Queue for QueueHandle {
    async fn message_count(&self) -> Result<u64, QueueError> {
        let mut url = self.queue_url.clone();
        url.query_pairs_mut().append_pair("comp", "metadata");
        debug!(queue = %self.queue_url, "fetching queue metadata");

        let response = self.transport.send(Method::GET, url, None).await?;
        let response = self.transport.expect(response, &[StatusCode::OK]).await?;

        let count = response
            .headers()
            .get("x-ms-approximate-messages-count")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                QueueError::Service(ServiceError::Malformed {
                    message: "metadata response carried no approximate message count".to_string(),
                })
            })?
            .parse::<u64>()
            .map_err(|e| {
                QueueError::Service(ServiceError::Malformed {
                    message: format!("unparseable approximate message count: {}", e),
                })
            })?;

        Ok(count)
    }

    async fn enqueue(
        &self,
        body: &str,
        visibility_timeout: Duration,
        ttl: MessageTtl,
    ) -> Result<Message, QueueError> {
        let mut url = self.messages_url.clone();
        url.query_pairs_mut()
            .append_pair(
                "visibilitytimeout",
                &visibility_timeout.as_secs().to_string(),
            )
            .append_pair("messagettl", &ttl.as_seconds_param());
        debug!(queue = %self.queue_url, "enqueueing message");

        let request_body = wire::encode_enqueue_body(body);
        let response = self
            .transport
            .send(Method::POST, url, Some(request_body))
            .await?;
        let response = self
            .transport
            .expect(response, &[StatusCode::CREATED])
            .await?;

        let text = self.transport.read_body(response).await?;
        let list = wire::decode_message_list(&text)?;
        Ok(wire::into_enqueued(list, body)?)
    }

    async fn dequeue(
        &self,
        count: u32,
        visibility_timeout: Duration,
    ) -> Result<Vec<Message>, QueueError> {
        let mut url = self.messages_url.clone();
        url.query_pairs_mut()
            .append_pair("numofmessages", &count.to_string())
            .append_pair(
                "visibilitytimeout",
                &visibility_timeout.as_secs().to_string(),
            );
        debug!(queue = %self.queue_url, count, "dequeueing messages");

        let response = self.transport.send(Method::GET, url, None).await?;
        let response = self.transport.expect(response, &[StatusCode::OK]).await?;

        let text = self.transport.read_body(response).await?;
        let list = wire::decode_message_list(&text)?;
        Ok(wire::into_dequeued(list)?)
    }

    async fn peek(&self, count: u32) -> Result<Vec<Message>, QueueError> {
        let mut url = self.messages_url.clone();
        url.query_pairs_mut()
            .append_pair("peekonly", "true")
            .append_pair("numofmessages", &count.to_string());
        debug!(queue = %self.queue_url, count, "peeking messages");

        let response = self.transport.send(Method::GET, url, None).await?;
        let response = self.transport.expect(response, &[StatusCode::OK]).await?;

        let text = self.transport.read_body(response).await?;
        let list = wire::decode_message_list(&text)?;
        Ok(wire::into_peeked(list))
    }

    async fn delete(&self, message: &Message) -> Result<(), QueueError> {
        let receipt = message.pop_receipt.as_ref().ok_or_else(|| {
            // Peeked or hand-built messages cannot be deleted.
            ValidationError::Required {
                field: "pop_receipt".to_string(),
            }
        })?;

        let mut url = crate::service::child_url(&self.messages_url, &message.id);
        url.query_pairs_mut()
            .append_pair("popreceipt", receipt.as_str());
        debug!(queue = %self.queue_url, id = %message.id, "deleting message");

        let response = self.transport.send(Method::DELETE, url, None).await?;
        self.transport
            .expect(response, &[StatusCode::NO_CONTENT])
            .await?;

        Ok(())
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
