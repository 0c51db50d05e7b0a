//! In-memory queue implementation for testing and development.
//!
//! Honors the same delivery contract as the remote service: dequeued
//! messages are hidden for their visibility timeout and reappear with an
//! incremented dequeue count unless deleted with the current pop receipt,
//! TTLs expire messages, and peek leaves all state untouched.

use crate::error::{QueueError, ServiceError};
use crate::message::{Message, MessageTtl, PopReceipt};
use crate::queue::Queue;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::Duration;

/// A message held in the queue with its visibility bookkeeping
#[derive(Debug, Clone)]
struct StoredMessage {
    id: String,
    body: String,
    dequeue_count: u32,
    /// Hidden from consumers until this instant
    available_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    /// Receipt issued by the latest enqueue or dequeue of this message
    pop_receipt: Option<String>,
}

impl StoredMessage {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    fn is_visible(&self, now: DateTime<Utc>) -> bool {
        now >= self.available_at
    }
}

#[derive(Debug, Default)]
struct QueueState {
    next_id: u64,
    next_receipt: u64,
    messages: Vec<StoredMessage>,
}

impl QueueState {
    fn issue_receipt(&mut self) -> String {
        self.next_receipt += 1;
        format!("receipt-{}", self.next_receipt)
    }

    fn purge_expired(&mut self, now: DateTime<Utc>) {
        self.messages.retain(|m| !m.is_expired(now));
    }
}

/// In-memory [`Queue`] with the service's visibility semantics.
///
/// The mutex is held only for synchronous state changes, never across an
/// await point, so concurrent callers cannot observe a message while it is
/// invisible to them.
#[derive(Debug, Default)]
pub struct InMemoryQueue {
    state: Mutex<QueueState>,
}

impl InMemoryQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Queue for InMemoryQueue {
    async fn message_count(&self) -> Result<u64, QueueError> {
        let mut state = lock(&self.state);
        state.purge_expired(Utc::now());
        // Approximate count: includes messages currently invisible.
        Ok(state.messages.len() as u64)
    }

    async fn enqueue(
        &self,
        body: &str,
        visibility_timeout: Duration,
        ttl: MessageTtl,
    ) -> Result<Message, QueueError> {
        let now = Utc::now();
        let mut state = lock(&self.state);
        state.purge_expired(now);

        state.next_id += 1;
        let id = state.next_id.to_string();
        let receipt = state.issue_receipt();
        let expires_at = match ttl {
            MessageTtl::Infinite => None,
            MessageTtl::After(duration) => Some(now + to_chrono(duration)),
        };

        state.messages.push(StoredMessage {
            id: id.clone(),
            body: body.to_string(),
            dequeue_count: 0,
            available_at: now + to_chrono(visibility_timeout),
            expires_at,
            pop_receipt: Some(receipt.clone()),
        });

        Ok(Message {
            id,
            pop_receipt: Some(PopReceipt::new(receipt)),
            dequeue_count: 0,
            body: body.to_string(),
        })
    }

    async fn dequeue(
        &self,
        count: u32,
        visibility_timeout: Duration,
    ) -> Result<Vec<Message>, QueueError> {
        let now = Utc::now();
        let mut state = lock(&self.state);
        state.purge_expired(now);

        let visible: Vec<usize> = state
            .messages
            .iter()
            .enumerate()
            .filter(|(_, stored)| stored.is_visible(now))
            .map(|(index, _)| index)
            .take(count as usize)
            .collect();

        let mut dequeued = Vec::with_capacity(visible.len());
        for index in visible {
            let receipt = state.issue_receipt();
            let stored = &mut state.messages[index];
            stored.dequeue_count += 1;
            stored.available_at = now + to_chrono(visibility_timeout);
            stored.pop_receipt = Some(receipt.clone());
            dequeued.push(Message {
                id: stored.id.clone(),
                pop_receipt: Some(PopReceipt::new(receipt)),
                dequeue_count: stored.dequeue_count,
                body: stored.body.clone(),
            });
        }

        Ok(dequeued)
    }

    async fn peek(&self, count: u32) -> Result<Vec<Message>, QueueError> {
        let now = Utc::now();
        let mut state = lock(&self.state);
        state.purge_expired(now);

        Ok(state
            .messages
            .iter()
            .filter(|stored| stored.is_visible(now))
            .take(count as usize)
            .map(|stored| Message {
                id: stored.id.clone(),
                pop_receipt: None,
                dequeue_count: stored.dequeue_count,
                body: stored.body.clone(),
            })
            .collect())
    }

    async fn delete(&self, message: &Message) -> Result<(), QueueError> {
        let receipt = message.pop_receipt.as_ref().ok_or_else(|| {
            crate::error::ValidationError::Required {
                field: "pop_receipt".to_string(),
            }
        })?;

        let now = Utc::now();
        let mut state = lock(&self.state);
        state.purge_expired(now);

        let position = state.messages.iter().position(|stored| {
            stored.id == message.id && stored.pop_receipt.as_deref() == Some(receipt.as_str())
        });

        match position {
            Some(index) => {
                state.messages.remove(index);
                Ok(())
            }
            None => Err(QueueError::Service(ServiceError::Status {
                status: 404,
                code: "MessageNotFound".to_string(),
                message: format!(
                    "no message with id '{}' and the presented pop receipt",
                    message.id
                ),
            })),
        }
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

fn lock(state: &Mutex<QueueState>) -> std::sync::MutexGuard<'_, QueueState> {
    // A poisoned lock means a panic mid-mutation in a test; propagating the
    // inner guard keeps the double usable.
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
