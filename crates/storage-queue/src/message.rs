//! Message types for queue operations including core domain identifiers.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Core Domain Identifiers
// ============================================================================

/// Validated queue name following the storage service's naming rules
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueName(String);

impl QueueName {
    /// Create new queue name with validation
    pub fn new(name: String) -> Result<Self, ValidationError> {
        // Validate length
        if name.len() < 3 || name.len() > 63 {
            return Err(ValidationError::OutOfRange {
                field: "queue_name".to_string(),
                message: "must be 3-63 characters".to_string(),
            });
        }

        // Validate characters (lowercase alphanumeric and hyphens)
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ValidationError::InvalidFormat {
                field: "queue_name".to_string(),
                message: "only lowercase ASCII alphanumeric and hyphens allowed".to_string(),
            });
        }

        // Validate no consecutive hyphens or leading/trailing hyphens
        if name.starts_with('-') || name.ends_with('-') || name.contains("--") {
            return Err(ValidationError::InvalidFormat {
                field: "queue_name".to_string(),
                message: "no leading/trailing hyphens or consecutive hyphens".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get queue name as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Opaque token proving the caller holds an invisible copy of a message.
///
/// Reissued on every successful dequeue; deleting a message requires the
/// most recently issued receipt. Peeked messages never carry one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PopReceipt(String);

impl PopReceipt {
    /// Create receipt from the token issued by the service
    pub fn new(receipt: String) -> Self {
        Self(receipt)
    }

    /// Get receipt token as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PopReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// The unit of queue content as observed by a client.
///
/// `id` is stable for the message's whole life; `pop_receipt` is not - each
/// dequeue invalidates the previous receipt. `dequeue_count` starts at 0 on
/// enqueue and is observable at 1 or higher once the message has been
/// dequeued, which callers use to detect poison messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Service-assigned stable identifier
    pub id: String,
    /// Receipt from the dequeue (or enqueue) that produced this record;
    /// `None` for peeked messages
    pub pop_receipt: Option<PopReceipt>,
    /// Times the message became visible again after an unacknowledged dequeue
    pub dequeue_count: u32,
    /// Payload text supplied at enqueue time
    pub body: String,
}

impl Message {
    /// Check if this record carries a receipt usable for deletion
    pub fn is_deletable(&self) -> bool {
        self.pop_receipt.is_some()
    }
}

/// Message retention period.
///
/// The wire protocol encodes "never expire" as a negative duration; this
/// enum keeps that sentinel out of the public API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTtl {
    /// Keep the message until it is deleted
    Infinite,
    /// Expire the message after the given duration
    After(Duration),
}

impl MessageTtl {
    /// Wire encoding of the retention period in seconds
    pub(crate) fn as_seconds_param(&self) -> String {
        match self {
            Self::Infinite => "-1".to_string(),
            Self::After(duration) => duration.as_secs().to_string(),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
