//! # Storage Queue
//!
//! Typed client for Azure Storage Queue style REST queue services.
//!
//! This library hides the wire protocol of the remote queue service (signed
//! HTTP requests, XML response bodies) behind a small typed interface:
//!
//! - [`ServiceClient`] - account-level entry point: create and delete queues,
//!   mint queue handles
//! - [`Queue`] / [`QueueHandle`] - per-queue operations: enqueue, dequeue,
//!   peek, delete, and an approximate message count
//! - [`Message`] - the unit of queue content: identity, pop receipt, dequeue
//!   count, and body
//!
//! Delivery is at-least-once: a dequeued message stays hidden for its
//! visibility timeout and reappears unless deleted with the pop receipt
//! issued by that dequeue. [`InMemoryQueue`] implements the same contract
//! in process for tests and development.
//!
//! ## Module Organization
//!
//! - [`error`] - Error taxonomy for construction and queue operations
//! - [`message`] - Message record, pop receipts, queue names, TTL
//! - [`service`] - Service-level client and configuration
//! - [`queue`] - The `Queue` trait and its REST implementation
//! - [`memory`] - In-memory queue honoring the visibility contract

// Module declarations
pub mod credentials;
pub mod error;
pub mod memory;
pub mod message;
pub mod queue;
pub mod service;

mod transport;
mod wire;

// Re-export commonly used types at crate root for convenience
pub use credentials::SharedKeyCredential;
pub use error::{ConfigurationError, QueueError, ServiceError, ValidationError};
pub use memory::InMemoryQueue;
pub use message::{Message, MessageTtl, PopReceipt, QueueName};
pub use queue::{Queue, QueueHandle};
pub use service::{ServiceClient, ServiceConfig};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
