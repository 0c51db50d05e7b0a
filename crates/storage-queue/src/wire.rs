//! Wire format of the queue service.
//!
//! The XML message-list shape is service-specific and versioned; everything
//! the service returns is decoded here into [`Message`] records so no other
//! module touches the wire format.

use crate::error::ServiceError;
use crate::message::{Message, PopReceipt};
use serde::Deserialize;

/// `<QueueMessagesList>` response envelope for enqueue, dequeue and peek
#[derive(Debug, Deserialize)]
pub(crate) struct QueueMessagesList {
    #[serde(rename = "QueueMessage", default)]
    pub entries: Vec<QueueMessage>,
}

/// One `<QueueMessage>` entry. Timestamps the service also returns
/// (insertion, expiration, next-visible) are not part of the client model
/// and are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct QueueMessage {
    #[serde(rename = "MessageId")]
    pub message_id: String,
    #[serde(rename = "PopReceipt", default)]
    pub pop_receipt: Option<String>,
    #[serde(rename = "DequeueCount", default)]
    pub dequeue_count: u32,
    #[serde(rename = "MessageText", default)]
    pub message_text: String,
}

/// `<Error>` body carried on non-2xx responses
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(rename = "Code", default)]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}

/// Decode a message-list response body
pub(crate) fn decode_message_list(body: &str) -> Result<QueueMessagesList, ServiceError> {
    quick_xml::de::from_str(body).map_err(|e| ServiceError::Malformed {
        message: format!("undecodable message list: {}", e),
    })
}

/// Decode an error response body; `None` if the body is not the documented
/// error shape (some failures carry none)
pub(crate) fn decode_error_body(body: &str) -> Option<ErrorBody> {
    quick_xml::de::from_str(body).ok()
}

/// Render the enqueue request body
pub(crate) fn encode_enqueue_body(message_text: &str) -> String {
    format!(
        "<QueueMessage><MessageText>{}</MessageText></QueueMessage>",
        quick_xml::escape::escape(message_text)
    )
}

/// Build the [`Message`] for a successful enqueue.
///
/// The enqueue response does not echo the body, so it is taken from the
/// caller's input; a fresh message has never been redelivered, so the
/// dequeue count is fixed at 0.
pub(crate) fn into_enqueued(
    list: QueueMessagesList,
    body: &str,
) -> Result<Message, ServiceError> {
    let entry = list
        .entries
        .into_iter()
        .next()
        .ok_or_else(|| ServiceError::Malformed {
            message: "enqueue response carried no message entry".to_string(),
        })?;

    Ok(Message {
        id: entry.message_id,
        pop_receipt: entry.pop_receipt.map(PopReceipt::new),
        dequeue_count: 0,
        body: body.to_string(),
    })
}

/// Build the [`Message`] list for a successful dequeue, preserving response
/// order. Every dequeued entry must carry a receipt; one without it is a
/// protocol violation.
pub(crate) fn into_dequeued(list: QueueMessagesList) -> Result<Vec<Message>, ServiceError> {
    list.entries
        .into_iter()
        .map(|entry| {
            let receipt = entry.pop_receipt.ok_or_else(|| ServiceError::Malformed {
                message: format!(
                    "dequeued message '{}' carried no pop receipt",
                    entry.message_id
                ),
            })?;
            Ok(Message {
                id: entry.message_id,
                pop_receipt: Some(PopReceipt::new(receipt)),
                dequeue_count: entry.dequeue_count,
                body: entry.message_text,
            })
        })
        .collect()
}

/// Build the [`Message`] list for a successful peek. Peek must not affect
/// visibility, so the receipt is dropped even if the service sent one.
pub(crate) fn into_peeked(list: QueueMessagesList) -> Vec<Message> {
    list.entries
        .into_iter()
        .map(|entry| Message {
            id: entry.message_id,
            pop_receipt: None,
            dequeue_count: entry.dequeue_count,
            body: entry.message_text,
        })
        .collect()
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
