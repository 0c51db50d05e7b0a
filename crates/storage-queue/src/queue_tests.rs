//! Tests for queue message lifecycle operations.

use super::*;
use crate::message::{PopReceipt, QueueName};
use crate::service::{ServiceClient, ServiceConfig};
use std::str::FromStr;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// "a2V5" is base64 for "key"
const TEST_KEY: &str = "a2V5";

fn test_queue(server: &MockServer) -> QueueHandle {
    let client = ServiceClient::new(
        ServiceConfig::new("devaccount", TEST_KEY)
            .with_service_url(format!("{}/{{account}}", server.uri())),
    )
    .unwrap();
    client.queue(&QueueName::from_str("test").unwrap())
}

fn single_message_list(body: &str) -> String {
    format!(
        r#"<QueueMessagesList>
            <QueueMessage>
                <MessageId>1</MessageId>
                <InsertionTime>Mon, 02 Jan 2006 15:04:05 MST</InsertionTime>
                <ExpirationTime>Mon, 02 Jan 2006 15:04:05 MST</ExpirationTime>
                <PopReceipt>p1</PopReceipt>
                <TimeNextVisible>Mon, 02 Jan 2006 15:04:05 MST</TimeNextVisible>
                <DequeueCount>0</DequeueCount>
                <MessageText>{}</MessageText>
            </QueueMessage>
        </QueueMessagesList>"#,
        body
    )
}

// ============================================================================
// MessageCount Tests
// ============================================================================

#[tokio::test]
async fn test_message_count_reads_metadata_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devaccount/test"))
        .and(query_param("comp", "metadata"))
        .and(header_exists("authorization"))
        .and(header_exists("x-ms-date"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("x-ms-approximate-messages-count", "7"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let queue = test_queue(&server);
    assert_eq!(queue.message_count().await.unwrap(), 7);
}

#[tokio::test]
async fn test_message_count_missing_header_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devaccount/test"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let queue = test_queue(&server);
    let err = queue.message_count().await.unwrap_err();
    assert!(matches!(
        err,
        QueueError::Service(ServiceError::Malformed { .. })
    ));
}

// ============================================================================
// Enqueue Tests
// ============================================================================

#[tokio::test]
async fn test_enqueue_infinite_ttl() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/devaccount/test/messages"))
        .and(query_param("visibilitytimeout", "1"))
        .and(query_param("messagettl", "-1"))
        .and(header_exists("authorization"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("content-type", "application/xml")
                .set_body_string(single_message_list("message-body")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let queue = test_queue(&server);
    let message = queue
        .enqueue("message-body", Duration::from_secs(1), MessageTtl::Infinite)
        .await
        .unwrap();

    assert_eq!(message.id, "1");
    assert_eq!(message.pop_receipt.as_ref().unwrap().as_str(), "p1");
    assert_eq!(message.dequeue_count, 0);
    assert_eq!(message.body, "message-body");
}

#[tokio::test]
async fn test_enqueue_bounded_ttl() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/devaccount/test/messages"))
        .and(query_param("visibilitytimeout", "0"))
        .and(query_param("messagettl", "3600"))
        .respond_with(
            ResponseTemplate::new(201).set_body_string(single_message_list("short-lived")),
        )
        .mount(&server)
        .await;

    let queue = test_queue(&server);
    let message = queue
        .enqueue(
            "short-lived",
            Duration::ZERO,
            MessageTtl::After(Duration::from_secs(3600)),
        )
        .await
        .unwrap();
    assert_eq!(message.body, "short-lived");
}

#[tokio::test]
async fn test_enqueue_rejection_surfaces_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/devaccount/test/messages"))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header("x-ms-error-code", "MessageTooLarge")
                .set_body_string(
                    "<Error><Code>MessageTooLarge</Code><Message>The message exceeds the maximum allowed size.</Message></Error>",
                ),
        )
        .mount(&server)
        .await;

    let queue = test_queue(&server);
    let err = queue
        .enqueue("way too big", Duration::ZERO, MessageTtl::Infinite)
        .await
        .unwrap_err();
    match err {
        QueueError::Service(ServiceError::Status { status, code, .. }) => {
            assert_eq!(status, 400);
            assert_eq!(code, "MessageTooLarge");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

// ============================================================================
// Dequeue Tests
// ============================================================================

#[tokio::test]
async fn test_dequeue_preserves_order() {
    let server = MockServer::start().await;
    let body = r#"<QueueMessagesList>
        <QueueMessage>
            <MessageId>1</MessageId>
            <PopReceipt>p1</PopReceipt>
            <DequeueCount>1</DequeueCount>
            <MessageText>message-body</MessageText>
        </QueueMessage>
        <QueueMessage>
            <MessageId>2</MessageId>
            <PopReceipt>p2</PopReceipt>
            <DequeueCount>1</DequeueCount>
            <MessageText>message-body2</MessageText>
        </QueueMessage>
    </QueueMessagesList>"#;
    Mock::given(method("GET"))
        .and(path("/devaccount/test/messages"))
        .and(query_param("numofmessages", "30"))
        .and(query_param("visibilitytimeout", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let queue = test_queue(&server);
    let messages = queue.dequeue(30, Duration::from_secs(1)).await.unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].id, "1");
    assert_eq!(messages[0].body, "message-body");
    assert_eq!(messages[1].id, "2");
    assert_eq!(messages[1].body, "message-body2");
    assert!(messages.iter().all(|m| m.pop_receipt.is_some()));
}

#[tokio::test]
async fn test_dequeue_empty_queue_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devaccount/test/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<QueueMessagesList />"))
        .mount(&server)
        .await;

    let queue = test_queue(&server);
    let messages = queue.dequeue(1, Duration::from_secs(1)).await.unwrap();
    assert!(messages.is_empty());
}

// ============================================================================
// Peek Tests
// ============================================================================

#[tokio::test]
async fn test_peek_never_yields_receipt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devaccount/test/messages"))
        .and(query_param("peekonly", "true"))
        .and(query_param("numofmessages", "30"))
        .respond_with(
            // Receipt present on the wire; the decode step must drop it.
            ResponseTemplate::new(200).set_body_string(single_message_list("message-body")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let queue = test_queue(&server);
    let messages = queue.peek(30).await.unwrap();

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, "1");
    assert_eq!(messages[0].body, "message-body");
    assert!(messages[0].pop_receipt.is_none());
}

// ============================================================================
// Delete Tests
// ============================================================================

#[tokio::test]
async fn test_delete_addresses_id_and_receipt() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/devaccount/test/messages/1"))
        .and(query_param("popreceipt", "p2"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let queue = test_queue(&server);
    let message = Message {
        id: "1".to_string(),
        pop_receipt: Some(PopReceipt::new("p2".to_string())),
        dequeue_count: 1,
        body: "message-body".to_string(),
    };
    queue.delete(&message).await.unwrap();
}

#[tokio::test]
async fn test_delete_without_receipt_is_local_error() {
    // No mock server interaction: a peeked message fails validation before
    // any request is issued.
    let server = MockServer::start().await;
    let queue = test_queue(&server);

    let peeked = Message {
        id: "1".to_string(),
        pop_receipt: None,
        dequeue_count: 0,
        body: "message-body".to_string(),
    };
    let err = queue.delete(&peeked).await.unwrap_err();
    assert!(matches!(
        err,
        QueueError::Validation(ValidationError::Required { .. })
    ));
}

#[tokio::test]
async fn test_delete_with_stale_receipt_fails() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/devaccount/test/messages/1"))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("x-ms-error-code", "MessageNotFound")
                .set_body_string(
                    "<Error><Code>MessageNotFound</Code><Message>The specified message does not exist.</Message></Error>",
                ),
        )
        .mount(&server)
        .await;

    let queue = test_queue(&server);
    let message = Message {
        id: "1".to_string(),
        pop_receipt: Some(PopReceipt::new("stale".to_string())),
        dequeue_count: 1,
        body: "message-body".to_string(),
    };
    let err = queue.delete(&message).await.unwrap_err();
    match err {
        QueueError::Service(ServiceError::Status { status, code, .. }) => {
            assert_eq!(status, 404);
            assert_eq!(code, "MessageNotFound");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

// ============================================================================
// Deadline Tests
// ============================================================================

#[tokio::test]
async fn test_deadline_surfaces_as_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devaccount/test/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<QueueMessagesList />")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = ServiceClient::new(
        ServiceConfig::new("devaccount", TEST_KEY)
            .with_service_url(format!("{}/{{account}}", server.uri()))
            .with_operation_timeout(Duration::from_millis(50)),
    )
    .unwrap();
    let queue = client.queue(&QueueName::from_str("test").unwrap());

    let err = queue.dequeue(1, Duration::from_secs(1)).await.unwrap_err();
    assert!(
        matches!(err, QueueError::Timeout { .. }),
        "deadline must be distinct from a service rejection, got {:?}",
        err
    );
}
