//! Response rendering.
//!
//! # Responsibilities
//! - Map a [`Reply`] to content type and body
//! - Stream response envelopes and consume them only after the bytes were
//!   handed to the transport
//!
//! # Design Decisions
//! - Every reply is `200 OK`; failures are reported in the body text
//! - A failed delete after delivery is appended as one more diagnostic line
//! - If the client goes away mid-body the response is not consumed

use std::convert::Infallible;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use futures_util::{future, stream, StreamExt};

use crate::http::dispatch::Reply;
use crate::queue::ResponseDelivery;

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_XML: &str = "text/xml";

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Text(text) => with_content_type(TEXT_PLAIN, Body::from(text)),
            Reply::Xml(bytes) => with_content_type(TEXT_XML, Body::from(bytes)),
            Reply::Delivery(delivery) => with_content_type(TEXT_XML, delivery_body(delivery)),
            Reply::Empty => Response::new(Body::empty()),
        }
    }
}

fn with_content_type(content_type: &'static str, body: Body) -> Response {
    let mut response = Response::new(body);
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Body that yields the envelope, then consumes it.
fn delivery_body(delivery: ResponseDelivery) -> Body {
    let (bytes, pending) = delivery.into_parts();

    let head = stream::once(future::ready(Ok::<_, Infallible>(Bytes::from(bytes))));
    let tail = stream::once(async move {
        match pending.complete().await {
            Ok(_) => None,
            Err(err) => Some(Ok::<_, Infallible>(Bytes::from(err.diagnostic()))),
        }
    })
    .filter_map(future::ready);

    Body::from_stream(head.chain(tail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{QueueMode, StorageConfig};
    use crate::queue::{ActionKey, ActionQueue};
    use std::time::Duration;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn content_type(response: &Response) -> Option<&str> {
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn test_text_and_xml_content_types() {
        let response = Reply::ok().into_response();
        assert_eq!(response.status(), 200);
        assert_eq!(content_type(&response), Some("text/plain"));
        assert_eq!(body_text(response).await, "OK\n");

        let response = Reply::Xml(b"<nodes/>".to_vec()).into_response();
        assert_eq!(content_type(&response), Some("text/xml"));
        assert_eq!(body_text(response).await, "<nodes/>");
    }

    #[tokio::test]
    async fn test_empty_reply_has_no_body() {
        let response = Reply::Empty.into_response();
        assert_eq!(content_type(&response), None);
        assert_eq!(body_text(response).await, "");
    }

    #[tokio::test]
    async fn test_delivery_consumed_after_body_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            root_dir: dir.path().to_path_buf(),
            ..StorageConfig::default()
        };
        std::fs::create_dir_all(storage.queries_path()).unwrap();
        let queue = ActionQueue::new(&storage, QueueMode::Legacy, Duration::from_secs(5));
        let key = ActionKey::new(1, 1);
        let path = storage.queries_path().join(key.response_file_name());
        std::fs::write(&path, b"<actionResponse/>").unwrap();

        let delivery = queue.read_response(key).await.unwrap();
        let response = Reply::Delivery(delivery).into_response();
        assert_eq!(content_type(&response), Some("text/xml"));
        assert!(path.exists(), "must not be removed before the body is sent");

        assert_eq!(body_text(response).await, "<actionResponse/>");
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_dropped_body_keeps_response() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            root_dir: dir.path().to_path_buf(),
            ..StorageConfig::default()
        };
        std::fs::create_dir_all(storage.queries_path()).unwrap();
        let queue = ActionQueue::new(&storage, QueueMode::Hardened, Duration::from_secs(5));
        let key = ActionKey::new(2, 2);
        let path = storage.queries_path().join(key.response_file_name());
        std::fs::write(&path, b"<actionResponse/>").unwrap();

        let response = Reply::Delivery(queue.read_response(key).await.unwrap()).into_response();
        drop(response);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_remove_failure_is_appended_after_body() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            root_dir: dir.path().to_path_buf(),
            ..StorageConfig::default()
        };
        std::fs::create_dir_all(storage.queries_path()).unwrap();
        let queue = ActionQueue::new(&storage, QueueMode::Legacy, Duration::from_secs(5));
        let key = ActionKey::new(9, 10);
        let path = storage.queries_path().join(key.response_file_name());
        std::fs::write(&path, b"<actionResponse/>").unwrap();

        let response = Reply::Delivery(queue.read_response(key).await.unwrap()).into_response();
        // a non-empty directory in its place cannot be unlinked
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupant"), b"x").unwrap();

        assert_eq!(
            body_text(response).await,
            concat!(
                "<actionResponse/>",
                "ERROR- Failed to remove file! desiredFileSpec=[queries/actionResponse_00009_00000010.xml]\n",
            )
        );
    }
}
