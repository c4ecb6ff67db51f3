//! Exactly-once response writing.

use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use parking_lot::Mutex;
use sales_core::AppError;
use serde::Serialize;

#[derive(Default)]
struct Slot {
    status: Option<StatusCode>,
    response: Option<Response>,
}

/// Per-request response slot shared by every clone of a request's
/// [`Context`](super::Context).
///
/// The first [`respond`](ResponseWriter::respond) wins. Any later call is
/// rejected with an unclassified error and leaves the first response intact.
#[derive(Clone, Default)]
pub struct ResponseWriter {
    slot: Arc<Mutex<Slot>>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes `data` as JSON with `status`. A `204` is written without a body.
    pub fn respond<T>(&self, data: &T, status: StatusCode) -> Result<(), AppError>
    where
        T: Serialize + ?Sized,
    {
        let body = if status == StatusCode::NO_CONTENT {
            None
        } else {
            Some(serde_json::to_vec(data)?)
        };

        let mut slot = self.slot.lock();
        if let Some(first) = slot.status {
            return Err(AppError::internal(anyhow!(
                "response already written with status {first}, refusing {status}"
            )));
        }

        let mut response = match body {
            None => Response::new(Body::empty()),
            Some(bytes) => {
                let mut response = Response::new(Body::from(bytes));
                response.headers_mut().insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                response
            }
        };
        *response.status_mut() = status;

        slot.status = Some(status);
        slot.response = Some(response);
        Ok(())
    }

    /// True once a response has been written.
    pub fn is_started(&self) -> bool {
        self.slot.lock().status.is_some()
    }

    /// Status of the written response, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.slot.lock().status
    }

    /// Hands the written response to the server. The status stays recorded,
    /// so the slot still refuses further writes.
    pub(crate) fn take(&self) -> Option<Response> {
        self.slot.lock().response.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    async fn body_of(response: Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    #[tokio::test]
    async fn test_respond_writes_json() {
        let writer = ResponseWriter::new();
        writer.respond(&json!({"status": "ok"}), StatusCode::OK).unwrap();

        assert!(writer.is_started());
        assert_eq!(writer.status(), Some(StatusCode::OK));

        let response = writer.take().unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(body_of(response).await, br#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn test_no_content_has_empty_body() {
        let writer = ResponseWriter::new();
        writer.respond(&json!({"ignored": true}), StatusCode::NO_CONTENT).unwrap();

        let response = writer.take().unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
        assert!(body_of(response).await.is_empty());
    }

    #[test]
    fn test_second_respond_is_rejected() {
        let writer = ResponseWriter::new();
        writer.respond(&json!({"n": 1}), StatusCode::CREATED).unwrap();

        let err = writer.respond(&json!({"n": 2}), StatusCode::OK).unwrap_err();
        assert_eq!(err.kind(), "unclassified");
        assert_eq!(writer.status(), Some(StatusCode::CREATED));
    }

    #[test]
    fn test_clones_share_the_slot() {
        let writer = ResponseWriter::new();
        let clone = writer.clone();
        clone.respond(&json!({}), StatusCode::OK).unwrap();
        assert!(writer.is_started());
        assert!(writer.respond(&json!({}), StatusCode::OK).is_err());
    }

    #[test]
    fn test_take_keeps_slot_closed() {
        let writer = ResponseWriter::new();
        writer.respond(&json!({}), StatusCode::OK).unwrap();
        assert!(writer.take().is_some());
        assert!(writer.take().is_none());
        assert!(writer.respond(&json!({}), StatusCode::OK).is_err());
    }
}
