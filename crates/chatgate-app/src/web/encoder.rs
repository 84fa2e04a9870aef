//! Server-sent-event response body for normalized chat events.

use std::convert::Infallible;

use async_stream::stream;
use axum::{
    body::{Body, Bytes},
    http::{
        header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE},
        HeaderName, HeaderValue,
    },
    response::Response,
};
use futures::{Stream, StreamExt};
use uuid::Uuid;

use chatgate_models::{ErrorInfo, EventKind, StreamEvent};

/// Frame written after a stream that ended without error
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// Encode one event as a `data:` frame
pub fn sse_frame(event: &StreamEvent) -> String {
    match serde_json::to_string(event) {
        Ok(json) => format!("data: {}\n\n", json),
        Err(e) => {
            tracing::error!("failed to serialize stream event: {}", e);
            let fallback = StreamEvent::new(
                EventKind::Error {
                    error: ErrorInfo {
                        message: "failed to encode event".to_string(),
                        code: "stream_error".to_string(),
                    },
                },
                event.id.clone(),
                event.model.clone(),
            );
            format!(
                "data: {}\n\n",
                serde_json::to_string(&fallback).unwrap_or_default()
            )
        }
    }
}

/// Logs when the client goes away before the stream finished
struct DisconnectGuard {
    request_id: Uuid,
    finished: bool,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        if !self.finished {
            tracing::info!(
                request_id = %self.request_id,
                "client disconnected, provider stream released"
            );
        }
    }
}

/// Body frames: every event as it arrives, then `[DONE]` unless the last event was an error
pub fn sse_body<S>(events: S, request_id: Uuid) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static
where
    S: Stream<Item = StreamEvent> + Send + 'static,
{
    stream! {
        let mut guard = DisconnectGuard {
            request_id,
            finished: false,
        };
        let mut events = Box::pin(events);
        let mut sent = 0usize;
        let mut failed = false;

        while let Some(event) = events.next().await {
            failed = event.is_error();
            sent += 1;
            yield Ok(Bytes::from(sse_frame(&event)));
            if failed {
                break;
            }
        }

        if !failed {
            yield Ok(Bytes::from_static(DONE_FRAME.as_bytes()));
        }

        guard.finished = true;
        tracing::info!(%request_id, events = sent, failed, "chat stream finished");
    }
}

/// Wrap normalized events into a streaming `200 OK` response
pub fn sse_response<S>(events: S, request_id: Uuid) -> Response
where
    S: Stream<Item = StreamEvent> + Send + 'static,
{
    let mut response = Response::new(Body::from_stream(sse_body(events, request_id)));

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );

    response
}
