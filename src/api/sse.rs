//! Server-Sent Events support

use crate::runtime::OutboundEvent;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream
pub fn sse_stream(
    init_event: OutboundEvent,
    broadcast_rx: tokio::sync::broadcast::Receiver<OutboundEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Create stream that starts with init event then broadcasts
    let init = futures::stream::once(async move { Ok(to_sse_event(init_event)) });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(to_sse_event(event))),
        Err(_) => None, // Skip lagged messages
    });

    let combined = init.chain(broadcasts);

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn to_sse_event(event: OutboundEvent) -> Event {
    let (event_type, data) = event_payload(event);
    Event::default().event(event_type).data(data.to_string())
}

fn event_payload(event: OutboundEvent) -> (&'static str, serde_json::Value) {
    match event {
        OutboundEvent::Init { snapshot } => (
            "init",
            json!({
                "type": "init",
                "session": snapshot
            }),
        ),
        OutboundEvent::Message { message } => (
            "message",
            json!({
                "type": "message",
                "message": message
            }),
        ),
        OutboundEvent::StreamStart { message_id, author } => (
            "stream_start",
            json!({
                "type": "stream_start",
                "message_id": message_id,
                "author": author
            }),
        ),
        OutboundEvent::Token { message_id, token } => (
            "token",
            json!({
                "type": "token",
                "message_id": message_id,
                "token": token
            }),
        ),
        OutboundEvent::StateChange { state } => (
            "state_change",
            json!({
                "type": "state_change",
                "state": state
            }),
        ),
        OutboundEvent::Error { message } => (
            "error",
            json!({
                "type": "error",
                "message": message
            }),
        ),
        OutboundEvent::SessionEnded => (
            "session_ended",
            json!({
                "type": "session_ended"
            }),
        ),
    }
}
