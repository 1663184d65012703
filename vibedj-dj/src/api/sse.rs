//! Server-Sent Events stream
//!
//! `GET /events` streams every [`VibeEvent`]; `?session=<id>` narrows the
//! stream to that session's events.

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};
use uuid::Uuid;
use vibedj_common::VibeEvent;

use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    pub session: Option<Uuid>,
}

impl EventFilter {
    fn accepts(&self, event: &VibeEvent) -> bool {
        match self.session {
            Some(session_id) => event.session_id() == Some(session_id),
            None => true,
        }
    }
}

/// GET /events
pub async fn event_stream(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(session = ?filter.session, "New SSE client connected");

    let rx = state.event_bus.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let event = match result {
            Ok(event) if filter.accepts(&event) => Some(event),
            Ok(_) => None,
            Err(e) => {
                // Lagged: the subscriber missed events, keep streaming
                warn!("SSE stream error: {:?}", e);
                None
            }
        };
        async move {
            let event = event?;
            match serde_json::to_string(&event) {
                Ok(json) => Some(Ok(Event::default().event(event.event_type()).data(json))),
                Err(e) => {
                    warn!("Failed to serialize event: {}", e);
                    None
                }
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
