//! Long-lived change subscription: connect -> forward -> reconnect.
//!
//! [`run_subscription`] owns the single listener connection for the
//! player. It forwards published-document changes and connection state
//! as [`ListenerSignal`]s and reconnects with backoff whenever the
//! stream fails, until cancelled.

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ContentError;
use crate::listener::ChangeStream;
use crate::messages::{ChangeNotification, ListenerEvent};
use crate::reconnect::{reconnect_loop, Backoff, ReconnectConfig};
use crate::source::ContentSource;

#[derive(Debug, Clone, PartialEq)]
pub enum ListenerSignal {
    /// A stream is open. `reconnected` is false only for the first one.
    Connected { reconnected: bool },
    /// A published document changed.
    Change(ChangeNotification),
    /// The stream failed or could not be opened; reconnecting.
    Lost(String),
}

enum StreamEnd {
    Lost(String),
    Stopped,
}

/// Run until `cancel` fires or the receiving side is dropped.
pub async fn run_subscription(
    source: &dyn ContentSource,
    signals: &mpsc::Sender<ListenerSignal>,
    reconnect: &ReconnectConfig,
    cancel: &CancellationToken,
) {
    let mut next: Result<ChangeStream, ContentError> = tokio::select! {
        _ = cancel.cancelled() => return,
        result = source.listen() => result,
    };
    let mut backoff = Backoff::new(reconnect.clone());
    let mut reconnected = false;

    loop {
        let stream = match next {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "Content listener unavailable");
                if !emit(signals, cancel, ListenerSignal::Lost(e.to_string())).await {
                    return;
                }
                match reconnect_loop(source, &mut backoff, cancel).await {
                    Some(stream) => stream,
                    None => return,
                }
            }
        };

        if !emit(signals, cancel, ListenerSignal::Connected { reconnected }).await {
            return;
        }
        reconnected = true;

        let opened_at = Instant::now();
        match forward(stream, signals, cancel).await {
            StreamEnd::Stopped => return,
            StreamEnd::Lost(reason) => {
                if backoff.is_stable(opened_at.elapsed()) {
                    backoff.reset();
                }
                next = Err(ContentError::Disconnected(reason));
            }
        }
    }
}

/// Send one signal unless cancelled first. Returns `false` when the
/// subscription should stop.
async fn emit(
    signals: &mpsc::Sender<ListenerSignal>,
    cancel: &CancellationToken,
    signal: ListenerSignal,
) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        sent = signals.send(signal) => sent.is_ok(),
    }
}

async fn forward(
    mut stream: ChangeStream,
    signals: &mpsc::Sender<ListenerSignal>,
    cancel: &CancellationToken,
) -> StreamEnd {
    loop {
        let item = tokio::select! {
            _ = cancel.cancelled() => return StreamEnd::Stopped,
            item = stream.next() => item,
        };

        let event = match item {
            Some(Ok(event)) => event,
            Some(Err(e)) => return StreamEnd::Lost(e.to_string()),
            None => return StreamEnd::Lost("stream ended".to_string()),
        };

        match event {
            ListenerEvent::Welcome { listener_name } => {
                tracing::debug!(?listener_name, "Listener welcome");
            }
            ListenerEvent::Mutation(change) => {
                if !change.is_published() {
                    tracing::debug!(document_id = %change.document_id, "Skipping unpublished change");
                    continue;
                }
                tracing::debug!(
                    document_id = %change.document_id,
                    transition = ?change.transition,
                    "Content changed",
                );
                if !emit(signals, cancel, ListenerSignal::Change(change)).await {
                    return StreamEnd::Stopped;
                }
            }
            ListenerEvent::Reconnect => {
                return StreamEnd::Lost("server requested reconnect".to_string());
            }
            ListenerEvent::ChannelError(message) => return StreamEnd::Lost(message),
            ListenerEvent::Disconnect(reason) => return StreamEnd::Lost(reason),
        }
    }
}
