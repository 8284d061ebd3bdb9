//! Change-notification listener over server-sent events.
//!
//! [`open`] performs the HTTP handshake and returns a [`ChangeStream`]
//! that yields typed [`ListenerEvent`]s until the body ends or fails.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::{Stream, StreamExt};

use crate::api::ContentApi;
use crate::error::ContentError;
use crate::messages::{parse_event, ListenerEvent};
use crate::queries;
use crate::sse::{SseDecoder, SseEvent};

/// Stream of listener events for one connection.
///
/// Ends (`None`) when the server closes the body; yields `Err` once on a
/// transport failure and then ends.
pub type ChangeStream = Pin<Box<dyn Stream<Item = Result<ListenerEvent, ContentError>> + Send>>;

/// Open a listener connection for every watched document type.
pub async fn open(api: &ContentApi) -> Result<ChangeStream, ContentError> {
    let config = api.config();
    let query = queries::listen_query();

    let mut request = api
        .client()
        .get(config.listen_url())
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .query(&[
            ("query", query.as_str()),
            ("includeResult", "false"),
            ("visibility", "query"),
        ]);
    if let Some(token) = config.token.as_deref() {
        request = request.bearer_auth(token);
    }

    let response = ContentApi::ensure_success(request.send().await?).await?;

    tracing::info!(
        project_id = %config.project_id,
        dataset = %config.dataset,
        "Connected to content listener",
    );

    Ok(decode_events(Box::pin(response.bytes_stream())).boxed())
}

struct DecodeState<S> {
    body: S,
    decoder: SseDecoder,
    pending: VecDeque<SseEvent>,
    done: bool,
}

/// Turn a raw byte stream into listener events.
///
/// Frames that fail to parse are logged and skipped.
pub fn decode_events<S, B, E>(
    body: S,
) -> impl Stream<Item = Result<ListenerEvent, ContentError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send,
    E: Into<ContentError> + Send,
{
    let state = DecodeState {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(frame) = state.pending.pop_front() {
                match parse_event(&frame) {
                    Ok(Some(event)) => return Some((Ok(event), state)),
                    Ok(None) => {
                        tracing::trace!(event = %frame.event, "Ignoring listener event");
                    }
                    Err(e) => {
                        tracing::warn!(
                            event = %frame.event,
                            error = %e,
                            "Malformed listener event",
                        );
                    }
                }
                continue;
            }

            if state.done {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => match state.decoder.feed(chunk.as_ref()) {
                    Ok(frames) => state.pending.extend(frames),
                    Err(e) => {
                        state.done = true;
                        return Some((Err(e), state));
                    }
                },
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(e.into()), state));
                }
                None => return None,
            }
        }
    })
}
