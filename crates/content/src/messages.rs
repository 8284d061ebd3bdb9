//! Listener message types and parser.
//!
//! The listener sends named server-sent events (`welcome`, `mutation`,
//! `reconnect`, `channelError`, `disconnect`) whose data is JSON. This
//! module turns them into a strongly-typed [`ListenerEvent`].

use serde::Deserialize;

use crate::sse::SseEvent;

/// Id prefix of unpublished draft documents.
const DRAFT_PREFIX: &str = "drafts.";

/// Id prefix of documents staged in a release.
const VERSION_PREFIX: &str = "versions.";

#[derive(Debug, Clone, PartialEq)]
pub enum ListenerEvent {
    /// The subscription is established.
    Welcome { listener_name: Option<String> },
    /// A watched document changed.
    Mutation(ChangeNotification),
    /// The server asks the client to reconnect.
    Reconnect,
    /// The server reported an error on the channel.
    ChannelError(String),
    /// The server closed the channel.
    Disconnect(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Appear,
    #[default]
    Update,
    Disappear,
    #[serde(other)]
    Unknown,
}

/// Payload of a `mutation` event. Only identifies what changed; the
/// player always re-fetches the full menu.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeNotification {
    pub document_id: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub transition: Transition,
}

impl ChangeNotification {
    /// Published documents only: drafts and release versions are not
    /// visible to the player.
    pub fn is_published(&self) -> bool {
        !self.document_id.starts_with(DRAFT_PREFIX)
            && !self.document_id.starts_with(VERSION_PREFIX)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WelcomeData {
    #[serde(default)]
    listener_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageData {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

impl MessageData {
    fn parse(data: &str) -> Self {
        serde_json::from_str(data).unwrap_or_default()
    }

    fn text(self, fallback: &str) -> String {
        self.message
            .or(self.reason)
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Parse one server-sent event into a typed [`ListenerEvent`].
///
/// Returns `Ok(None)` for event names the player does not care about.
/// Returns `Err` for a `welcome` or `mutation` with malformed data;
/// callers should log and continue.
pub fn parse_event(event: &SseEvent) -> Result<Option<ListenerEvent>, serde_json::Error> {
    let parsed = match event.event.as_str() {
        "welcome" => {
            let data: WelcomeData = if event.data.trim().is_empty() {
                WelcomeData {
                    listener_name: None,
                }
            } else {
                serde_json::from_str(&event.data)?
            };
            ListenerEvent::Welcome {
                listener_name: data.listener_name,
            }
        }
        "mutation" => ListenerEvent::Mutation(serde_json::from_str(&event.data)?),
        "reconnect" => ListenerEvent::Reconnect,
        "channelError" => {
            ListenerEvent::ChannelError(MessageData::parse(&event.data).text("channel error"))
        }
        "disconnect" => {
            ListenerEvent::Disconnect(MessageData::parse(&event.data).text("disconnected"))
        }
        _ => return Ok(None),
    };
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sse(event: &str, data: &str) -> SseEvent {
        SseEvent {
            event: event.into(),
            data: data.into(),
            id: None,
        }
    }

    #[test]
    fn parse_welcome() {
        let msg = parse_event(&sse("welcome", r#"{"listenerName":"L1"}"#)).unwrap();
        assert_eq!(
            msg,
            Some(ListenerEvent::Welcome {
                listener_name: Some("L1".into())
            })
        );
    }

    #[test]
    fn parse_mutation() {
        let data = r#"{"documentId":"item-latte","transactionId":"tx1","transition":"update","visibility":"query","mutations":[]}"#;
        let msg = parse_event(&sse("mutation", data)).unwrap();

        assert_matches!(msg, Some(ListenerEvent::Mutation(ref n)) if n.document_id == "item-latte");
        if let Some(ListenerEvent::Mutation(n)) = msg {
            assert_eq!(n.transaction_id.as_deref(), Some("tx1"));
            assert_eq!(n.transition, Transition::Update);
            assert!(n.is_published());
        }
    }

    #[test]
    fn draft_and_version_ids_are_not_published() {
        let draft: ChangeNotification =
            serde_json::from_str(r#"{"documentId":"drafts.item-latte"}"#).unwrap();
        let staged: ChangeNotification =
            serde_json::from_str(r#"{"documentId":"versions.r1.item-latte"}"#).unwrap();

        assert!(!draft.is_published());
        assert!(!staged.is_published());
    }

    #[test]
    fn mutation_without_document_id_is_an_error() {
        assert!(parse_event(&sse("mutation", r#"{"transition":"appear"}"#)).is_err());
    }

    #[test]
    fn channel_error_and_disconnect_carry_text() {
        let msg = parse_event(&sse("channelError", r#"{"message":"boom"}"#)).unwrap();
        assert_eq!(msg, Some(ListenerEvent::ChannelError("boom".into())));

        let msg = parse_event(&sse("disconnect", r#"{"reason":"shutdown"}"#)).unwrap();
        assert_eq!(msg, Some(ListenerEvent::Disconnect("shutdown".into())));

        let msg = parse_event(&sse("disconnect", "")).unwrap();
        assert_eq!(msg, Some(ListenerEvent::Disconnect("disconnected".into())));
    }

    #[test]
    fn unknown_events_are_skipped() {
        assert_eq!(parse_event(&sse("message", "{}")).unwrap(), None);
        assert_eq!(
            parse_event(&sse("reconnect", "")).unwrap(),
            Some(ListenerEvent::Reconnect)
        );
    }
}
