//! Inbound webhook event filtering.
//!
//! Every delivery from the gateway runs through [`should_forward`] exactly once.
//! The checks short-circuit in a fixed order; the first one that fails
//! suppresses the event.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::events::TriggerEvent;

/// Marker in the sender id of WhatsApp status (story) posts.
const STATUS_BROADCAST: &str = "status@broadcast";

/// Optional filters of a trigger.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FilterOptions {
    #[serde(default)]
    pub session_filter: Option<String>,
    #[serde(default)]
    pub chat_id_filter: Option<String>,
    #[serde(default = "default_ignore_status")]
    pub ignore_status: bool,
    #[serde(default)]
    pub only_from_me: bool,
    #[serde(default)]
    pub only_from_others: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            session_filter: None,
            chat_id_filter: None,
            ignore_status: default_ignore_status(),
            only_from_me: false,
            only_from_others: false,
        }
    }
}

fn default_ignore_status() -> bool {
    true
}

/// Event selection plus filter options for one trigger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerFilter {
    pub event: TriggerEvent,
    pub options: FilterOptions,
}

impl TriggerFilter {
    pub fn new(event: TriggerEvent, options: FilterOptions) -> Self {
        Self { event, options }
    }
}

/// Why an event was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    EventMismatch,
    SessionMismatch,
    ChatIdMismatch,
    StatusMessage,
    NotFromMe,
    FromMe,
}

impl std::fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SuppressReason::EventMismatch => "event does not match",
            SuppressReason::SessionMismatch => "session does not match",
            SuppressReason::ChatIdMismatch => "chat id does not match",
            SuppressReason::StatusMessage => "status message",
            SuppressReason::NotFromMe => "not sent by me",
            SuppressReason::FromMe => "sent by me",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Forward this shaped payload to the workflow.
    Forward(Value),
    Suppress(SuppressReason),
}

/// Decide whether a raw webhook delivery triggers the workflow.
///
/// The forwarded payload is `{event, session, timestamp}` overlaid with every
/// key of the raw delivery, so raw keys of the same name win.
pub fn should_forward(raw: &Value, filter: &TriggerFilter, now: DateTime<Utc>) -> Decision {
    let empty = Map::new();
    let body = raw.as_object().unwrap_or(&empty);
    let options = &filter.options;

    let incoming_event = body.get("event").and_then(Value::as_str).unwrap_or("");
    if !filter.event.selects(incoming_event) {
        return Decision::Suppress(SuppressReason::EventMismatch);
    }

    let payload = first_truthy(&[body.get("payload"), body.get("data")]).unwrap_or(raw);

    let session = first_truthy(&[body.get("session"), payload.get("session")])
        .and_then(Value::as_str)
        .unwrap_or("");

    if let Some(wanted) = non_empty(&options.session_filter) {
        if session != wanted {
            return Decision::Suppress(SuppressReason::SessionMismatch);
        }
    }

    if let Some(wanted) = non_empty(&options.chat_id_filter) {
        let chat_id = first_truthy(&[
            payload.get("from"),
            payload.get("chatId"),
            payload.get("chat").and_then(|c| c.get("id")),
        ])
        .and_then(Value::as_str)
        .unwrap_or("");
        if chat_id != wanted {
            return Decision::Suppress(SuppressReason::ChatIdMismatch);
        }
    }

    if incoming_event == TriggerEvent::Message.as_str() || filter.event == TriggerEvent::All {
        if options.ignore_status && is_status(payload) {
            return Decision::Suppress(SuppressReason::StatusMessage);
        }

        let from_me = payload.get("fromMe").is_some_and(truthy);
        if options.only_from_me && !from_me {
            return Decision::Suppress(SuppressReason::NotFromMe);
        }
        if options.only_from_others && from_me {
            return Decision::Suppress(SuppressReason::FromMe);
        }
    }

    let mut shaped = Map::new();
    shaped.insert("event".into(), Value::from(incoming_event));
    shaped.insert("session".into(), Value::from(session));
    shaped.insert(
        "timestamp".into(),
        Value::from(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    for (key, value) in body {
        shaped.insert(key.clone(), value.clone());
    }

    Decision::Forward(Value::Object(shaped))
}

fn is_status(payload: &Value) -> bool {
    if payload.get("isStatus") == Some(&Value::Bool(true)) {
        return true;
    }
    payload
        .get("from")
        .and_then(Value::as_str)
        .is_some_and(|from| from.contains(STATUS_BROADCAST))
}

/// First value that is not null, false, zero or an empty string.
fn first_truthy<'a>(candidates: &[Option<&'a Value>]) -> Option<&'a Value> {
    candidates.iter().flatten().copied().find(|v| truthy(v))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
    }

    fn filter(event: TriggerEvent, options: FilterOptions) -> TriggerFilter {
        TriggerFilter::new(event, options)
    }

    impl Decision {
        fn is_forward(&self) -> bool {
            matches!(self, Decision::Forward(_))
        }
    }

    fn message_from_other() -> Value {
        json!({"event": "message", "payload": {"from": "1@c.us", "fromMe": false}})
    }

    #[test]
    fn test_only_from_others_forwards_foreign_message() {
        let f = filter(
            TriggerEvent::Message,
            FilterOptions {
                only_from_others: true,
                ..Default::default()
            },
        );
        assert!(should_forward(&message_from_other(), &f, now()).is_forward());
    }

    #[test]
    fn test_only_from_me_suppresses_foreign_message() {
        let f = filter(
            TriggerEvent::Message,
            FilterOptions {
                only_from_me: true,
                ..Default::default()
            },
        );
        assert_eq!(
            should_forward(&message_from_other(), &f, now()),
            Decision::Suppress(SuppressReason::NotFromMe)
        );
    }

    #[test]
    fn test_only_from_others_suppresses_own_message() {
        let raw = json!({"event": "message", "payload": {"from": "1@c.us", "fromMe": true}});
        let f = filter(
            TriggerEvent::Message,
            FilterOptions {
                only_from_others: true,
                ..Default::default()
            },
        );
        assert_eq!(
            should_forward(&raw, &f, now()),
            Decision::Suppress(SuppressReason::FromMe)
        );
    }

    #[test]
    fn test_both_direction_filters_suppress_everything() {
        let f = filter(
            TriggerEvent::All,
            FilterOptions {
                only_from_me: true,
                only_from_others: true,
                ..Default::default()
            },
        );
        let mine = json!({"event": "message", "payload": {"fromMe": true}});
        assert!(!should_forward(&mine, &f, now()).is_forward());
        assert!(!should_forward(&message_from_other(), &f, now()).is_forward());
    }

    #[test]
    fn test_status_broadcast_suppressed_by_default() {
        let raw = json!({
            "event": "message",
            "payload": {"from": "status@broadcast", "fromMe": false}
        });
        let f = filter(
            TriggerEvent::Message,
            FilterOptions {
                only_from_others: true,
                ..Default::default()
            },
        );
        assert_eq!(
            should_forward(&raw, &f, now()),
            Decision::Suppress(SuppressReason::StatusMessage)
        );
    }

    #[test]
    fn test_is_status_flag_suppressed() {
        let raw = json!({"event": "message", "data": {"from": "1@c.us", "isStatus": true}});
        let f = filter(TriggerEvent::Message, FilterOptions::default());
        assert!(!should_forward(&raw, &f, now()).is_forward());

        let f = filter(
            TriggerEvent::Message,
            FilterOptions {
                ignore_status: false,
                ..Default::default()
            },
        );
        assert!(should_forward(&raw, &f, now()).is_forward());
    }

    #[test]
    fn test_event_mismatch() {
        let raw = json!({"event": "chat.upsert", "payload": {}});
        let f = filter(TriggerEvent::Message, FilterOptions::default());
        assert_eq!(
            should_forward(&raw, &f, now()),
            Decision::Suppress(SuppressReason::EventMismatch)
        );
    }

    #[test]
    fn test_missing_event_only_matches_all() {
        let raw = json!({"payload": {"from": "1@c.us"}});
        let message = filter(TriggerEvent::Message, FilterOptions::default());
        let all = filter(TriggerEvent::All, FilterOptions::default());
        assert!(!should_forward(&raw, &message, now()).is_forward());
        assert!(should_forward(&raw, &all, now()).is_forward());
    }

    #[test]
    fn test_all_forwards_every_event_type() {
        let f = filter(TriggerEvent::All, FilterOptions::default());
        for event in ["connection.update", "qr", "group.update", "something.new"] {
            let raw = json!({"event": event, "payload": {"session": "s1"}});
            assert!(should_forward(&raw, &f, now()).is_forward(), "{}", event);
        }
    }

    #[test]
    fn test_message_filters_skip_other_events_when_selected() {
        // Message-scoped options do not apply to a specific non-message event.
        let raw = json!({"event": "message.update", "payload": {"fromMe": false}});
        let f = filter(
            TriggerEvent::MessageUpdate,
            FilterOptions {
                only_from_me: true,
                ..Default::default()
            },
        );
        assert!(should_forward(&raw, &f, now()).is_forward());
    }

    #[test]
    fn test_session_filter_mismatch_always_suppresses() {
        let f = filter(
            TriggerEvent::All,
            FilterOptions {
                session_filter: Some("main".into()),
                ..Default::default()
            },
        );
        for event in ["message", "qr", "connection.update"] {
            let raw = json!({"event": event, "payload": {"session": "other"}});
            assert_eq!(
                should_forward(&raw, &f, now()),
                Decision::Suppress(SuppressReason::SessionMismatch)
            );
        }
        let raw = json!({"event": "qr", "payload": {}});
        assert!(!should_forward(&raw, &f, now()).is_forward());
    }

    #[test]
    fn test_top_level_session_takes_precedence() {
        let raw = json!({"event": "qr", "session": "main", "payload": {"session": "other"}});
        let f = filter(
            TriggerEvent::Qr,
            FilterOptions {
                session_filter: Some("main".into()),
                ..Default::default()
            },
        );
        assert!(should_forward(&raw, &f, now()).is_forward());
    }

    #[test]
    fn test_empty_session_filter_is_ignored() {
        let f = filter(
            TriggerEvent::Message,
            FilterOptions {
                session_filter: Some(String::new()),
                ..Default::default()
            },
        );
        assert!(should_forward(&message_from_other(), &f, now()).is_forward());
    }

    #[test]
    fn test_chat_id_resolution_order() {
        let f = filter(
            TriggerEvent::All,
            FilterOptions {
                chat_id_filter: Some("42@c.us".into()),
                ..Default::default()
            },
        );
        let by_chat_id = json!({"event": "chat.update", "payload": {"chatId": "42@c.us"}});
        let by_nested = json!({"event": "chat.update", "payload": {"chat": {"id": "42@c.us"}}});
        let from_wins = json!({
            "event": "chat.update",
            "payload": {"from": "7@c.us", "chatId": "42@c.us"}
        });
        let empty_from = json!({
            "event": "chat.update",
            "payload": {"from": "", "chatId": "42@c.us"}
        });

        assert!(should_forward(&by_chat_id, &f, now()).is_forward());
        assert!(should_forward(&by_nested, &f, now()).is_forward());
        assert_eq!(
            should_forward(&from_wins, &f, now()),
            Decision::Suppress(SuppressReason::ChatIdMismatch)
        );
        assert!(should_forward(&empty_from, &f, now()).is_forward());
    }

    #[test]
    fn test_unwrap_falls_back_to_raw_body() {
        let raw = json!({"event": "message", "from": "9@c.us", "fromMe": true, "session": "s"});
        let f = filter(
            TriggerEvent::Message,
            FilterOptions {
                only_from_me: true,
                chat_id_filter: Some("9@c.us".into()),
                ..Default::default()
            },
        );
        assert!(should_forward(&raw, &f, now()).is_forward());
    }

    #[test]
    fn test_null_payload_falls_through_to_data() {
        let raw = json!({"event": "message", "payload": null, "data": {"fromMe": true}});
        let f = filter(
            TriggerEvent::Message,
            FilterOptions {
                only_from_me: true,
                ..Default::default()
            },
        );
        assert!(should_forward(&raw, &f, now()).is_forward());
    }

    #[test]
    fn test_shaped_payload() {
        let raw = json!({"event": "message", "payload": {"session": "s1", "from": "1@c.us"}});
        let f = filter(TriggerEvent::Message, FilterOptions::default());
        let Decision::Forward(shaped) = should_forward(&raw, &f, now()) else {
            panic!("expected forward");
        };
        assert_eq!(
            shaped,
            json!({
                "event": "message",
                "session": "s1",
                "timestamp": "2026-01-02T03:04:05.000Z",
                "payload": {"session": "s1", "from": "1@c.us"},
            })
        );
    }

    #[test]
    fn test_raw_keys_win_over_computed_keys() {
        let raw = json!({
            "event": "message",
            "session": "s1",
            "timestamp": 1700000000,
            "payload": {"from": "1@c.us"},
        });
        let f = filter(TriggerEvent::Message, FilterOptions::default());
        let Decision::Forward(shaped) = should_forward(&raw, &f, now()) else {
            panic!("expected forward");
        };
        assert_eq!(shaped["timestamp"], json!(1700000000));
        assert_eq!(shaped["session"], json!("s1"));
    }

    #[test]
    fn test_options_deserialize_defaults() {
        let options: FilterOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options, FilterOptions::default());
        assert!(options.ignore_status);
    }
}
