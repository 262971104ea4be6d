//! Event vocabularies used by the gateway.
//!
//! The trigger node and the session webhook registration name their events
//! differently (`group.participants` vs `group_participants`, `presence.update`
//! vs `presence`, ...). They are kept as two separate enums; no mapping between
//! them is assumed.

use serde::{Deserialize, Serialize};

/// Events a trigger can listen for. `All` matches every incoming event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TriggerEvent {
    #[serde(rename = "all")]
    All,
    #[serde(rename = "call")]
    Call,
    #[serde(rename = "chat.delete")]
    ChatDelete,
    #[serde(rename = "chat.update")]
    ChatUpdate,
    #[serde(rename = "chat.upsert")]
    ChatUpsert,
    #[serde(rename = "connection.update")]
    ConnectionUpdate,
    #[serde(rename = "contact.update")]
    ContactUpdate,
    #[serde(rename = "group.participants")]
    GroupParticipants,
    #[serde(rename = "group.update")]
    GroupUpdate,
    #[serde(rename = "labels")]
    Labels,
    #[serde(rename = "logged.out")]
    LoggedOut,
    #[default]
    #[serde(rename = "message")]
    Message,
    #[serde(rename = "message.reaction")]
    MessageReaction,
    #[serde(rename = "message.revoke")]
    MessageRevoke,
    #[serde(rename = "message.sent")]
    MessageSent,
    #[serde(rename = "message.update")]
    MessageUpdate,
    #[serde(rename = "presence.update")]
    PresenceUpdate,
    #[serde(rename = "qr")]
    Qr,
}

impl TriggerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerEvent::All => "all",
            TriggerEvent::Call => "call",
            TriggerEvent::ChatDelete => "chat.delete",
            TriggerEvent::ChatUpdate => "chat.update",
            TriggerEvent::ChatUpsert => "chat.upsert",
            TriggerEvent::ConnectionUpdate => "connection.update",
            TriggerEvent::ContactUpdate => "contact.update",
            TriggerEvent::GroupParticipants => "group.participants",
            TriggerEvent::GroupUpdate => "group.update",
            TriggerEvent::Labels => "labels",
            TriggerEvent::LoggedOut => "logged.out",
            TriggerEvent::Message => "message",
            TriggerEvent::MessageReaction => "message.reaction",
            TriggerEvent::MessageRevoke => "message.revoke",
            TriggerEvent::MessageSent => "message.sent",
            TriggerEvent::MessageUpdate => "message.update",
            TriggerEvent::PresenceUpdate => "presence.update",
            TriggerEvent::Qr => "qr",
        }
    }

    /// Whether an incoming event name is selected by this trigger event.
    pub fn selects(&self, incoming: &str) -> bool {
        *self == TriggerEvent::All || self.as_str() == incoming
    }
}

impl std::fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events a session webhook can subscribe to when registered on the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionWebhookEvent {
    Disconnected,
    GroupParticipants,
    GroupUpdate,
    Message,
    MessageAck,
    MessageRevoke,
    Presence,
    Qr,
    Ready,
}
