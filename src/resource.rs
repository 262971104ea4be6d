use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChateryError;

/// Top-level category of a node action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Chat,
    Group,
    History,
    Session,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Chat => "chat",
            Resource::Group => "group",
            Resource::History => "history",
            Resource::Session => "session",
        }
    }
}

impl FromStr for Resource {
    type Err = ChateryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(Resource::Chat),
            "group" => Ok(Resource::Group),
            "history" => Ok(Resource::History),
            "session" => Ok(Resource::Session),
            other => Err(ChateryError::UnknownResource(other.to_string())),
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOperation {
    SendText,
    SendImage,
    SendDocument,
    SendLocation,
    SendContact,
    SendButton,
    SendPresenceUpdate,
    CheckNumber,
    ProfilePicture,
    ContactInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOperation {
    List,
    Connect,
    Status,
    UpdateConfig,
    AddWebhook,
    RemoveWebhook,
    QrCode,
    QrImage,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOperation {
    Overview,
    Contacts,
    Messages,
    Info,
    MarkRead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOperation {
    List,
    Create,
    Metadata,
    AddParticipants,
    RemoveParticipants,
    PromoteParticipants,
    DemoteParticipants,
    UpdateSubject,
    UpdateDescription,
    UpdateSettings,
    UpdatePicture,
    Leave,
    Join,
    GetInviteCode,
    RevokeInvite,
}

/// A resolved (resource, operation) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Chat(ChatOperation),
    Session(SessionOperation),
    History(HistoryOperation),
    Group(GroupOperation),
}

impl Operation {
    /// Resolve an operation name within a resource.
    pub fn parse(resource: Resource, operation: &str) -> Result<Self, ChateryError> {
        let resolved = match resource {
            Resource::Chat => chat_operation(operation).map(Operation::Chat),
            Resource::Session => session_operation(operation).map(Operation::Session),
            Resource::History => history_operation(operation).map(Operation::History),
            Resource::Group => group_operation(operation).map(Operation::Group),
        };
        resolved.ok_or_else(|| ChateryError::UnknownOperation {
            resource: resource.to_string(),
            operation: operation.to_string(),
        })
    }
}

fn chat_operation(name: &str) -> Option<ChatOperation> {
    Some(match name {
        "sendText" => ChatOperation::SendText,
        "sendImage" => ChatOperation::SendImage,
        "sendDocument" => ChatOperation::SendDocument,
        "sendLocation" => ChatOperation::SendLocation,
        "sendContact" => ChatOperation::SendContact,
        "sendButton" => ChatOperation::SendButton,
        "sendPresenceUpdate" => ChatOperation::SendPresenceUpdate,
        "checkNumber" => ChatOperation::CheckNumber,
        "profilePicture" => ChatOperation::ProfilePicture,
        "contactInfo" => ChatOperation::ContactInfo,
        _ => return None,
    })
}

fn session_operation(name: &str) -> Option<SessionOperation> {
    Some(match name {
        "list" => SessionOperation::List,
        "connect" => SessionOperation::Connect,
        "status" => SessionOperation::Status,
        "updateConfig" => SessionOperation::UpdateConfig,
        "addWebhook" => SessionOperation::AddWebhook,
        "removeWebhook" => SessionOperation::RemoveWebhook,
        "qrCode" => SessionOperation::QrCode,
        "qrImage" => SessionOperation::QrImage,
        "delete" => SessionOperation::Delete,
        _ => return None,
    })
}

fn history_operation(name: &str) -> Option<HistoryOperation> {
    Some(match name {
        "overview" => HistoryOperation::Overview,
        "contacts" => HistoryOperation::Contacts,
        "messages" => HistoryOperation::Messages,
        "info" => HistoryOperation::Info,
        "markRead" => HistoryOperation::MarkRead,
        _ => return None,
    })
}

fn group_operation(name: &str) -> Option<GroupOperation> {
    Some(match name {
        "list" => GroupOperation::List,
        "create" => GroupOperation::Create,
        "metadata" => GroupOperation::Metadata,
        "addParticipants" => GroupOperation::AddParticipants,
        "removeParticipants" => GroupOperation::RemoveParticipants,
        "promoteParticipants" => GroupOperation::PromoteParticipants,
        "demoteParticipants" => GroupOperation::DemoteParticipants,
        "updateSubject" => GroupOperation::UpdateSubject,
        "updateDescription" => GroupOperation::UpdateDescription,
        "updateSettings" => GroupOperation::UpdateSettings,
        "updatePicture" => GroupOperation::UpdatePicture,
        "leave" => GroupOperation::Leave,
        "join" => GroupOperation::Join,
        "getInviteCode" => GroupOperation::GetInviteCode,
        "revokeInvite" => GroupOperation::RevokeInvite,
        _ => return None,
    })
}

/// Chat presence states accepted by `sendPresenceUpdate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Available,
    #[default]
    Composing,
    Paused,
    Recording,
    Unavailable,
}

/// Group settings accepted by `updateSettings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroupSetting {
    /// Only admins can send messages
    #[default]
    Announcement,
    NotAnnouncement,
    /// Only admins can edit group info
    Locked,
    Unlocked,
}

/// Chat type filter for the history overview. The empty string means all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ChatType {
    #[default]
    #[serde(rename = "")]
    All,
    #[serde(rename = "group")]
    Group,
    #[serde(rename = "private")]
    Private,
}
