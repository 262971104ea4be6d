//! Request construction for every node operation.
//!
//! Each (resource, operation) pair maps to exactly one method and path. Bodies
//! carry only the fields the operation needs; optional fields are sent only
//! when they hold something meaningful.

use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::client::ChateryClient;
use crate::error::Result;
use crate::events::SessionWebhookEvent;
use crate::params::{
    parse_metadata, parse_participants, Button, NodeParameters, WebhookRegistration,
};
use crate::resource::{
    ChatOperation, ChatType, GroupOperation, GroupSetting, HistoryOperation, Operation, Presence,
    Resource, SessionOperation,
};

const CHATS: &str = "/api/whatsapp/chats";
const GROUPS: &str = "/api/whatsapp/groups";
const SESSIONS: &str = "/api/whatsapp/sessions";

/// One outbound gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl RequestSpec {
    fn get(path: String) -> Self {
        Self {
            method: Method::GET,
            path,
            body: None,
        }
    }

    fn with_body(method: Method, path: String, body: Map<String, Value>) -> Self {
        Self {
            method,
            path,
            body: Some(Value::Object(body)),
        }
    }

    fn post(path: String, body: Map<String, Value>) -> Self {
        Self::with_body(Method::POST, path, body)
    }
}

/// Resolve a (resource, operation) pair and run it against the gateway.
pub async fn dispatch(
    client: &ChateryClient,
    resource: &str,
    operation: &str,
    params: &NodeParameters,
) -> Result<Value> {
    let resource: Resource = resource.parse()?;
    let operation = Operation::parse(resource, operation)?;
    let spec = build_request(operation, params)?;
    client.execute(&spec).await
}

/// Build the request for an operation without sending it.
pub fn build_request(operation: Operation, params: &NodeParameters) -> Result<RequestSpec> {
    let spec = match operation {
        Operation::Chat(op) => chat_request(op, params)?,
        Operation::Session(op) => session_request(op, params)?,
        Operation::History(op) => history_request(op, params)?,
        Operation::Group(op) => group_request(op, params)?,
    };
    debug!("Built {} {} for {:?}", spec.method, spec.path, operation);
    Ok(spec)
}

fn chat_request(op: ChatOperation, params: &NodeParameters) -> Result<RequestSpec> {
    let session_id = params.required_str("sessionId")?;

    let (endpoint, mut body, typing) = match op {
        ChatOperation::SendText => {
            let mut body = chat_body(session_id, params)?;
            body.insert("message".into(), params.required_str("message")?.into());
            ("send-text", body, true)
        }
        ChatOperation::SendImage => {
            let mut body = chat_body(session_id, params)?;
            body.insert("imageUrl".into(), params.required_str("imageUrl")?.into());
            insert_opt_str(&mut body, "caption", params.optional_str("caption")?);
            ("send-image", body, true)
        }
        ChatOperation::SendDocument => {
            let mut body = chat_body(session_id, params)?;
            body.insert("documentUrl".into(), params.required_str("documentUrl")?.into());
            body.insert("filename".into(), params.required_str("filename")?.into());
            insert_opt_str(&mut body, "mimetype", params.optional_str("mimetype")?);
            ("send-document", body, true)
        }
        ChatOperation::SendLocation => {
            let mut body = chat_body(session_id, params)?;
            body.insert("latitude".into(), params.required_number("latitude")?.into());
            body.insert("longitude".into(), params.required_number("longitude")?.into());
            insert_opt_str(&mut body, "name", params.optional_str("locationName")?);
            ("send-location", body, true)
        }
        ChatOperation::SendContact => {
            let mut body = chat_body(session_id, params)?;
            body.insert("contactName".into(), params.required_str("contactName")?.into());
            body.insert("contactPhone".into(), params.required_str("contactPhone")?.into());
            ("send-contact", body, true)
        }
        ChatOperation::SendButton => {
            let mut body = chat_body(session_id, params)?;
            let buttons: Vec<Button> = params.collection("buttons", "buttonValues")?;
            body.insert("text".into(), params.required_str("buttonText")?.into());
            body.insert("buttons".into(), json!(buttons));
            insert_opt_str(&mut body, "footer", params.optional_str("footer")?);
            ("send-button", body, true)
        }
        ChatOperation::SendPresenceUpdate => {
            let mut body = chat_body(session_id, params)?;
            let presence: Presence = params.option("presence")?;
            body.insert("presence".into(), json!(presence));
            ("presence", body, false)
        }
        ChatOperation::CheckNumber => ("check-number", phone_body(session_id, params)?, false),
        ChatOperation::ProfilePicture => {
            ("profile-picture", phone_body(session_id, params)?, false)
        }
        ChatOperation::ContactInfo => ("contact-info", phone_body(session_id, params)?, false),
    };

    if typing {
        insert_positive(&mut body, params, "typingTime")?;
    }

    Ok(RequestSpec::post(format!("{CHATS}/{endpoint}"), body))
}

fn chat_body(session_id: &str, params: &NodeParameters) -> Result<Map<String, Value>> {
    Ok(object(json!({
        "sessionId": session_id,
        "chatId": params.required_str("chatId")?,
    })))
}

fn phone_body(session_id: &str, params: &NodeParameters) -> Result<Map<String, Value>> {
    Ok(object(json!({
        "sessionId": session_id,
        "phone": params.required_str("phone")?,
    })))
}

fn session_request(op: SessionOperation, params: &NodeParameters) -> Result<RequestSpec> {
    let session_path =
        || -> Result<String> { Ok(format!("{SESSIONS}/{}", params.required_str("sessionId")?)) };

    let spec = match op {
        SessionOperation::List => RequestSpec::get(SESSIONS.to_string()),
        SessionOperation::Connect => RequestSpec::post(
            format!("{}/connect", session_path()?),
            session_config_body(params)?,
        ),
        SessionOperation::UpdateConfig => RequestSpec::with_body(
            Method::PATCH,
            format!("{}/config", session_path()?),
            session_config_body(params)?,
        ),
        SessionOperation::Status => RequestSpec::get(format!("{}/status", session_path()?)),
        SessionOperation::QrCode => RequestSpec::get(format!("{}/qr", session_path()?)),
        SessionOperation::QrImage => RequestSpec::get(format!("{}/qr/image", session_path()?)),
        SessionOperation::AddWebhook => {
            let mut body = object(json!({ "url": params.required_str("webhookUrl")? }));
            let events: Vec<SessionWebhookEvent> = params.list("webhookEvents")?;
            if !events.is_empty() {
                body.insert("events".into(), json!(events));
            }
            RequestSpec::post(format!("{}/webhooks", session_path()?), body)
        }
        SessionOperation::RemoveWebhook => RequestSpec::with_body(
            Method::DELETE,
            format!("{}/webhooks", session_path()?),
            object(json!({ "url": params.required_str("webhookUrl")? })),
        ),
        SessionOperation::Delete => {
            RequestSpec::with_body(Method::DELETE, session_path()?, Map::new())
        }
    };
    Ok(spec)
}

/// Body shared by `connect` and `updateConfig`.
fn session_config_body(params: &NodeParameters) -> Result<Map<String, Value>> {
    let mut body = Map::new();
    if let Some(metadata) = parse_metadata(params.optional_str("metadata")?) {
        body.insert("metadata".into(), metadata);
    }
    // Only sent when the collection itself was supplied.
    let supplied = params
        .get("webhooks")
        .and_then(|w| w.get("webhookValues"))
        .is_some_and(|values| !values.is_null());
    if supplied {
        let webhooks: Vec<WebhookRegistration> = params.collection("webhooks", "webhookValues")?;
        body.insert("webhooks".into(), json!(webhooks));
    }
    Ok(body)
}

fn history_request(op: HistoryOperation, params: &NodeParameters) -> Result<RequestSpec> {
    let mut body = object(json!({ "sessionId": params.required_str("sessionId")? }));

    let endpoint = match op {
        HistoryOperation::Overview => {
            insert_positive(&mut body, params, "limit")?;
            insert_positive(&mut body, params, "offset")?;
            let chat_type: ChatType = params.option_or_default("chatType")?;
            if chat_type != ChatType::All {
                body.insert("type".into(), json!(chat_type));
            }
            "chats/overview"
        }
        HistoryOperation::Contacts => {
            insert_positive(&mut body, params, "limit")?;
            insert_positive(&mut body, params, "offset")?;
            insert_opt_str(&mut body, "search", params.optional_str("search")?);
            "contacts"
        }
        HistoryOperation::Messages => {
            body.insert("chatId".into(), params.required_str("chatId")?.into());
            insert_positive(&mut body, params, "limit")?;
            insert_opt_str(&mut body, "cursor", params.optional_str("cursor")?);
            "chats/messages"
        }
        HistoryOperation::Info => {
            body.insert("chatId".into(), params.required_str("chatId")?.into());
            "chats/info"
        }
        HistoryOperation::MarkRead => {
            body.insert("chatId".into(), params.required_str("chatId")?.into());
            insert_opt_str(&mut body, "messageId", params.optional_str("messageId")?);
            "chats/mark-read"
        }
    };

    Ok(RequestSpec::post(format!("/api/whatsapp/{endpoint}"), body))
}

fn group_request(op: GroupOperation, params: &NodeParameters) -> Result<RequestSpec> {
    let mut body = object(json!({ "sessionId": params.required_str("sessionId")? }));

    let endpoint = match op {
        GroupOperation::List => return Ok(RequestSpec::post(GROUPS.to_string(), body)),
        GroupOperation::Create => {
            body.insert("name".into(), params.required_str("groupName")?.into());
            insert_participants(&mut body, params)?;
            "create"
        }
        GroupOperation::Join => {
            body.insert("inviteCode".into(), params.required_str("inviteCode")?.into());
            "join"
        }
        GroupOperation::Metadata => {
            insert_group_id(&mut body, params)?;
            "metadata"
        }
        GroupOperation::AddParticipants => {
            insert_group_id(&mut body, params)?;
            insert_participants(&mut body, params)?;
            "participants/add"
        }
        GroupOperation::RemoveParticipants => {
            insert_group_id(&mut body, params)?;
            insert_participants(&mut body, params)?;
            "participants/remove"
        }
        GroupOperation::PromoteParticipants => {
            insert_group_id(&mut body, params)?;
            insert_participants(&mut body, params)?;
            "participants/promote"
        }
        GroupOperation::DemoteParticipants => {
            insert_group_id(&mut body, params)?;
            insert_participants(&mut body, params)?;
            "participants/demote"
        }
        GroupOperation::UpdateSubject => {
            insert_group_id(&mut body, params)?;
            body.insert("subject".into(), params.required_str("subject")?.into());
            "subject"
        }
        GroupOperation::UpdateDescription => {
            insert_group_id(&mut body, params)?;
            body.insert("description".into(), params.required_str("description")?.into());
            "description"
        }
        GroupOperation::UpdateSettings => {
            insert_group_id(&mut body, params)?;
            let setting: GroupSetting = params.option("setting")?;
            body.insert("setting".into(), json!(setting));
            "settings"
        }
        GroupOperation::UpdatePicture => {
            insert_group_id(&mut body, params)?;
            body.insert("imageUrl".into(), params.required_str("groupImageUrl")?.into());
            "picture"
        }
        GroupOperation::Leave => {
            insert_group_id(&mut body, params)?;
            "leave"
        }
        GroupOperation::GetInviteCode => {
            insert_group_id(&mut body, params)?;
            "invite-code"
        }
        GroupOperation::RevokeInvite => {
            insert_group_id(&mut body, params)?;
            "revoke-invite"
        }
    };

    Ok(RequestSpec::post(format!("{GROUPS}/{endpoint}"), body))
}

fn insert_group_id(body: &mut Map<String, Value>, params: &NodeParameters) -> Result<()> {
    body.insert("groupId".into(), params.required_str("groupId")?.into());
    Ok(())
}

fn insert_participants(body: &mut Map<String, Value>, params: &NodeParameters) -> Result<()> {
    let participants = parse_participants(params.required_str("participants")?);
    body.insert("participants".into(), json!(participants));
    Ok(())
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn insert_opt_str(body: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        body.insert(key.to_string(), value.into());
    }
}

fn insert_positive(
    body: &mut Map<String, Value>,
    params: &NodeParameters,
    name: &str,
) -> Result<()> {
    if let Some(n) = params.positive_number(name)? {
        body.insert(name.to_string(), n.into());
    }
    Ok(())
}
