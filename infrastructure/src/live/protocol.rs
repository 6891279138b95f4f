//! Wire format of the live channel.
//!
//! Every frame is a JSON text message `{"event": "<name>", "data": <payload>}`.
//! Payload shapes vary between server versions, so decoding accepts both
//! bare records and records wrapped under a key (`{"argument": {...}}`), and
//! flattens `user` objects into `userId` / `username`.

use debate_application::{EventName, InboundEvent, OutboundCommand};
use debate_domain::{Argument, ChatMessage, DebateId, DebateSession, ParticipantRecord, Results, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// A single frame on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// A frame that could not be turned into an event
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed '{event}' payload: {reason}")]
    Payload { event: &'static str, reason: String },
}

impl ProtocolError {
    fn payload(event: EventName, reason: impl Into<String>) -> Self {
        ProtocolError::Payload {
            event: event.as_str(),
            reason: reason.into(),
        }
    }
}

/// Serialize an outbound command.
///
/// Room-scoped commands carry the bare debate id; commands with content
/// carry `{debateId, ...}`.
pub fn encode(command: &OutboundCommand) -> String {
    let data = match command {
        OutboundCommand::JoinDebate(id)
        | OutboundCommand::LeaveDebate(id)
        | OutboundCommand::Typing(id)
        | OutboundCommand::StopTyping(id) => json!(id.as_str()),
        OutboundCommand::NewArgument { debate_id, content } => {
            json!({ "debateId": debate_id.as_str(), "content": content })
        }
        OutboundCommand::ChatMessage { debate_id, message } => {
            json!({ "debateId": debate_id.as_str(), "message": message })
        }
    };
    json!({ "event": command.event_name(), "data": data }).to_string()
}

/// Decode a text frame.
///
/// Returns `Ok(None)` for events this client does not know, and for the
/// `connect` / `disconnect` names, which are never accepted from the server.
pub fn decode(text: &str) -> Result<Option<InboundEvent>, ProtocolError> {
    let frame: Frame = serde_json::from_str(text)?;
    let Some(name) = EventName::from_wire(&frame.event) else {
        return Ok(None);
    };
    decode_event(name, frame.data)
}

fn decode_event(name: EventName, data: Value) -> Result<Option<InboundEvent>, ProtocolError> {
    let event = match name {
        EventName::Connect | EventName::Disconnect => return Ok(None),
        EventName::DebateState => decode_debate_state(data)?,
        EventName::UserJoined => {
            let debate_id = debate_id_of(&data);
            let record = unwrap_key(data, &["user", "participant"]);
            let participant: ParticipantRecord = from_value(name, flatten_user(record))?;
            InboundEvent::UserJoined {
                debate_id,
                participant,
            }
        }
        EventName::UserLeft | EventName::UserTyping | EventName::UserStoppedTyping => {
            let debate_id = debate_id_of(&data);
            let user_id = user_id_of(&data)
                .ok_or_else(|| ProtocolError::payload(name, "missing user id"))?;
            match name {
                EventName::UserLeft => InboundEvent::UserLeft { debate_id, user_id },
                EventName::UserTyping => InboundEvent::UserTyping { debate_id, user_id },
                _ => InboundEvent::UserStoppedTyping { debate_id, user_id },
            }
        }
        EventName::ArgumentAdded => InboundEvent::ArgumentAdded(decode_argument(name, data)?),
        EventName::ArgumentProcessing => {
            InboundEvent::ArgumentProcessing(decode_argument(name, data)?)
        }
        EventName::NewChatMessage => {
            let debate_id = debate_id_of(&data);
            let record = match data.get("message") {
                Some(inner) if inner.is_object() => inner.clone(),
                _ => unwrap_key(data, &["chat"]),
            };
            let mut message: ChatMessage = from_value(name, flatten_user(record))?;
            if message.debate_id.as_str().is_empty()
                && let Some(debate_id) = debate_id
            {
                message.debate_id = debate_id;
            }
            InboundEvent::NewChatMessage(message)
        }
        EventName::DebateFinalized => {
            let debate_id = room_id_of(&data)
                .ok_or_else(|| ProtocolError::payload(name, "missing debate id"))?;
            InboundEvent::DebateFinalized {
                debate_id,
                results: results_of(&data),
            }
        }
        EventName::DebateStatusUpdated => {
            let debate_id = room_id_of(&data)
                .ok_or_else(|| ProtocolError::payload(name, "missing debate id"))?;
            InboundEvent::DebateStatusUpdated {
                debate_id,
                finalized: finalized_flag(&data),
                results: results_of(&data),
            }
        }
    };
    Ok(Some(event))
}

fn decode_debate_state(data: Value) -> Result<InboundEvent, ProtocolError> {
    let name = EventName::DebateState;
    let Value::Object(mut map) = data else {
        return Err(ProtocolError::payload(name, "expected an object"));
    };
    let arguments = match map.remove("arguments") {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| decode_argument(name, item))
            .collect::<Result<Vec<_>, _>>()?,
        Some(Value::Null) | None => Vec::new(),
        Some(_) => return Err(ProtocolError::payload(name, "arguments is not a list")),
    };
    let session_value = ["debate", "session"]
        .iter()
        .find_map(|key| map.remove(*key).filter(Value::is_object))
        .unwrap_or(Value::Object(map));
    let session: DebateSession = from_value(name, session_value)?;
    Ok(InboundEvent::DebateState { session, arguments })
}

fn decode_argument(name: EventName, data: Value) -> Result<Argument, ProtocolError> {
    let debate_id = debate_id_of(&data);
    let record = unwrap_key(data, &["argument"]);
    let mut argument: Argument = from_value(name, flatten_user(record))?;
    if argument.session_id.as_str().is_empty()
        && let Some(debate_id) = debate_id
    {
        argument.session_id = debate_id;
    }
    Ok(argument)
}

fn from_value<T: serde::de::DeserializeOwned>(
    name: EventName,
    value: Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|e| ProtocolError::payload(name, e.to_string()))
}

/// `{"<key>": {...}}` → the inner object; anything else unchanged.
fn unwrap_key(data: Value, keys: &[&str]) -> Value {
    for key in keys {
        if let Some(inner) = data.get(*key)
            && inner.is_object()
        {
            return inner.clone();
        }
    }
    data
}

/// Replace a populated `user` object with `userId` and `username`.
fn flatten_user(value: Value) -> Value {
    let Value::Object(mut map) = value else {
        return value;
    };
    if let Some(Value::Object(user)) = map.remove("user") {
        if let Some(id) = id_field(&user) {
            map.entry("userId").or_insert(Value::String(id));
        }
        if let Some(name) = user
            .get("username")
            .or_else(|| user.get("email"))
            .and_then(Value::as_str)
        {
            map.entry("username").or_insert(json!(name));
        }
    } else if let Some(id) = map.get("user").cloned() {
        map.remove("user");
        map.entry("userId").or_insert(id);
    }
    Value::Object(map)
}

fn id_field(map: &Map<String, Value>) -> Option<String> {
    ["_id", "id"]
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Debate id named by the payload (`debateId` or `debate`).
fn debate_id_of(data: &Value) -> Option<DebateId> {
    if !data.is_object() {
        return None;
    }
    lookup_debate_id(data, &["debateId", "debate"])
}

/// Like [`debate_id_of`], but a room-level payload may also be the bare id
/// or the session record itself.
fn room_id_of(data: &Value) -> Option<DebateId> {
    lookup_debate_id(data, &["debateId", "debate", "_id", "id"])
}

fn lookup_debate_id(data: &Value, keys: &[&str]) -> Option<DebateId> {
    match data {
        Value::String(id) if !id.is_empty() => Some(DebateId::new(id.clone())),
        Value::Object(map) => keys
            .iter()
            .find_map(|key| match map.get(*key) {
                Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
                Some(Value::Object(inner)) => id_field(inner),
                _ => None,
            })
            .map(DebateId::new),
        _ => None,
    }
}

fn user_id_of(data: &Value) -> Option<UserId> {
    match data {
        Value::String(id) if !id.is_empty() => Some(UserId::new(id.clone())),
        Value::Object(map) => ["userId", "user"]
            .iter()
            .find_map(|key| match map.get(*key) {
                Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
                Some(Value::Object(inner)) => id_field(inner),
                _ => None,
            })
            .map(UserId::new),
        _ => None,
    }
}

fn results_of(data: &Value) -> Option<Results> {
    let candidate = match data.get("results") {
        Some(inner) if inner.is_object() => inner,
        _ if data.get("winner").is_some() || data.get("totals").is_some() => data,
        _ => return None,
    };
    serde_json::from_value(candidate.clone()).ok()
}

fn finalized_flag(data: &Value) -> bool {
    if let Some(flag) = ["isFinalized", "finalized"]
        .iter()
        .find_map(|key| data.get(*key).and_then(Value::as_bool))
    {
        return flag;
    }
    data.get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| s.eq_ignore_ascii_case("finalized"))
}
