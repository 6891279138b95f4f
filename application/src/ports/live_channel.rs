//! Live channel port
//!
//! Defines the interface for the persistent bidirectional connection to the
//! debate server, plus the event vocabulary that flows over it.
//!
//! Inbound events are delivered to handlers registered per [`EventName`].
//! Handlers for one event run in registration order, and one handler runs
//! to completion before the next event is dispatched.

use async_trait::async_trait;
use debate_domain::{
    Argument, ChatMessage, DebateId, DebateSession, ParticipantRecord, Results, RoomEvent, UserId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors that can occur on the live channel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Authentication rejected: {0}")]
    Unauthorized(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed")]
    Closed,

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl ChannelError {
    /// Auth failures are never retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ChannelError::Unauthorized(_))
    }
}

/// Names of inbound events, including the `connect` / `disconnect`
/// lifecycle pseudo-events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    Connect,
    Disconnect,
    DebateState,
    UserJoined,
    UserLeft,
    ArgumentAdded,
    ArgumentProcessing,
    UserTyping,
    UserStoppedTyping,
    NewChatMessage,
    DebateFinalized,
    DebateStatusUpdated,
}

impl EventName {
    pub const ALL: [EventName; 12] = [
        EventName::Connect,
        EventName::Disconnect,
        EventName::DebateState,
        EventName::UserJoined,
        EventName::UserLeft,
        EventName::ArgumentAdded,
        EventName::ArgumentProcessing,
        EventName::UserTyping,
        EventName::UserStoppedTyping,
        EventName::NewChatMessage,
        EventName::DebateFinalized,
        EventName::DebateStatusUpdated,
    ];

    /// Name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::Connect => "connect",
            EventName::Disconnect => "disconnect",
            EventName::DebateState => "debate-state",
            EventName::UserJoined => "user-joined",
            EventName::UserLeft => "user-left",
            EventName::ArgumentAdded => "argument-added",
            EventName::ArgumentProcessing => "argument-processing",
            EventName::UserTyping => "user-typing",
            EventName::UserStoppedTyping => "user-stopped-typing",
            EventName::NewChatMessage => "new-chat-message",
            EventName::DebateFinalized => "debate-finalized",
            EventName::DebateStatusUpdated => "debate-status-updated",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == name)
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Connected,
    Disconnected {
        reason: String,
    },
    DebateState {
        session: DebateSession,
        arguments: Vec<Argument>,
    },
    UserJoined {
        debate_id: Option<DebateId>,
        participant: ParticipantRecord,
    },
    UserLeft {
        debate_id: Option<DebateId>,
        user_id: UserId,
    },
    ArgumentAdded(Argument),
    ArgumentProcessing(Argument),
    UserTyping {
        debate_id: Option<DebateId>,
        user_id: UserId,
    },
    UserStoppedTyping {
        debate_id: Option<DebateId>,
        user_id: UserId,
    },
    NewChatMessage(ChatMessage),
    DebateFinalized {
        debate_id: DebateId,
        results: Option<Results>,
    },
    DebateStatusUpdated {
        debate_id: DebateId,
        finalized: bool,
        results: Option<Results>,
    },
}

impl InboundEvent {
    pub fn name(&self) -> EventName {
        match self {
            InboundEvent::Connected => EventName::Connect,
            InboundEvent::Disconnected { .. } => EventName::Disconnect,
            InboundEvent::DebateState { .. } => EventName::DebateState,
            InboundEvent::UserJoined { .. } => EventName::UserJoined,
            InboundEvent::UserLeft { .. } => EventName::UserLeft,
            InboundEvent::ArgumentAdded(_) => EventName::ArgumentAdded,
            InboundEvent::ArgumentProcessing(_) => EventName::ArgumentProcessing,
            InboundEvent::UserTyping { .. } => EventName::UserTyping,
            InboundEvent::UserStoppedTyping { .. } => EventName::UserStoppedTyping,
            InboundEvent::NewChatMessage(_) => EventName::NewChatMessage,
            InboundEvent::DebateFinalized { .. } => EventName::DebateFinalized,
            InboundEvent::DebateStatusUpdated { .. } => EventName::DebateStatusUpdated,
        }
    }
}

impl From<InboundEvent> for RoomEvent {
    fn from(event: InboundEvent) -> Self {
        match event {
            InboundEvent::Connected => RoomEvent::Reconnected,
            InboundEvent::Disconnected { reason } => RoomEvent::ConnectionLost { reason },
            InboundEvent::DebateState { session, arguments } => {
                RoomEvent::SnapshotLoaded { session, arguments }
            }
            InboundEvent::UserJoined {
                debate_id,
                participant,
            } => RoomEvent::UserJoined {
                debate_id,
                participant,
            },
            InboundEvent::UserLeft { debate_id, user_id } => {
                RoomEvent::UserLeft { debate_id, user_id }
            }
            InboundEvent::ArgumentAdded(argument) => RoomEvent::ArgumentAdded { argument },
            InboundEvent::ArgumentProcessing(argument) => {
                RoomEvent::ArgumentProcessing { argument }
            }
            InboundEvent::UserTyping { debate_id, user_id } => {
                RoomEvent::UserTyping { debate_id, user_id }
            }
            InboundEvent::UserStoppedTyping { debate_id, user_id } => {
                RoomEvent::UserStoppedTyping { debate_id, user_id }
            }
            InboundEvent::NewChatMessage(message) => RoomEvent::ChatReceived { message },
            InboundEvent::DebateFinalized { debate_id, results } => {
                RoomEvent::DebateFinalized { debate_id, results }
            }
            InboundEvent::DebateStatusUpdated {
                debate_id,
                finalized,
                results,
            } => RoomEvent::StatusUpdated {
                debate_id,
                finalized,
                results,
            },
        }
    }
}

/// A command sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCommand {
    JoinDebate(DebateId),
    LeaveDebate(DebateId),
    NewArgument { debate_id: DebateId, content: String },
    Typing(DebateId),
    StopTyping(DebateId),
    ChatMessage { debate_id: DebateId, message: String },
}

impl OutboundCommand {
    /// Name used on the wire.
    pub fn event_name(&self) -> &'static str {
        match self {
            OutboundCommand::JoinDebate(_) => "join-debate",
            OutboundCommand::LeaveDebate(_) => "leave-debate",
            OutboundCommand::NewArgument { .. } => "new-argument",
            OutboundCommand::Typing(_) => "typing",
            OutboundCommand::StopTyping(_) => "stop-typing",
            OutboundCommand::ChatMessage { .. } => "chat-message",
        }
    }
}

/// Callback invoked for an inbound event.
pub type EventHandler = Arc<dyn Fn(&InboundEvent) + Send + Sync>;

/// Identifies a registered handler so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Handlers organized by event name.
///
/// Adapters embed one of these to implement [`LiveChannel::on`] and
/// [`LiveChannel::off`].
#[derive(Default)]
pub struct HandlerRegistry {
    next_id: AtomicU64,
    /// event → handlers in registration order
    handlers: Mutex<HashMap<EventName, Vec<(HandlerId, EventHandler)>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, event: EventName, handler: EventHandler) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().entry(event).or_default().push((id, handler));
        id
    }

    /// Remove one handler, or every handler for the event when `handler` is
    /// `None`. Returns how many were removed.
    pub fn remove(&self, event: EventName, handler: Option<HandlerId>) -> usize {
        let mut handlers = self.lock();
        let Some(list) = handlers.get_mut(&event) else {
            return 0;
        };
        let before = list.len();
        match handler {
            Some(id) => list.retain(|(h, _)| *h != id),
            None => list.clear(),
        }
        before - list.len()
    }

    pub fn handler_count(&self, event: EventName) -> usize {
        self.lock().get(&event).map_or(0, Vec::len)
    }

    /// Call every handler for the event in registration order. Returns how
    /// many ran.
    pub fn dispatch(&self, event: &InboundEvent) -> usize {
        // Snapshot under the lock so handlers may register or remove handlers.
        let handlers: Vec<EventHandler> = self
            .lock()
            .get(&event.name())
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<EventName, Vec<(HandlerId, EventHandler)>>> {
        // Handlers never run while this lock is held.
        self.handlers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The persistent connection to the debate server
///
/// One instance per process, constructed explicitly and injected into the
/// session controller.
#[async_trait]
pub trait LiveChannel: Send + Sync {
    /// Establish the connection. Calling this while connected is a no-op.
    async fn connect(&self, token: &str) -> Result<(), ChannelError>;

    /// Tear down the connection and forget the token. Never reconnects.
    async fn disconnect(&self);

    fn is_connected(&self) -> bool;

    /// Send a command. Silently dropped while disconnected.
    fn emit(&self, command: OutboundCommand);

    fn on(&self, event: EventName, handler: EventHandler) -> HandlerId;

    /// Remove one handler, or all handlers for the event.
    fn off(&self, event: EventName, handler: Option<HandlerId>);

    fn join_debate(&self, debate_id: &DebateId) {
        self.emit(OutboundCommand::JoinDebate(debate_id.clone()));
    }

    fn leave_debate(&self, debate_id: &DebateId) {
        self.emit(OutboundCommand::LeaveDebate(debate_id.clone()));
    }

    fn send_argument(&self, debate_id: &DebateId, content: &str) {
        self.emit(OutboundCommand::NewArgument {
            debate_id: debate_id.clone(),
            content: content.to_string(),
        });
    }

    fn send_typing(&self, debate_id: &DebateId) {
        self.emit(OutboundCommand::Typing(debate_id.clone()));
    }

    fn stop_typing(&self, debate_id: &DebateId) {
        self.emit(OutboundCommand::StopTyping(debate_id.clone()));
    }

    fn send_chat_message(&self, debate_id: &DebateId, message: &str) {
        self.emit(OutboundCommand::ChatMessage {
            debate_id: debate_id.clone(),
            message: message.to_string(),
        });
    }
}
