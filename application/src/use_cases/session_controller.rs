//! Session Controller
//!
//! Facade over the live channel, the debate API and the room state machine.
//! Exposes join/submit/finalize commands and a read-only view of the room.
//!
//! A single pump task owns the [`RoomState`]. Inbound channel events, intents
//! from callers and completions of spawned API calls all arrive through one
//! queue and are applied one at a time, so the state machine needs no locks.
//! Every new state is published on a `watch` channel.

use crate::config::{SessionConfig, SubmissionTransport};
use crate::ports::debate_api::{ApiError, DebateApi};
use crate::ports::live_channel::{ChannelError, EventName, HandlerId, InboundEvent, LiveChannel};
use crate::ports::session_logger::{NoSessionLogger, SessionLogger, TranscriptEntry};
use debate_domain::{
    ConnectionState, DebateId, Effect, RoomEvent, RoomState, Transition, ValidationError,
    transition,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors surfaced by the session controller
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Connection error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Session controller stopped")]
    Stopped,
}

impl SessionError {
    /// Whether the error was raised locally, before any network call.
    pub fn is_local(&self) -> bool {
        matches!(self, SessionError::Validation(_))
    }
}

enum Envelope {
    /// Something that happened: server events, transport changes, API completions.
    Observed(RoomEvent),
    /// A caller intent awaiting its validation result.
    Intent {
        event: RoomEvent,
        reply: oneshot::Sender<Result<(), ValidationError>>,
    },
}

/// Drives one debate room at a time.
pub struct SessionController<C: LiveChannel + 'static, A: DebateApi + 'static> {
    channel: Arc<C>,
    api: Arc<A>,
    sender: mpsc::UnboundedSender<Envelope>,
    state: watch::Receiver<RoomState>,
    handlers: Vec<(EventName, HandlerId)>,
    cancel: CancellationToken,
    pump: Option<JoinHandle<()>>,
}

impl<C: LiveChannel + 'static, A: DebateApi + 'static> SessionController<C, A> {
    /// Start a controller. Must be called within a tokio runtime.
    pub fn new(channel: Arc<C>, api: Arc<A>, config: SessionConfig) -> Self {
        Self::with_logger(channel, api, config, Arc::new(NoSessionLogger))
    }

    pub fn with_logger(
        channel: Arc<C>,
        api: Arc<A>,
        config: SessionConfig,
        logger: Arc<dyn SessionLogger>,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut initial = RoomState::new(config.tie_break);
        if channel.is_connected() {
            initial.connection = ConnectionState::Connected;
        }
        let (publisher, state) = watch::channel(initial.clone());

        let handlers = EventName::ALL
            .into_iter()
            .map(|name| {
                let tx = sender.clone();
                let id = channel.on(
                    name,
                    Arc::new(move |event: &InboundEvent| {
                        let _ = tx.send(Envelope::Observed(event.clone().into()));
                    }),
                );
                (name, id)
            })
            .collect();

        let cancel = CancellationToken::new();
        let pump = Pump {
            state: initial,
            channel: Arc::clone(&channel),
            api: Arc::clone(&api),
            config,
            logger,
            sender: sender.clone(),
            publisher,
        };
        let handle = tokio::spawn(pump.run(receiver, cancel.clone()));

        Self {
            channel,
            api,
            sender,
            state,
            handlers,
            cancel,
            pump: Some(handle),
        }
    }

    // ==================== Connection ====================

    /// Connect the live channel. A no-op when already connected.
    pub async fn connect(&self, token: &str) -> Result<(), SessionError> {
        self.channel.connect(token).await?;
        Ok(())
    }

    pub async fn disconnect(&self) {
        self.channel.disconnect().await;
    }

    // ==================== Commands ====================

    /// Make a debate the session of interest, leaving any previous one.
    pub async fn join(&self, debate_id: impl Into<DebateId>) -> Result<(), SessionError> {
        self.request(RoomEvent::JoinRequested {
            debate_id: debate_id.into(),
        })
        .await
    }

    pub async fn leave(&self) -> Result<(), SessionError> {
        self.request(RoomEvent::LeaveRequested).await
    }

    /// Submit an argument. Returns once the submission has been handed to the
    /// transport; the argument appears in the state when the server echoes it.
    pub async fn submit(&self, content: impl Into<String>) -> Result<(), SessionError> {
        self.request(RoomEvent::SubmitRequested {
            content: content.into(),
        })
        .await
    }

    /// Request finalization. Guard failures are reported without any network call.
    pub async fn finalize(&self) -> Result<(), SessionError> {
        self.request(RoomEvent::FinalizeRequested).await
    }

    pub async fn set_typing(&self, typing: bool) -> Result<(), SessionError> {
        self.request(RoomEvent::TypingChanged { typing }).await
    }

    pub async fn send_chat(&self, message: impl Into<String>) -> Result<(), SessionError> {
        self.request(RoomEvent::ChatRequested {
            message: message.into(),
        })
        .await
    }

    /// Re-fetch the snapshot to recover anything the live channel missed.
    pub async fn refresh(&self) -> Result<(), SessionError> {
        self.request(RoomEvent::RefreshRequested).await
    }

    pub async fn fetch_results(&self) -> Result<(), SessionError> {
        self.request(RoomEvent::ResultsRequested).await
    }

    // ==================== State ====================

    /// Current state of the room.
    pub fn state(&self) -> RoomState {
        self.state.borrow().clone()
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<RoomState> {
        self.state.clone()
    }

    pub fn channel(&self) -> &Arc<C> {
        &self.channel
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Unregister from the channel and stop the pump.
    pub async fn shutdown(mut self) {
        self.detach();
        if let Some(pump) = self.pump.take() {
            let _ = pump.await;
        }
    }

    async fn request(&self, event: RoomEvent) -> Result<(), SessionError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Envelope::Intent { event, reply })
            .map_err(|_| SessionError::Stopped)?;
        response.await.map_err(|_| SessionError::Stopped)??;
        Ok(())
    }

    fn detach(&mut self) {
        for (name, id) in self.handlers.drain(..) {
            self.channel.off(name, Some(id));
        }
        self.cancel.cancel();
    }
}

impl<C: LiveChannel + 'static, A: DebateApi + 'static> Drop for SessionController<C, A> {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Exclusive owner of the room state.
struct Pump<C: LiveChannel + 'static, A: DebateApi + 'static> {
    state: RoomState,
    channel: Arc<C>,
    api: Arc<A>,
    config: SessionConfig,
    logger: Arc<dyn SessionLogger>,
    sender: mpsc::UnboundedSender<Envelope>,
    publisher: watch::Sender<RoomState>,
}

impl<C: LiveChannel + 'static, A: DebateApi + 'static> Pump<C, A> {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Envelope>, cancel: CancellationToken) {
        loop {
            let envelope = tokio::select! {
                _ = cancel.cancelled() => break,
                envelope = receiver.recv() => match envelope {
                    Some(envelope) => envelope,
                    None => break,
                },
            };

            match envelope {
                Envelope::Observed(event) => {
                    let _ = self.step(event);
                }
                Envelope::Intent { event, reply } => {
                    let result = self.step(event);
                    let _ = reply.send(result);
                }
            }
        }
        debug!("Session pump stopped");
    }

    fn step(&mut self, event: RoomEvent) -> Result<(), ValidationError> {
        let name = event.name();
        match transition(&self.state, event) {
            Ok(Transition { state, effects }) => {
                self.report(name, &state);
                self.state = state;
                let snapshot = &self.state;
                self.publisher.send_if_modified(|current| {
                    if current == snapshot {
                        false
                    } else {
                        *current = snapshot.clone();
                        true
                    }
                });
                for effect in effects {
                    self.perform(effect);
                }
                Ok(())
            }
            Err(error) => {
                debug!(event = name, error = %error, "Intent rejected locally");
                self.logger.log(TranscriptEntry::Rejected {
                    event: name,
                    debate_id: self.state.debate_id.clone(),
                    phase: self.state.phase,
                    error: error.to_string(),
                });
                Err(error)
            }
        }
    }

    /// Log what changed between the current state and `next`.
    fn report(&self, event: &'static str, next: &RoomState) {
        debug!(event, phase = %next.phase, "Room event applied");
        self.logger.log(TranscriptEntry::Applied {
            event,
            debate_id: next.debate_id.clone(),
            phase: next.phase,
            arguments: next.argument_count(),
        });

        if next.phase != self.state.phase {
            info!("Room phase {} -> {}", self.state.phase, next.phase);
        }
        if next.connection != self.state.connection {
            match next.connection {
                ConnectionState::Connected => info!("Live channel connected"),
                ConnectionState::Disconnected => warn!("Live channel disconnected"),
            }
        }
        if next.last_failure != self.state.last_failure
            && let Some(failure) = &next.last_failure
        {
            warn!("{}", failure);
        }
        if next.results != self.state.results
            && let Some(results) = &next.results
        {
            self.logger
                .log(TranscriptEntry::results(next.debate_id.clone(), results));
            if results.unassigned_arguments > 0 {
                warn!(
                    "{} argument(s) left out of results: author holds no side",
                    results.unassigned_arguments
                );
            }
        }
    }

    fn perform(&self, effect: Effect) {
        debug!(effect = effect.name(), debate_id = %effect.debate_id(), "Performing effect");
        self.logger.log(TranscriptEntry::Effect {
            effect: effect.name(),
            debate_id: effect.debate_id().clone(),
        });

        match effect {
            Effect::FetchSnapshot { debate_id } => {
                let api = Arc::clone(&self.api);
                self.spawn_observed(async move {
                    let (status, arguments) =
                        tokio::join!(api.status(&debate_id), api.arguments(&debate_id));
                    match (status, arguments) {
                        (Ok(mut session), Ok(arguments)) => {
                            session.id = debate_id;
                            Some(RoomEvent::SnapshotLoaded { session, arguments })
                        }
                        (Err(error), _) | (_, Err(error)) => Some(RoomEvent::SnapshotFailed {
                            debate_id,
                            message: error.message(),
                        }),
                    }
                });
            }
            Effect::JoinLive { debate_id } => {
                self.note_if_offline("join-debate");
                self.channel.join_debate(&debate_id);
            }
            Effect::LeaveLive { debate_id } => self.channel.leave_debate(&debate_id),
            Effect::SubmitArgument { debate_id, content } => match self.config.submission {
                SubmissionTransport::Live => {
                    self.note_if_offline("new-argument");
                    self.channel.send_argument(&debate_id, &content);
                }
                SubmissionTransport::Http => {
                    let api = Arc::clone(&self.api);
                    self.spawn_observed(async move {
                        match api.post_argument(&debate_id, &content).await {
                            Ok(Some(argument)) => Some(RoomEvent::ArgumentAdded { argument }),
                            Ok(None) => None,
                            Err(error) => Some(RoomEvent::SubmitFailed {
                                debate_id,
                                message: error.message(),
                            }),
                        }
                    });
                }
            },
            Effect::SendTyping { debate_id, typing } => {
                if typing {
                    self.channel.send_typing(&debate_id);
                } else {
                    self.channel.stop_typing(&debate_id);
                }
            }
            Effect::SendChat { debate_id, message } => {
                self.note_if_offline("chat-message");
                self.channel.send_chat_message(&debate_id, &message);
            }
            Effect::PostFinalize { debate_id } => {
                let api = Arc::clone(&self.api);
                self.spawn_observed(async move {
                    Some(match api.finalize(&debate_id).await {
                        Ok(results) => RoomEvent::DebateFinalized { debate_id, results },
                        Err(error) => RoomEvent::FinalizeFailed {
                            debate_id,
                            message: error.message(),
                        },
                    })
                });
            }
            Effect::FetchResults { debate_id } => {
                let api = Arc::clone(&self.api);
                self.spawn_observed(async move {
                    Some(match api.results(&debate_id).await {
                        Ok(results) => RoomEvent::ResultsLoaded { debate_id, results },
                        Err(error) => RoomEvent::ResultsFailed {
                            debate_id,
                            message: error.message(),
                        },
                    })
                });
            }
        }
    }

    /// Run a call in the background and feed its outcome back into the queue.
    fn spawn_observed<F>(&self, call: F)
    where
        F: std::future::Future<Output = Option<RoomEvent>> + Send + 'static,
    {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            if let Some(event) = call.await {
                let _ = sender.send(Envelope::Observed(event));
            }
        });
    }

    fn note_if_offline(&self, command: &str) {
        if !self.channel.is_connected() {
            debug!(command, "Live channel disconnected; command dropped");
        }
    }
}
