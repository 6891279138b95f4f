//! WebSocket-backed [`LiveChannel`].
//!
//! One [`SessionConnection`] per process. While connected, a supervisor task
//! owns the read half and dispatches decoded frames through the
//! [`HandlerRegistry`], one at a time. A writer task per socket owns the
//! write half and drains the outbound queue.
//!
//! An unexpected drop dispatches `disconnect`, then reconnects with the
//! [`ReconnectPolicy`] backoff and dispatches `connect` again. A manual
//! [`disconnect`](LiveChannel::disconnect) or a refused token ends the
//! supervisor for good.

use super::error::ConnectionError;
use super::protocol;
use async_trait::async_trait;
use debate_application::{
    ChannelError, EventHandler, EventName, HandlerId, HandlerRegistry, InboundEvent, LiveChannel,
    OutboundCommand, ReconnectPolicy,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, header::AUTHORIZATION};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Reason reported when the client closes the connection itself.
const CLIENT_DISCONNECT: &str = "disconnected by client";

/// State shared between the handle and its background tasks.
struct Shared {
    handlers: HandlerRegistry,
    /// Queue of the live socket; `None` while disconnected.
    outbound: std::sync::Mutex<Option<mpsc::UnboundedSender<OutboundCommand>>>,
}

impl Shared {
    fn set_outbound(&self, sender: Option<mpsc::UnboundedSender<OutboundCommand>>) {
        *self.outbound.lock().unwrap_or_else(|e| e.into_inner()) = sender;
    }

    fn outbound(&self) -> Option<mpsc::UnboundedSender<OutboundCommand>> {
        self.outbound
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// A running supervisor task.
struct Supervisor {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// A socket in service: its read half plus the writer task owning the
/// write half.
struct Attached {
    stream: SplitStream<Socket>,
    writer: JoinHandle<()>,
    writer_cancel: CancellationToken,
}

/// How one socket's lifetime ended.
enum SocketEnd {
    /// Manual disconnect.
    Cancelled,
    /// The server or the network dropped the socket.
    Dropped(String),
}

/// Live connection to the debate server
pub struct SessionConnection {
    url: String,
    policy: ReconnectPolicy,
    shared: Arc<Shared>,
    supervisor: Mutex<Option<Supervisor>>,
}

impl SessionConnection {
    pub fn new(url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        Self {
            url: url.into(),
            policy,
            shared: Arc::new(Shared {
                handlers: HandlerRegistry::new(),
                outbound: std::sync::Mutex::new(None),
            }),
            supervisor: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Perform the upgrade handshake with the bearer token.
    async fn open(url: &str, token: &str) -> Result<Socket, ConnectionError> {
        let mut request =
            url.into_client_request()
                .map_err(|e| ConnectionError::InvalidUrl {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| ConnectionError::InvalidToken(e.to_string()))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);

        let (socket, response) = connect_async(request)
            .await
            .map_err(|e| ConnectionError::from_handshake(url, e))?;
        debug!(url, status = response.status().as_u16(), "Live channel handshake complete");
        Ok(socket)
    }

    /// Owns the connection until cancelled, the token is refused, or the
    /// reconnect attempts run out.
    async fn supervise(
        url: String,
        token: String,
        policy: ReconnectPolicy,
        shared: Arc<Shared>,
        cancel: CancellationToken,
        first: Attached,
    ) {
        let mut attached = first;
        loop {
            let reason = match Self::run_attached(attached, &shared, &cancel).await {
                SocketEnd::Cancelled => return,
                SocketEnd::Dropped(reason) => reason,
            };
            warn!(reason = %reason, "Live channel dropped");
            shared.handlers.dispatch(&InboundEvent::Disconnected {
                reason: reason.clone(),
            });

            match Self::reconnect(&url, &token, &policy, &cancel).await {
                Some(socket) => attached = Self::attach(socket, &shared, &cancel),
                None => return,
            }
        }
    }

    /// Retry the handshake with backoff. `None` means give up.
    async fn reconnect(
        url: &str,
        token: &str,
        policy: &ReconnectPolicy,
        cancel: &CancellationToken,
    ) -> Option<Socket> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let Some(delay) = policy.delay_for(attempt) else {
                if policy.is_enabled() {
                    warn!(attempts = attempt - 1, "Giving up on the live channel");
                }
                return None;
            };
            debug!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");

            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = tokio::time::sleep(delay) => {}
            }

            match Self::open(url, token).await {
                Ok(socket) => {
                    info!(attempt, "Live channel reconnected");
                    return Some(socket);
                }
                Err(e) => {
                    let error = ChannelError::from(e);
                    if !error.is_retryable() {
                        warn!(error = %error, "Giving up on the live channel");
                        return None;
                    }
                    warn!(attempt, error = %error, "Reconnect attempt failed");
                }
            }
        }
    }

    /// Put a fresh socket into service: spawn its writer, open the
    /// outbound queue and announce `connect`.
    fn attach(socket: Socket, shared: &Shared, cancel: &CancellationToken) -> Attached {
        let (sink, stream) = socket.split();
        let (sender, receiver) = mpsc::unbounded_channel();
        let writer_cancel = cancel.child_token();
        let writer = tokio::spawn(Self::write_loop(sink, receiver, writer_cancel.clone()));

        shared.set_outbound(Some(sender));
        shared.handlers.dispatch(&InboundEvent::Connected);
        Attached {
            stream,
            writer,
            writer_cancel,
        }
    }

    /// Read until the socket ends, then retire its writer.
    async fn run_attached(
        attached: Attached,
        shared: &Shared,
        cancel: &CancellationToken,
    ) -> SocketEnd {
        let end = Self::read_loop(attached.stream, shared, cancel).await;

        shared.set_outbound(None);
        attached.writer_cancel.cancel();
        let _ = attached.writer.await;
        end
    }

    async fn read_loop(
        mut stream: SplitStream<Socket>,
        shared: &Shared,
        cancel: &CancellationToken,
    ) -> SocketEnd {
        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => return SocketEnd::Cancelled,
                message = stream.next() => message,
            };
            match message {
                Some(Ok(Message::Text(text))) => Self::handle_text(text.as_str(), shared),
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| format!("closed by server ({}): {}", u16::from(f.code), f.reason.as_str()))
                        .unwrap_or_else(|| "closed by server".to_string());
                    return SocketEnd::Dropped(reason);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return SocketEnd::Dropped(e.to_string()),
                None => return SocketEnd::Dropped("stream ended".to_string()),
            }
        }
    }

    /// Decode and dispatch one frame. Malformed frames are skipped.
    fn handle_text(text: &str, shared: &Shared) {
        match protocol::decode(text) {
            Ok(Some(event)) => {
                debug!(event = %event.name(), "Inbound frame");
                shared.handlers.dispatch(&event);
            }
            Ok(None) => debug!(bytes = text.len(), "Ignoring unhandled frame"),
            Err(e) => warn!(error = %e, "Skipping malformed frame"),
        }
    }

    async fn write_loop(
        mut sink: SplitSink<Socket, Message>,
        mut receiver: mpsc::UnboundedReceiver<OutboundCommand>,
        cancel: CancellationToken,
    ) {
        loop {
            let command = tokio::select! {
                _ = cancel.cancelled() => break,
                command = receiver.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };
            let frame = protocol::encode(&command);
            debug!(event = command.event_name(), "Outbound frame");
            if let Err(e) = sink.send(Message::text(frame)).await {
                warn!(error = %e, "Failed to send frame");
                return;
            }
        }
        let _ = sink.send(Message::Close(None)).await;
    }
}

#[async_trait]
impl LiveChannel for SessionConnection {
    async fn connect(&self, token: &str) -> Result<(), ChannelError> {
        let mut supervisor = self.supervisor.lock().await;
        if let Some(running) = supervisor.as_ref()
            && !running.task.is_finished()
        {
            debug!("Live channel already connected");
            return Ok(());
        }

        let socket = Self::open(&self.url, token).await?;
        info!(url = %self.url, "Live channel connected");

        let cancel = CancellationToken::new();
        let attached = Self::attach(socket, &self.shared, &cancel);
        let task = tokio::spawn(Self::supervise(
            self.url.clone(),
            token.to_string(),
            self.policy.clone(),
            Arc::clone(&self.shared),
            cancel.clone(),
            attached,
        ));
        *supervisor = Some(Supervisor { cancel, task });
        Ok(())
    }

    async fn disconnect(&self) {
        let Some(running) = self.supervisor.lock().await.take() else {
            return;
        };
        running.cancel.cancel();
        let _ = running.task.await;
        self.shared.set_outbound(None);
        info!("Live channel disconnected");
        self.shared.handlers.dispatch(&InboundEvent::Disconnected {
            reason: CLIENT_DISCONNECT.to_string(),
        });
    }

    fn is_connected(&self) -> bool {
        self.shared.outbound().is_some()
    }

    fn emit(&self, command: OutboundCommand) {
        match self.shared.outbound() {
            Some(sender) => {
                let _ = sender.send(command);
            }
            None => debug!(event = command.event_name(), "Not connected, dropping command"),
        }
    }

    fn on(&self, event: EventName, handler: EventHandler) -> HandlerId {
        self.shared.handlers.register(event, handler)
    }

    fn off(&self, event: EventName, handler: Option<HandlerId>) {
        self.shared.handlers.remove(event, handler);
    }
}

impl Drop for SessionConnection {
    fn drop(&mut self) {
        if let Some(running) = self.supervisor.get_mut().take() {
            running.cancel.cancel();
        }
    }
}
