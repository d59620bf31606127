//! RelaySession processor.
//!
//! The RelaySession is responsible for:
//! - Owning the single outbound chat connection
//! - Draining the chat line channel onto it, one line at a time
//! - Joining the configured channel once the network accepted us
//! - Reconnecting immediately after losing a registered connection, with
//!   backoff after attempts that never got that far
//! - Routing channel messages to the `ChatHandler`
//! - Scheduling documentation index refreshes
//!
//! It is the only component that writes to the transport. Lines wait in
//! the channel while the session is not connected.

use super::chat_handler::ChatHandler;
use super::doc_index::DocIndexRefresher;
use crate::context::RelayContext;
use crate::events::{ChatLine, ChatLineReceiver, TransportEventReceiver};
use crate::transport::{ChatTransport, IncomingMessage, TransportEvent};
use crate::utils::backoff::ReconnectPolicy;
use kanau::processor::Processor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Connection state of the chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Connected => write!(f, "connected"),
        }
    }
}

/// RelaySession serializes every producer onto one chat connection.
pub struct RelaySession<T> {
    transport: T,
    channel: String,
    lines_rx: ChatLineReceiver,
    events_rx: TransportEventReceiver,
    chat_handler: Arc<ChatHandler>,
    refresher: DocIndexRefresher,
    refresh_interval: Duration,
    reconnect: ReconnectPolicy,
    state_tx: watch::Sender<SessionState>,
    /// Attempts since the network last accepted our registration.
    attempt: u32,
    /// Whether the current connection reached registration.
    registered: bool,
    /// When the next backoff retry is due, if one is scheduled.
    retry_at: Option<Instant>,
}

impl<T: ChatTransport> RelaySession<T> {
    /// Create a new RelaySession.
    ///
    /// # Arguments
    ///
    /// * `context` - Relay context providing config, handler and refresher
    /// * `transport` - Chat transport reporting on the sender paired with `events_rx`
    /// * `events_rx` - Receiver for transport events
    /// * `lines_rx` - Receiver for outbound chat lines
    pub fn new(
        context: &RelayContext,
        transport: T,
        events_rx: TransportEventReceiver,
        lines_rx: ChatLineReceiver,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Disconnected);
        Self {
            transport,
            channel: context.config().irc.channel.clone(),
            lines_rx,
            events_rx,
            chat_handler: Arc::new(context.chat_handler()),
            refresher: context.doc_refresher(),
            refresh_interval: context.config().docs.refresh_interval,
            reconnect: ReconnectPolicy::default(),
            state_tx,
            attempt: 0,
            registered: false,
            retry_at: None,
        }
    }

    /// Replace the default backoff policy for unregistered attempts.
    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Observe state transitions, e.g. for health reporting.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Run the RelaySession until shutdown is signaled.
    ///
    /// The first refresh tick fires immediately, so the documentation index
    /// is loaded at startup and then every `refresh_interval`.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(channel = %self.channel, "RelaySession started");

        let mut refresh = tokio::time::interval(self.refresh_interval);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.connect().await;

        loop {
            let retry_at = self.retry_at;
            let connected = self.state() == SessionState::Connected;

            tokio::select! {
                biased;

                // Check for shutdown
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("RelaySession received shutdown signal");
                        break;
                    }
                }

                Some(event) = self.events_rx.recv() => {
                    self.handle_transport_event(event).await;
                }

                // Backoff elapsed after an unregistered attempt.
                () = tokio::time::sleep_until(retry_at.unwrap_or_else(Instant::now)), if retry_at.is_some() => {
                    self.connect().await;
                }

                // Exactly one line per iteration keeps per-producer order.
                // Until connected, lines stay queued and producers block.
                Some(line) = self.lines_rx.recv(), if connected => {
                    self.deliver(line).await;
                }

                _ = refresh.tick() => {
                    debug!("Scheduling documentation index refresh");
                    self.refresher.spawn_refresh();
                }
            }
        }

        self.transport.disconnect("relay shutting down").await;
        self.set_state(SessionState::Disconnected);
        info!("RelaySession shutdown complete");
    }

    fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    fn set_state(&self, state: SessionState) {
        self.state_tx.send_replace(state);
    }

    /// Issue one connect attempt. On failure, schedule the next one.
    async fn connect(&mut self) {
        self.retry_at = None;
        self.registered = false;
        self.set_state(SessionState::Connecting);
        info!(attempt = self.attempt, "Connecting to chat network");

        match self.transport.connect().await {
            Ok(()) => debug!("Transport up, waiting for registration"),
            Err(e) => {
                error!(error = %e, attempt = self.attempt, "Connection error");
                self.set_state(SessionState::Disconnected);
                self.schedule_retry();
            }
        }
    }

    /// Arm the backoff timer unless it is already running.
    fn schedule_retry(&mut self) {
        if self.retry_at.is_some() {
            return;
        }
        if !self.reconnect.allows(self.attempt) {
            error!(
                attempt = self.attempt,
                "Giving up on reconnecting until the transport reports again"
            );
            return;
        }

        let delay = self.reconnect.delay_before(self.attempt);
        self.attempt += 1;
        self.retry_at = Some(Instant::now() + delay);
        info!(delay_ms = delay.as_millis() as u64, "Scheduled reconnect");
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                self.attempt = 0;
                self.registered = true;
                self.retry_at = None;
                self.set_state(SessionState::Connected);
                info!(channel = %self.channel, "Connected, joining channel");
                if let Err(e) = self.transport.join(&self.channel).await {
                    warn!(error = %e, channel = %self.channel, "Failed to join channel");
                }
            }
            TransportEvent::Disconnected => {
                self.set_state(SessionState::Disconnected);
                if self.registered {
                    info!("Disconnected. Reconnecting...");
                    self.connect().await;
                } else {
                    // Closed before registration: throttled, banned or
                    // not an IRC server at all.
                    warn!(attempt = self.attempt, "Connection closed before registration");
                    self.schedule_retry();
                }
            }
            TransportEvent::Message(message) => self.route_message(message),
        }
    }

    /// Hand channel messages to the ChatHandler; drop everything else.
    fn route_message(&self, message: IncomingMessage) {
        if message.target != self.channel {
            info!(
                to = %message.target,
                sender = ?message.sender,
                text = %message.text,
                "Ignoring private message"
            );
            return;
        }

        // The handler sends into the channel this loop drains, so it must
        // not run inline.
        let handler = Arc::clone(&self.chat_handler);
        tokio::spawn(async move {
            let _ = handler.process(message).await;
        });
    }

    async fn deliver(&mut self, line: ChatLine) {
        if let Err(e) = self.transport.send_message(&self.channel, line.text()).await {
            warn!(error = %e, producer = %line.producer(), "Failed to send chat line");
        }
    }
}
