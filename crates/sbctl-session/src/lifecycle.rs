//! Connection lifecycle state machine.
//!
//! # Architecture: Action-Based State Machine
//!
//! [`Lifecycle`] owns the command queue and the connection state but does no
//! I/O. Every event method returns the [`LifecycleAction`]s the driver must
//! execute, in order: open a socket, write a frame, close, or (re)arm and
//! cancel the two timers.
//!
//! ```text
//!                  pump (work queued)         connected
//!  Disconnected ─────────────────────► Connecting ──────────► Connected
//!       ▲  ▲                               │                     │
//!       │  └──── connect failed ───────────┘                     │
//!       └──────────── idle timeout / remote close / error ───────┘
//! ```
//!
//! There is no terminal state. The idle timer and the reconnect timer are
//! mutually exclusive: arming one cancels the other, and re-arming replaces.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use sbctl_frame::{decode, encode, Command, Response};
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::queue::CommandQueue;

/// Connection state as seen by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// A connection attempt is outstanding. Inhibits a second attempt.
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

/// Side effects requested by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleAction {
    /// Start a connection attempt; report back with `on_connected` or
    /// `on_connect_failed`.
    Connect,
    /// Write this encoded frame to the socket.
    Send(Bytes),
    /// Close the socket.
    Close,
    /// Start (or restart) the idle timer.
    ArmIdleTimer(Duration),
    CancelIdleTimer,
    /// Start (or restart) the reconnect timer.
    ArmReconnectTimer(Duration),
    CancelReconnectTimer,
}

/// Why a healthy or half-open connection went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    IdleTimeout,
    /// The device closed the socket.
    Remote,
    ConnectFailed,
}

/// The session's connection state machine.
#[derive(Debug)]
pub struct Lifecycle {
    state: ConnectionState,
    queue: CommandQueue,
    idle_timeout: Duration,
    reconnect_delay: Duration,
    idle_armed: bool,
    reconnect_armed: bool,
}

impl Lifecycle {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            queue: CommandQueue::new(),
            idle_timeout: config.idle_timeout,
            reconnect_delay: config.reconnect_delay,
            idle_armed: false,
            reconnect_armed: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn idle_armed(&self) -> bool {
        self.idle_armed
    }

    pub fn reconnect_armed(&self) -> bool {
        self.reconnect_armed
    }

    /// Enqueue a command and try to make progress.
    pub fn submit<F>(&mut self, command: Command, callback: F) -> Vec<LifecycleAction>
    where
        F: FnOnce(Option<Response>) + Send + 'static,
    {
        debug!(%command, queued = self.queue.len() + 1, "command submitted");
        self.queue.enqueue(command, callback);
        self.pump()
    }

    /// Advance the queue: connect if needed, otherwise send the next command.
    pub fn pump(&mut self) -> Vec<LifecycleAction> {
        let mut actions = Vec::new();
        self.pump_into(&mut actions);
        actions
    }

    /// The connection attempt succeeded.
    pub fn on_connected(&mut self) -> Vec<LifecycleAction> {
        if self.state != ConnectionState::Connecting {
            warn!(state = %self.state, "connected event outside Connecting");
        }
        info!(queued = self.queue.len(), "connected");
        self.state = ConnectionState::Connected;

        let mut actions = Vec::new();
        self.arm_idle(&mut actions);
        self.pump_into(&mut actions);
        actions
    }

    /// The connection attempt failed. Retries after the reconnect delay.
    pub fn on_connect_failed(&mut self) -> Vec<LifecycleAction> {
        let mut actions = Vec::new();
        self.close_into(CloseReason::ConnectFailed, &mut actions);
        actions
    }

    /// A complete frame arrived from the device.
    pub fn on_frame(&mut self, frame: &[u8]) -> Vec<LifecycleAction> {
        let response = decode(frame);
        self.queue.resolve(response);

        let mut actions = Vec::new();
        if self.state == ConnectionState::Connected {
            self.arm_idle(&mut actions);
        }
        self.pump_into(&mut actions);
        actions
    }

    /// The idle timer fired.
    pub fn on_idle_timeout(&mut self) -> Vec<LifecycleAction> {
        self.idle_armed = false;
        if self.state != ConnectionState::Connected {
            return Vec::new();
        }
        info!("idle timeout; closing connection");

        let mut actions = vec![LifecycleAction::Close];
        self.close_into(CloseReason::IdleTimeout, &mut actions);
        actions
    }

    /// The socket closed without an error.
    pub fn on_closed(&mut self, reason: CloseReason) -> Vec<LifecycleAction> {
        let mut actions = Vec::new();
        self.close_into(reason, &mut actions);
        actions
    }

    /// The socket failed while open. Reconnects right away if work remains.
    pub fn on_socket_error(&mut self) -> Vec<LifecycleAction> {
        warn!(state = %self.state, queued = self.queue.len(), "socket error");
        let mut actions = Vec::new();
        self.cancel_idle(&mut actions);
        self.state = ConnectionState::Disconnected;
        self.queue.abandon();
        self.pump_into(&mut actions);
        actions
    }

    /// The reconnect timer fired.
    pub fn on_reconnect_timer(&mut self) -> Vec<LifecycleAction> {
        self.reconnect_armed = false;
        debug!(queued = self.queue.len(), "reconnect timer fired");
        self.pump()
    }

    /// Stop for good: close the socket, cancel timers, complete every
    /// outstanding request with `None`.
    pub fn shutdown(&mut self) -> Vec<LifecycleAction> {
        let mut actions = Vec::new();
        self.cancel_idle(&mut actions);
        self.cancel_reconnect(&mut actions);
        if self.state != ConnectionState::Disconnected {
            actions.push(LifecycleAction::Close);
        }
        self.state = ConnectionState::Disconnected;
        let drained = self.queue.drain();
        info!(drained, "session shut down");
        actions
    }

    fn pump_into(&mut self, actions: &mut Vec<LifecycleAction>) {
        loop {
            if self.queue.is_empty() {
                debug!("queue empty; leaving connection idle");
                return;
            }
            if self.queue.has_in_flight() {
                debug!("awaiting response for in-flight request");
                return;
            }

            match self.state {
                ConnectionState::Disconnected => {
                    info!(queued = self.queue.len(), "connecting");
                    self.cancel_reconnect(actions);
                    self.state = ConnectionState::Connecting;
                    actions.push(LifecycleAction::Connect);
                    return;
                }
                ConnectionState::Connecting => {
                    debug!("connect already in progress");
                    return;
                }
                ConnectionState::Connected => {
                    let encoded = match self.queue.next_to_send() {
                        Some(command) => encode(command),
                        None => return,
                    };
                    match encoded {
                        Ok(frame) => {
                            debug!(queued = self.queue.len(), "sending command");
                            actions.push(LifecycleAction::Send(frame));
                            self.arm_idle(actions);
                            return;
                        }
                        Err(err) => {
                            error!(error = %err, "failed encoding command");
                            self.queue.resolve(None);
                        }
                    }
                }
            }
        }
    }

    fn close_into(&mut self, reason: CloseReason, actions: &mut Vec<LifecycleAction>) {
        info!(?reason, queued = self.queue.len(), "connection closed");
        self.cancel_idle(actions);
        self.state = ConnectionState::Disconnected;
        self.queue.abandon();

        if !self.queue.is_empty() {
            warn!(
                delay_ms = self.reconnect_delay.as_millis() as u64,
                "closed with queued commands; scheduling reconnect"
            );
            self.arm_reconnect(actions);
        }
    }

    fn arm_idle(&mut self, actions: &mut Vec<LifecycleAction>) {
        self.cancel_reconnect(actions);
        self.idle_armed = true;
        actions.push(LifecycleAction::ArmIdleTimer(self.idle_timeout));
    }

    fn cancel_idle(&mut self, actions: &mut Vec<LifecycleAction>) {
        if self.idle_armed {
            self.idle_armed = false;
            actions.push(LifecycleAction::CancelIdleTimer);
        }
    }

    fn arm_reconnect(&mut self, actions: &mut Vec<LifecycleAction>) {
        self.cancel_idle(actions);
        self.reconnect_armed = true;
        actions.push(LifecycleAction::ArmReconnectTimer(self.reconnect_delay));
    }

    fn cancel_reconnect(&mut self, actions: &mut Vec<LifecycleAction>) {
        if self.reconnect_armed {
            self.reconnect_armed = false;
            actions.push(LifecycleAction::CancelReconnectTimer);
        }
    }
}
