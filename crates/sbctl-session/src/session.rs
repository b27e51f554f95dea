//! Session facade and the driver task behind it.
//!
//! A [`Session`] is a cheap, cloneable handle. All state lives in a single
//! driver task spawned on the current tokio runtime, which owns the
//! [`Lifecycle`] machine, the socket halves and both timers, and executes the
//! actions the machine emits.

use std::future::{pending, Future};
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use sbctl_frame::{Command, FrameCodec, FrameConfig, FrameError, Response};
use sbctl_transport::{Connector, TcpConnector};
use tokio::io::{ReadHalf, WriteHalf};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep, timeout, Sleep};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::lifecycle::{CloseReason, ConnectionState, Lifecycle, LifecycleAction};
use crate::queue::Callback;

/// Handle to a soundbar session.
///
/// Commands are sent in submission order, one at a time. No socket is opened
/// until the first command is submitted, and an idle connection is closed
/// after [`SessionConfig::idle_timeout`].
#[derive(Debug, Clone)]
pub struct Session {
    events: mpsc::UnboundedSender<SessionEvent>,
    state: watch::Receiver<ConnectionState>,
    endpoint: Arc<str>,
}

impl Session {
    /// Start a session with a soundbar at `host:port`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(host: impl Into<String>, port: u16, config: SessionConfig) -> Self {
        let connector =
            TcpConnector::new(host, port).with_connect_timeout(config.connect_timeout);
        Self::with_connector(connector, config)
    }

    /// Start a session over an arbitrary [`Connector`].
    pub fn with_connector<C: Connector>(connector: C, config: SessionConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let endpoint: Arc<str> = Arc::from(connector.endpoint());

        let driver = Driver::new(connector, &config, events_rx, state_tx);
        tokio::spawn(driver.run());
        debug!(endpoint = %endpoint, "session driver started");

        Self {
            events: events_tx,
            state: state_rx,
            endpoint,
        }
    }

    /// Queue a command. `callback` runs exactly once on the driver task with
    /// the decoded response, or `None` if the request was abandoned.
    ///
    /// The callback never runs if the device stays unreachable.
    pub fn submit<F>(&self, command: Command, callback: F) -> Result<()>
    where
        F: FnOnce(Option<Response>) + Send + 'static,
    {
        self.events
            .send(SessionEvent::Submit {
                command,
                callback: Box::new(callback),
            })
            .map_err(|_| SessionError::Closed)
    }

    /// Queue a command and wait for its response.
    pub async fn request(&self, command: Command) -> Result<Option<Response>> {
        let (tx, rx) = oneshot::channel();
        self.submit(command, move |response| {
            let _ = tx.send(response);
        })?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Like [`Session::request`], giving up after `timeout`.
    ///
    /// Giving up does not withdraw the command; it is still sent once it
    /// reaches the head of the queue.
    pub async fn request_with_timeout(
        &self,
        command: Command,
        timeout: Duration,
    ) -> Result<Option<Response>> {
        tokio::time::timeout(timeout, self.request(command))
            .await
            .map_err(|_| SessionError::Timeout(timeout))?
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver notified on every connection state change.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether the driver task is still running.
    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }

    /// Stop the driver, closing any open socket. Outstanding requests resolve
    /// to `None`.
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.events
            .send(SessionEvent::Shutdown(tx))
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }
}

enum SessionEvent {
    Submit { command: Command, callback: Callback },
    Shutdown(oneshot::Sender<()>),
}

impl std::fmt::Debug for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submit { command, .. } => f
                .debug_struct("Submit")
                .field("command", command)
                .finish_non_exhaustive(),
            Self::Shutdown(_) => f.write_str("Shutdown"),
        }
    }
}

type ConnectFuture<S> = Pin<Box<dyn Future<Output = sbctl_transport::Result<S>> + Send>>;

/// What woke the driver.
enum DriverEvent<S> {
    Session(SessionEvent),
    HandlesDropped,
    ConnectResult(sbctl_transport::Result<S>),
    Frame(Option<std::result::Result<Bytes, FrameError>>),
    IdleTimeout,
    ReconnectTimer,
}

struct Driver<C: Connector> {
    connector: Arc<C>,
    lifecycle: Lifecycle,
    frame_config: FrameConfig,
    write_timeout: Duration,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    state: watch::Sender<ConnectionState>,
    connecting: Option<ConnectFuture<C::Stream>>,
    reader: Option<FramedRead<ReadHalf<C::Stream>, FrameCodec>>,
    writer: Option<FramedWrite<WriteHalf<C::Stream>, FrameCodec>>,
    idle: Option<Pin<Box<Sleep>>>,
    reconnect: Option<Pin<Box<Sleep>>>,
}

impl<C: Connector> Driver<C> {
    fn new(
        connector: C,
        config: &SessionConfig,
        events: mpsc::UnboundedReceiver<SessionEvent>,
        state: watch::Sender<ConnectionState>,
    ) -> Self {
        Self {
            connector: Arc::new(connector),
            lifecycle: Lifecycle::new(config),
            frame_config: config.frame_config(),
            write_timeout: config.write_timeout,
            events,
            state,
            connecting: None,
            reader: None,
            writer: None,
            idle: None,
            reconnect: None,
        }
    }

    async fn run(mut self) {
        loop {
            let event = tokio::select! {
                event = self.events.recv() => match event {
                    Some(event) => DriverEvent::Session(event),
                    None => DriverEvent::HandlesDropped,
                },
                result = connect_slot(&mut self.connecting) => DriverEvent::ConnectResult(result),
                frame = frame_slot(&mut self.reader) => DriverEvent::Frame(frame),
                () = timer_slot(&mut self.idle) => DriverEvent::IdleTimeout,
                () = timer_slot(&mut self.reconnect) => DriverEvent::ReconnectTimer,
            };

            let actions = match event {
                DriverEvent::Session(SessionEvent::Submit { command, callback }) => {
                    self.lifecycle.submit(command, callback)
                }
                DriverEvent::Session(SessionEvent::Shutdown(ack)) => {
                    self.stop().await;
                    let _ = ack.send(());
                    return;
                }
                DriverEvent::HandlesDropped => {
                    debug!("all session handles dropped");
                    self.stop().await;
                    return;
                }
                DriverEvent::ConnectResult(Ok(stream)) => {
                    self.connecting = None;
                    self.attach(stream);
                    self.lifecycle.on_connected()
                }
                DriverEvent::ConnectResult(Err(err)) => {
                    self.connecting = None;
                    warn!(
                        endpoint = %self.connector.endpoint(),
                        error = %err,
                        retryable = err.is_retryable(),
                        "connect failed"
                    );
                    self.lifecycle.on_connect_failed()
                }
                DriverEvent::Frame(Some(Ok(frame))) => self.lifecycle.on_frame(&frame),
                DriverEvent::Frame(Some(Err(err))) => {
                    warn!(error = %err, "read failed");
                    self.detach();
                    self.lifecycle.on_socket_error()
                }
                DriverEvent::Frame(None) => {
                    self.detach();
                    self.lifecycle.on_closed(CloseReason::Remote)
                }
                DriverEvent::IdleTimeout => {
                    self.idle = None;
                    self.lifecycle.on_idle_timeout()
                }
                DriverEvent::ReconnectTimer => {
                    self.reconnect = None;
                    self.lifecycle.on_reconnect_timer()
                }
            };

            self.execute(actions).await;
            self.publish_state();
        }
    }

    async fn stop(&mut self) {
        let actions = self.lifecycle.shutdown();
        self.execute(actions).await;
        self.connecting = None;
        self.publish_state();
    }

    /// Run actions in order. A failed write drops the connection once the
    /// batch is done and feeds the resulting socket-error actions back in.
    async fn execute(&mut self, mut actions: Vec<LifecycleAction>) {
        loop {
            let mut write_failed = false;
            for action in actions {
                match action {
                    LifecycleAction::Connect => self.start_connect(),
                    LifecycleAction::Send(frame) => {
                        if write_failed {
                            continue;
                        }
                        if let Err(err) = self.write(frame).await {
                            warn!(error = %err, "write failed");
                            write_failed = true;
                        }
                    }
                    LifecycleAction::Close => self.detach(),
                    LifecycleAction::ArmIdleTimer(after) => {
                        self.idle = Some(Box::pin(sleep(after)));
                    }
                    LifecycleAction::CancelIdleTimer => self.idle = None,
                    LifecycleAction::ArmReconnectTimer(after) => {
                        self.reconnect = Some(Box::pin(sleep(after)));
                    }
                    LifecycleAction::CancelReconnectTimer => self.reconnect = None,
                }
            }

            if !write_failed {
                return;
            }
            self.detach();
            actions = self.lifecycle.on_socket_error();
        }
    }

    fn start_connect(&mut self) {
        let connector = Arc::clone(&self.connector);
        debug!(endpoint = %connector.endpoint(), "opening connection");
        self.connecting = Some(Box::pin(async move { connector.connect().await }));
    }

    fn attach(&mut self, stream: C::Stream) {
        let (read, write) = tokio::io::split(stream);
        self.reader = Some(FramedRead::new(
            read,
            FrameCodec::new(self.frame_config.clone()),
        ));
        self.writer = Some(FramedWrite::new(
            write,
            FrameCodec::new(self.frame_config.clone()),
        ));
    }

    fn detach(&mut self) {
        if self.reader.is_some() || self.writer.is_some() {
            debug!(endpoint = %self.connector.endpoint(), "closing socket");
        }
        self.reader = None;
        self.writer = None;
    }

    /// Write one frame. A device that stops reading stalls the write; past
    /// `write_timeout` that is reported as a timed-out I/O error.
    async fn write(&mut self, frame: Bytes) -> std::result::Result<(), FrameError> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(FrameError::ConnectionClosed);
        };
        match timeout(self.write_timeout, writer.send(frame)).await {
            Ok(result) => result,
            Err(_) => Err(FrameError::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("write stalled for {:?}", self.write_timeout),
            ))),
        }
    }

    fn publish_state(&self) {
        let current = self.lifecycle.state();
        let changed = self.state.send_if_modified(|state| {
            if *state == current {
                return false;
            }
            *state = current;
            true
        });
        if changed {
            info!(state = %current, "connection state changed");
        }
    }
}

async fn connect_slot<S>(slot: &mut Option<ConnectFuture<S>>) -> sbctl_transport::Result<S> {
    match slot {
        Some(attempt) => attempt.as_mut().await,
        None => pending().await,
    }
}

async fn frame_slot<R>(
    slot: &mut Option<FramedRead<R, FrameCodec>>,
) -> Option<std::result::Result<Bytes, FrameError>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    match slot {
        Some(reader) => reader.next().await,
        None => pending().await,
    }
}

async fn timer_slot(slot: &mut Option<Pin<Box<Sleep>>>) {
    match slot {
        Some(timer) => timer.as_mut().await,
        None => pending().await,
    }
}
