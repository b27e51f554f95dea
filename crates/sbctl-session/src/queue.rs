//! FIFO backlog plus the single in-flight slot.
//!
//! The device never tags responses with a request identifier, so
//! correlation is positional: the one request in flight is, by
//! construction, the one whose response arrives next.

use std::collections::VecDeque;
use std::fmt;

use sbctl_frame::{Command, Response};
use tracing::{debug, warn};

/// Completion for a submitted command. Runs exactly once, on the session
/// driver task, so it must not block.
pub type Callback = Box<dyn FnOnce(Option<Response>) + Send + 'static>;

struct Entry {
    command: Command,
    callback: Callback,
}

/// The command currently on the wire and its completion.
pub struct PendingRequest {
    command: Command,
    callback: Callback,
}

impl PendingRequest {
    pub fn command(&self) -> &Command {
        &self.command
    }

    fn complete(self, response: Option<Response>) {
        (self.callback)(response);
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}

/// Ordered backlog of unsent commands plus at most one in-flight request.
#[derive(Default)]
pub struct CommandQueue {
    backlog: VecDeque<Entry>,
    in_flight: Option<PendingRequest>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command to the backlog. Never triggers transmission.
    pub fn enqueue<F>(&mut self, command: Command, callback: F)
    where
        F: FnOnce(Option<Response>) + Send + 'static,
    {
        self.backlog.push_back(Entry {
            command,
            callback: Box::new(callback),
        });
    }

    /// Move the head of the backlog into the in-flight slot.
    ///
    /// Returns `None` while another request is still awaiting its response,
    /// or when the backlog is empty.
    pub fn next_to_send(&mut self) -> Option<&Command> {
        if self.in_flight.is_some() {
            return None;
        }
        let Entry { command, callback } = self.backlog.pop_front()?;
        let pending = self.in_flight.insert(PendingRequest { command, callback });
        Some(&pending.command)
    }

    /// Deliver a response (or an explicit absence) to the in-flight request.
    ///
    /// Returns `false` when nothing was in flight; the value is discarded
    /// rather than held for a later command.
    pub fn resolve(&mut self, response: Option<Response>) -> bool {
        match self.in_flight.take() {
            Some(pending) => {
                debug!(command = %pending.command, delivered = response.is_some(), "resolving request");
                pending.complete(response);
                true
            }
            None => {
                warn!(
                    decoded = response.is_some(),
                    "discarding frame with no request in flight"
                );
                false
            }
        }
    }

    /// Give up on the in-flight request, completing it with `None`.
    ///
    /// Returns `false` when nothing was in flight.
    pub fn abandon(&mut self) -> bool {
        match self.in_flight.take() {
            Some(pending) => {
                warn!(command = %pending.command, "abandoning in-flight request");
                pending.complete(None);
                true
            }
            None => false,
        }
    }

    /// Complete every request, in flight and queued, with `None`.
    pub fn drain(&mut self) -> usize {
        let mut drained = usize::from(self.in_flight.is_some());
        if let Some(pending) = self.in_flight.take() {
            pending.complete(None);
        }
        while let Some(entry) = self.backlog.pop_front() {
            (entry.callback)(None);
            drained += 1;
        }
        drained
    }

    pub fn in_flight(&self) -> Option<&PendingRequest> {
        self.in_flight.as_ref()
    }

    pub fn has_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Number of commands waiting to be sent (excluding the in-flight one).
    pub fn len(&self) -> usize {
        self.backlog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backlog.is_empty()
    }
}

impl fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandQueue")
            .field("backlog", &self.backlog.len())
            .field("in_flight", &self.in_flight)
            .finish()
    }
}
