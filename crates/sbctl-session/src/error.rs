use std::time::Duration;

/// Errors surfaced by the session facade.
///
/// Connection and codec failures never show up here: the driver recovers
/// from them and the affected request resolves to `None` instead.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The driver task has stopped (shutdown, or every handle dropped).
    #[error("session closed")]
    Closed,

    /// No response arrived in time. The command stays queued.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl SessionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
