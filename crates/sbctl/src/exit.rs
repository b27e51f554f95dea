use std::fmt;
use std::io;

use sbctl::session::{ConnectionState, SessionError};
use sbctl::{CatalogError, SoundbarError};

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn catalog_error(err: CatalogError) -> CliError {
    CliError::usage(err.to_string())
}

/// Map a failed device operation. A timeout before any connection was made
/// means the device is unreachable rather than slow.
pub fn soundbar_error(context: &str, err: SoundbarError, state: ConnectionState) -> CliError {
    match err {
        SoundbarError::Session(SessionError::Timeout(after)) => match state {
            ConnectionState::Connected => CliError::new(
                TIMEOUT,
                format!("{context}: no response within {after:?}"),
            ),
            ConnectionState::Connecting | ConnectionState::Disconnected => CliError::new(
                TRANSPORT_ERROR,
                format!("{context}: device unreachable within {after:?}"),
            ),
        },
        SoundbarError::Session(SessionError::Closed) => {
            CliError::new(INTERNAL, format!("{context}: {err}"))
        }
        SoundbarError::Catalog(err) => catalog_error(err),
        SoundbarError::NoResponse(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        SoundbarError::MissingField { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
    }
}
