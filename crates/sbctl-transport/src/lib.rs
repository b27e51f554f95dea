//! TCP transport for soundbar sessions.
//!
//! Provides the [`Connector`] seam the session driver opens sockets through,
//! and the production [`TcpConnector`] that dials the device on its control
//! port (9741 by convention).
//!
//! This is the lowest layer of sbctl. The session crate never touches
//! `TcpStream` directly, which keeps it testable over in-memory streams.

pub mod error;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use tcp::{TcpConnector, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT};
pub use traits::Connector;
