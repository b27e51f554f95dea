use std::future::Future;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;

/// Opens byte streams to a device.
///
/// The session driver calls [`Connector::connect`] once per connection
/// attempt and owns the returned stream until it closes. Implementations must
/// not cache streams: every call is a fresh attempt.
pub trait Connector: Send + Sync + 'static {
    /// Connected stream type.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Start a new connection attempt.
    fn connect(&self) -> impl Future<Output = Result<Self::Stream>> + Send;

    /// Human-readable endpoint description for logs.
    fn endpoint(&self) -> String;
}
