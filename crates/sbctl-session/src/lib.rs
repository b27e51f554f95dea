//! Lazy, self-healing request/response session with an LG soundbar.
//!
//! This is the "just works" layer. Submit commands to a [`Session`]; it opens
//! the TCP connection on demand, sends one command at a time, matches each
//! response to the command that caused it, closes the socket when idle and
//! reconnects when there is queued work.
//!
//! ```no_run
//! # async fn demo() -> sbctl_session::Result<()> {
//! use sbctl_frame::Command;
//! use sbctl_session::{Session, SessionConfig};
//!
//! let session = Session::connect("192.168.1.50", 9741, SessionConfig::default());
//! if let Some(response) = session.request(Command::get("SPK_LIST_VIEW_INFO")).await? {
//!     println!("volume: {:?}", response.field("i_vol"));
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod queue;
pub mod session;

pub use config::{
    SessionConfig, DEFAULT_IDLE_TIMEOUT, DEFAULT_RECONNECT_DELAY, DEFAULT_WRITE_TIMEOUT,
};
pub use error::{Result, SessionError};
pub use lifecycle::{CloseReason, ConnectionState, Lifecycle, LifecycleAction};
pub use queue::{Callback, CommandQueue, PendingRequest};
pub use session::Session;
