//! Control LG soundbars over their encrypted TCP protocol.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP connector abstraction
//! - [`frame`]: encrypted packet codec and message model
//! - [`session`]: lazy, self-healing request/response session
//! - [`catalog`]: category names, input and equalizer tables, value parsing
//! - [`soundbar`]: typed getters and setters over a session

pub mod catalog;
pub mod soundbar;

/// Re-export transport types.
pub mod transport {
    pub use sbctl_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use sbctl_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use sbctl_session::*;
}

pub use catalog::{CatalogError, Setting, VolumeChange};
pub use soundbar::{BasicInfo, Soundbar, SoundbarError};
