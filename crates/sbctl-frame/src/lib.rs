//! Encrypted packet codec for the soundbar control protocol.
//!
//! Every message on the wire is framed with:
//! - A 1-byte magic number (`0x10`)
//! - Three reserved zero bytes
//! - A 1-byte ciphertext length
//!
//! followed by a JSON document encrypted with AES-256-CBC under a fixed key
//! and IV baked into the device firmware. The codec is stateless: every
//! function here is a pure transform over bytes.

pub mod cipher;
pub mod codec;
pub mod error;
pub mod message;
#[cfg(feature = "async")]
pub mod stream;

pub use codec::{
    decode, decode_frame, encode, encode_frame, split_frame, FrameConfig, FrameHeader,
    DEFAULT_MAX_PAYLOAD, HEADER_SIZE, MAGIC, MAX_WIRE_LENGTH,
};
pub use error::{FrameError, Result};
pub use message::{Command, CommandKind, Response};
#[cfg(feature = "async")]
pub use stream::FrameCodec;
