//! DMAP wire format for the dmap workspace.
//!
//! DMAP is a self-describing tagged container format: every element is a
//! 4-byte code, a 4-byte big-endian length, then a payload whose shape is
//! decided by the type the code is registered with. This crate holds the
//! code dictionary ([`ContentCodeBag`]), the node tree ([`ContentNode`]), and
//! a bounded codec between the two. It knows nothing about databases or
//! sessions.
//!
//! # Design Principles
//!
//! - **Explicit dictionary** - Encoding and decoding take a bag by reference; there
//!   is no process-wide default.
//! - **Bounded decoding** - Every length is checked against the buffer and [`Limits`]
//!   before it is used.
//! - **Typed values** - A node's variant is fixed when it is built; the encoder
//!   checks it against the bag rather than inferring a type.

mod bag;
mod builtin;
mod code;
mod codec;
mod error;
mod limits;
mod node;
mod reader;

pub use bag::ContentCodeBag;
pub use code::{CodeNumber, ContentCode, ContentType};
pub use codec::{decode, decode_nodes, encode, encode_into, encoded_len, NODE_HEADER_SIZE};
pub use error::{DecodeError, EncodeError, LimitKind, WireResult};
pub use limits::Limits;
pub use node::{ContentNode, ContentValue, Version};

/// Media type of DMAP message bodies.
pub const CONTENT_TYPE: &str = "application/x-dmap-tagged";
