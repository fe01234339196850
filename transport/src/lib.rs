//! The HTTP subset DMAP travels over.
//!
//! Only what the protocol needs is implemented: a request line with a raw
//! query string, the `Authorization`, `Range` and `Connection` headers, and
//! responses with either an in-memory body or a streamed one that can resume
//! at a byte offset. [`WebServer`] runs one thread per connection and calls a
//! [`Handler`] for each request; [`ResponseHead`] lets a client read what a
//! server sent.
//!
//! # Design Principles
//!
//! - **Bounded parsing** - Line length, header count and buffered body size are
//!   capped by [`TransportLimits`].
//! - **Blocking handlers** - Handlers run on their connection's thread and may
//!   block, which is what long-polling relies on.
//! - **One credential gate** - Credentials are checked only for `/login`;
//!   everything after that is the handler's business.

mod auth;
mod error;
mod limits;
mod query;
mod request;
mod response;
mod web;

pub use auth::{AuthMethod, Authenticator, Credential};
pub use error::{TransportError, TransportResult};
pub use limits::TransportLimits;
pub use query::Query;
pub use request::{read_request, BasicCredentials, Request};
pub use response::{
    write_access_denied, write_body, write_dmap, write_empty, write_stream, write_text,
    ResponseHead, Status, CHUNK_LEN,
};
pub use web::{Flow, Handler, ResponseWriter, WebServer, LOGIN_PATH, STOP_GRACE};
