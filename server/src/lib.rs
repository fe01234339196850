//! DAAP server for the dmap workspace.
//!
//! [`Server`] owns a [`library::Library`], publishes it in revisions, and
//! answers the DAAP paths over the [`transport`] web server: server info,
//! content codes, login and logout, the `/update` long-poll, database,
//! playlist and track listings with deltas, and track streaming with
//! byte-range resume.
//!
//! Every path except `/server-info`, `/content-codes` and `/login` needs a
//! `session-id` from a successful login; sessions expire after
//! [`ServerConfig::session_timeout_secs`] of inactivity.

mod config;
mod error;
mod info;
mod routes;
mod server;
mod session;

pub use config::{ServerConfig, DEFAULT_PORT, DEFAULT_SESSION_TIMEOUT_SECS};
pub use error::{RequestError, ServerError};
pub use info::{server_info_node, DAAP_VERSION, DMAP_VERSION};
pub use routes::Route;
pub use server::Server;
pub use session::{Session, SessionHold, SessionManager};
