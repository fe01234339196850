//! DAAP client for the dmap workspace.
//!
//! A [`Client`] logs in to a server, mirrors its databases into local
//! [`library::Database`] copies, and keeps them current by long-polling
//! `/update` on a background thread. Each new revision is fetched as a
//! delta and reconciled into the mirror; the resulting changes are
//! delivered as [`ClientEvent`]s to every subscriber.
//!
//! # Design Principles
//!
//! - **Fetch, then apply** - A revision's listings are all downloaded before the
//!   mirror is touched, so readers see either the old or the new revision.
//! - **Quiet background errors** - A failed poll is logged and retried after
//!   [`ClientConfig::update_backoff`]; calls made by the user return their errors.
//! - **Abortable** - Logging out shuts down every open socket, including a
//!   long-poll that would otherwise wait for the next commit.

mod client;
mod config;
mod error;
mod events;
mod fetcher;
mod info;
mod sync;

pub use client::Client;
pub use config::{ClientConfig, DEFAULT_UPDATE_BACKOFF};
pub use error::{ClientError, LoginError};
pub use events::ClientEvent;
pub use fetcher::TrackStream;
pub use info::ServerInfo;
