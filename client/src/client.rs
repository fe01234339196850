//! The DAAP client: login, mirroring, update polling and downloads.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use library::{
    parse_databases, parse_login, parse_playlists, parse_update, Database, DatabaseId,
    PlaylistId, PlaylistSummary, PlaylistTracksListing, Revision, ServiceRecord, TrackId,
    TrackListing, DEFAULT_META,
};
use tracing::{debug, info, warn};
use transport::{BasicCredentials, Query};
use wire::ContentCodeBag;

use crate::config::ClientConfig;
use crate::error::{ClientError, LoginError};
use crate::events::ClientEvent;
use crate::fetcher::{Fetcher, TrackStream};
use crate::info::ServerInfo;
use crate::sync::{apply_playlist_tracks, apply_playlists, apply_tracks, drain_events, Mirror};

/// Listings of one database, fetched before any of it is applied.
struct DatabaseUpdate {
    id: DatabaseId,
    tracks: TrackListing,
    playlists: Vec<PlaylistSummary>,
    playlist_tracks: Vec<(PlaylistId, PlaylistTracksListing)>,
}

#[derive(Debug)]
struct Shared {
    fetcher: Fetcher,
    bag: ContentCodeBag,
    info: ServerInfo,
    mirror: Mutex<Mirror>,
    subscribers: Mutex<Vec<Sender<ClientEvent>>>,
}

impl Shared {
    fn mirror(&self) -> MutexGuard<'_, Mirror> {
        self.mirror.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fetch_node(&self, path: &str, query: Query) -> Result<wire::ContentNode, ClientError> {
        self.fetcher.fetch_node(&self.bag, path, query)
    }

    /// The server's revision, waiting for it to move past `known` unless
    /// `known` is zero.
    fn poll_revision(&self, known: Revision) -> Result<Revision, ClientError> {
        let query = if known.is_zero() {
            Query::new()
        } else {
            Query::new().with("revision-number", known)
        };
        Ok(parse_update(&self.fetch_node("/update", query)?)?)
    }

    fn listing_query(known: Revision, target: Revision) -> Query {
        let mut query = Query::new();
        if !target.is_zero() {
            query = query.with("revision-number", target);
        }
        if !known.is_zero() && !target.is_zero() {
            query = query.with("delta", target.raw() - known.raw());
        }
        query
    }

    fn fetch_database(
        &self,
        id: DatabaseId,
        known: Revision,
        target: Revision,
    ) -> Result<DatabaseUpdate, ClientError> {
        let query = Self::listing_query(known, target);
        let tracks = TrackListing::from_node(&self.fetch_node(
            &format!("/databases/{id}/items"),
            query.clone().with("meta", DEFAULT_META.join(",")),
        )?)?;
        let playlists = parse_playlists(
            &self.fetch_node(&format!("/databases/{id}/containers"), query.clone())?,
        )?;
        let mut playlist_tracks = Vec::new();
        for playlist in playlists.iter().filter(|p| !p.is_base) {
            let node = self.fetch_node(
                &format!("/databases/{id}/containers/{}/items", playlist.id),
                query.clone(),
            )?;
            playlist_tracks.push((playlist.id, PlaylistTracksListing::from_node(&node)?));
        }
        Ok(DatabaseUpdate {
            id,
            tracks,
            playlists,
            playlist_tracks,
        })
    }

    /// Brings the mirror from `known` to `target`.
    ///
    /// Everything is fetched first and applied under one lock, so readers
    /// never see a half-applied revision.
    fn sync(&self, known: Revision, target: Revision) -> Result<(), ClientError> {
        let databases = parse_databases(&self.fetch_node("/databases", Query::new())?)?;
        let updates = databases
            .iter()
            .map(|summary| self.fetch_database(summary.id, known, target))
            .collect::<Result<Vec<_>, _>>()?;

        let mut events = Vec::new();
        let mut mirror = self.mirror();
        mirror.apply_databases(&databases, &mut events);
        for update in updates {
            let Some(db) = mirror.database_mut(update.id) else {
                continue;
            };
            apply_tracks(db, update.tracks);
            let playlists = apply_playlists(db, &update.playlists);
            for (playlist, listing) in &update.playlist_tracks {
                if playlists.contains(playlist) {
                    apply_playlist_tracks(db, *playlist, listing);
                }
            }
            drain_events(db, &mut events);
        }
        mirror.set_revision(target);
        drop(mirror);

        debug!(%known, %target, changes = events.len(), "mirror updated");
        events.push(ClientEvent::Revision(target));
        self.publish(events);
        Ok(())
    }

    /// One update: wait for a new revision and apply it.
    fn refresh(&self) -> Result<(), ClientError> {
        let known = self.mirror().revision();
        if !self.info.supports_update {
            return self.sync(known, known);
        }
        let target = self.poll_revision(known)?;
        if target == known {
            return Ok(());
        }
        self.sync(known, target)
    }

    fn publish(&self, events: Vec<ClientEvent>) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for event in events {
            subscribers.retain(|subscriber| subscriber.send(event.clone()).is_ok());
        }
    }
}

/// Background `/update` loop.
#[derive(Debug)]
struct Poller {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

fn poll_loop(shared: &Shared, shutdown: &Receiver<()>, backoff: Duration) {
    loop {
        if !matches!(shutdown.try_recv(), Err(TryRecvError::Empty)) {
            break;
        }
        let Err(err) = shared.refresh() else {
            continue;
        };
        if !matches!(shutdown.try_recv(), Err(TryRecvError::Empty)) {
            break;
        }
        warn!(error = %err, ?backoff, "update failed, backing off");
        match shutdown.recv_timeout(backoff) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    debug!("update loop stopped");
}

/// A connection to one DAAP server.
///
/// [`connect`](Self::connect) reads the server's content codes and info;
/// a login then mirrors every database and, when the server supports it,
/// starts a background thread that long-polls `/update` and applies each
/// new revision. Changes reach every [`subscribe`](Self::subscribe)
/// receiver in the order they were applied.
///
/// ```no_run
/// use client::{Client, ClientConfig};
///
/// let client = Client::connect("10.0.0.2:3689".parse()?, ClientConfig::default())?;
/// client.login()?;
/// for db in client.databases() {
///     println!("{}: {} tracks", db.name(), db.track_count());
/// }
/// client.logout();
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Client {
    shared: Arc<Shared>,
    poller: Mutex<Option<Poller>>,
}

impl Client {
    /// Fetches the content codes and server info.
    pub fn connect(addr: SocketAddr, config: ClientConfig) -> Result<Self, ClientError> {
        let fetcher = Fetcher::new(addr, config);
        let codes = fetcher.fetch("/content-codes", Query::new())?;
        let bag = ContentCodeBag::parse_codes(&codes, &fetcher.config().decode_limits)?;
        let info = ServerInfo::from_node(&fetcher.fetch_node(&bag, "/server-info", Query::new())?)?;
        debug!(%addr, name = %info.name, codes = bag.len(), "connected");
        Ok(Self {
            shared: Arc::new(Shared {
                fetcher,
                bag,
                info,
                mirror: Mutex::new(Mirror::default()),
                subscribers: Mutex::new(Vec::new()),
            }),
            poller: Mutex::new(None),
        })
    }

    /// Connects to a discovered service.
    pub fn from_service(service: &ServiceRecord, config: ClientConfig) -> Result<Self, ClientError> {
        Self::connect(service.socket_addr(), config)
    }

    #[must_use]
    pub fn info(&self) -> &ServerInfo {
        &self.shared.info
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.shared.info.name
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.shared.fetcher.addr()
    }

    /// Codes the server sent, merged over the built-in ones.
    #[must_use]
    pub fn content_codes(&self) -> &ContentCodeBag {
        &self.shared.bag
    }

    /// Logs in without credentials.
    pub fn login(&self) -> Result<(), LoginError> {
        self.login_as(None)
    }

    /// Logs in to a password-protected share.
    pub fn login_with_password(&self, password: &str) -> Result<(), LoginError> {
        self.login_as(Some(BasicCredentials::new("", password)))
    }

    /// Logs in with a username and password.
    pub fn login_with_user(&self, username: &str, password: &str) -> Result<(), LoginError> {
        self.login_as(Some(BasicCredentials::new(username, password)))
    }

    fn login_as(&self, credentials: Option<BasicCredentials>) -> Result<(), LoginError> {
        if self.is_logged_in() {
            self.logout();
        }
        let shared = &self.shared;
        shared.fetcher.set_credentials(credentials);
        let session = parse_login(&shared.fetch_node("/login", Query::new())?)
            .map_err(ClientError::from)?;
        shared.fetcher.set_session_id(session);
        info!(addr = %self.addr(), session, "logged in");

        if let Err(err) = shared.refresh() {
            shared.fetcher.set_session_id(0);
            return Err(err.into());
        }
        if shared.info.supports_update {
            self.start_updates().map_err(|err| LoginError::Failed(err.into()))?;
        }
        Ok(())
    }

    fn start_updates(&self) -> io::Result<()> {
        let (shutdown, receiver) = bounded(1);
        let shared = Arc::clone(&self.shared);
        let backoff = shared.fetcher.config().update_backoff;
        let handle = thread::Builder::new()
            .name("dmap-update".to_owned())
            .spawn(move || poll_loop(&shared, &receiver, backoff))?;
        *self.lock_poller() = Some(Poller { shutdown, handle });
        Ok(())
    }

    fn stop_updates(&self) {
        let Some(poller) = self.lock_poller().take() else {
            return;
        };
        let _ = poller.shutdown.try_send(());
        self.shared.fetcher.abort_all();
        if poller.handle.join().is_err() {
            warn!("update thread panicked");
        }
        self.shared.fetcher.reopen();
    }

    fn lock_poller(&self) -> MutexGuard<'_, Option<Poller>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stops updating and ends the session.
    ///
    /// The `/logout` request is best effort; not every server implements it.
    pub fn logout(&self) {
        self.stop_updates();
        let fetcher = &self.shared.fetcher;
        if let Err(err) = fetcher.fetch("/logout", Query::new()) {
            debug!(error = %err, "logout request failed");
        }
        let session = fetcher.session_id();
        fetcher.set_session_id(0);
        fetcher.set_credentials(None);
        self.shared.mirror().clear();
        info!(addr = %self.addr(), session, "logged out");
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.shared.fetcher.session_id() != 0
    }

    /// `true` while the background update thread runs.
    #[must_use]
    pub fn is_updating(&self) -> bool {
        self.lock_poller()
            .as_ref()
            .is_some_and(|poller| !poller.handle.is_finished())
    }

    /// The revision the mirror reflects.
    #[must_use]
    pub fn revision(&self) -> Revision {
        self.shared.mirror().revision()
    }

    /// Copies of the mirrored databases.
    #[must_use]
    pub fn databases(&self) -> Vec<Database> {
        self.shared
            .mirror()
            .databases()
            .iter()
            .map(Database::snapshot)
            .collect()
    }

    #[must_use]
    pub fn database(&self, id: DatabaseId) -> Option<Database> {
        self.shared.mirror().database(id).map(Database::snapshot)
    }

    /// Receives every change applied to the mirror from now on.
    pub fn subscribe(&self) -> Receiver<ClientEvent> {
        let (sender, receiver) = unbounded();
        self.shared
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        receiver
    }

    /// Fetches and applies the latest revision now.
    ///
    /// With a background update thread running this blocks until the next
    /// commit on the server; it is meant for servers without `/update`
    /// support.
    pub fn refresh(&self) -> Result<(), ClientError> {
        if !self.is_logged_in() {
            return Err(ClientError::NotLoggedIn);
        }
        self.shared.refresh()
    }

    fn track_path(&self, database: DatabaseId, track: TrackId) -> Result<String, ClientError> {
        let mirror = self.shared.mirror();
        let db = mirror
            .database(database)
            .ok_or(ClientError::UnknownDatabase(database))?;
        let format = &db
            .track(track)
            .ok_or(ClientError::UnknownTrack { database, track })?
            .format;
        Ok(if format.is_empty() {
            format!("/databases/{database}/items/{track}")
        } else {
            format!("/databases/{database}/items/{track}.{format}")
        })
    }

    /// Opens a track's audio, resuming at `offset` when given.
    ///
    /// The stream's [`len`](TrackStream::len) is the number of bytes from
    /// `offset` to the end.
    pub fn stream_track(
        &self,
        database: DatabaseId,
        track: TrackId,
        offset: Option<u64>,
    ) -> Result<TrackStream, ClientError> {
        if !self.is_logged_in() {
            return Err(ClientError::NotLoggedIn);
        }
        let path = self.track_path(database, track)?;
        debug!(%database, %track, ?offset, "streaming track");
        self.shared.fetcher.fetch_stream(&path, offset)
    }

    /// Downloads a track to `path` and returns the bytes written.
    pub fn download_track(
        &self,
        database: DatabaseId,
        track: TrackId,
        path: impl AsRef<Path>,
    ) -> Result<u64, ClientError> {
        let mut stream = self.stream_track(database, track, None)?;
        let expected = stream.len();
        let mut out = BufWriter::new(File::create(path.as_ref())?);
        let written = io::copy(&mut stream, &mut out)?;
        out.flush()?;
        if written < expected {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("track ended after {written} of {expected} bytes"),
            )
            .into());
        }
        Ok(written)
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.stop_updates();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_query_without_baseline() {
        let query = Shared::listing_query(Revision::default(), Revision::new(4));
        assert_eq!(query.to_string(), "revision-number=4");
        assert!(Shared::listing_query(Revision::default(), Revision::default()).is_empty());
    }

    #[test]
    fn listing_query_with_delta() {
        let query = Shared::listing_query(Revision::new(2), Revision::new(5));
        assert_eq!(query.to_string(), "revision-number=5&delta=3");
    }
}
