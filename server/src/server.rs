//! The DAAP server: shared state, lifecycle, and request dispatch.

use std::fs::File;
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use library::{
    databases_node, login_node, parse_meta, playlist_tracks_node, playlists_node,
    removed_entries, removed_tracks, tracks_node, update_node, Advertisement, Library, Revision,
    RevisionManager, Snapshot, DEFAULT_META,
};
use tracing::{debug, info};
use transport::{
    AuthMethod, Authenticator, Credential, Flow, Handler, Request, ResponseWriter, Status,
    TransportLimits, TransportResult, WebServer,
};
use wire::{ContentCodeBag, ContentNode};

use crate::config::ServerConfig;
use crate::error::{RequestError, ServerError};
use crate::info::server_info_node;
use crate::routes::Route;
use crate::session::{Session, SessionManager};

/// State shared by the owner and every connection thread.
#[derive(Debug)]
struct Shared {
    name: RwLock<String>,
    machine_id: Option<String>,
    bag: ContentCodeBag,
    library: Mutex<Library>,
    revisions: RevisionManager,
    sessions: SessionManager,
    auth: Arc<Authenticator>,
}

/// A DAAP server publishing one [`Library`].
///
/// Mutate the library through [`library`](Self::library), then
/// [`commit`](Self::commit) to publish the change; connected clients see
/// it on their next `/update`.
///
/// ```no_run
/// use library::Track;
/// use server::{Server, ServerConfig};
///
/// let mut server = Server::new(ServerConfig::named("Music"))?;
/// let db = server.library().add_database("Music");
/// server.library().database_mut(db).unwrap().add_track(Track::new("Song"));
/// server.start()?;
/// server.commit()?;
/// # Ok::<(), server::ServerError>(())
/// ```
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    shared: Arc<Shared>,
    web: Option<WebServer>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let auth = Arc::new(Authenticator::new(config.auth_method, config.name.clone()));
        for credential in &config.credentials {
            auth.add_credential(credential.clone());
        }
        let shared = Arc::new(Shared {
            name: RwLock::new(config.name.clone()),
            machine_id: config.machine_id.clone(),
            bag: ContentCodeBag::builtin(),
            library: Mutex::new(Library::new()),
            revisions: RevisionManager::new(config.history_limit()?),
            sessions: SessionManager::new(config.session_timeout(), config.max_users),
            auth,
        });
        Ok(Self {
            config,
            shared,
            web: None,
        })
    }

    /// Binds the configured address, publishes the first revision and
    /// starts serving.
    pub fn start(&mut self) -> Result<SocketAddr, ServerError> {
        if self.web.is_some() {
            return Err(ServerError::AlreadyRunning);
        }
        let listener = TcpListener::bind(self.config.socket_addr())?;
        self.shared.revisions.resume();
        self.commit()?;
        let handler = Arc::new(DaapHandler {
            shared: Arc::clone(&self.shared),
        });
        let web = WebServer::start(
            listener,
            handler,
            Arc::clone(&self.shared.auth),
            self.config.limits.clone(),
        )?;
        let addr = web.local_addr();
        self.web = Some(web);
        info!(name = %self.name(), %addr, "server started");
        Ok(addr)
    }

    /// Stops serving. Blocked `/update` requests are answered with 404.
    pub fn stop(&mut self) {
        let Some(mut web) = self.web.take() else {
            return;
        };
        self.shared.revisions.stop();
        web.stop();
        info!(name = %self.name(), "server stopped");
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.web.is_some()
    }

    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.web.as_ref().map(WebServer::local_addr)
    }

    /// The live library.
    ///
    /// Release the guard before calling [`commit`](Self::commit).
    pub fn library(&self) -> MutexGuard<'_, Library> {
        self.shared
            .library
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes the live library as a new revision and wakes every
    /// `/update` waiter.
    pub fn commit(&self) -> Result<Revision, ServerError> {
        let library = self.library();
        let revision = self.shared.revisions.commit(&library)?;
        drop(library);
        info!(%revision, "library committed");
        Ok(revision)
    }

    /// The latest published revision.
    #[must_use]
    pub fn revision(&self) -> Revision {
        self.shared.revisions.current()
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.shared
            .name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Renames the share; the authentication realm follows.
    pub fn set_name(&self, name: impl Into<String>) {
        let name = name.into();
        self.shared.auth.set_realm(name.clone());
        *self
            .shared
            .name
            .write()
            .unwrap_or_else(PoisonError::into_inner) = name;
    }

    #[must_use]
    pub fn auth_method(&self) -> AuthMethod {
        self.shared.auth.method()
    }

    pub fn set_auth_method(&self, method: AuthMethod) {
        self.shared.auth.set_method(method);
    }

    pub fn add_credential(&self, credential: Credential) {
        self.shared.auth.add_credential(credential);
    }

    pub fn remove_credential(&self, credential: &Credential) -> bool {
        self.shared.auth.remove_credential(credential)
    }

    pub fn clear_credentials(&self) {
        self.shared.auth.clear_credentials();
    }

    #[must_use]
    pub fn credentials(&self) -> Vec<Credential> {
        self.shared.auth.credentials()
    }

    /// Logged-in sessions.
    #[must_use]
    pub fn sessions(&self) -> Vec<Session> {
        self.shared.sessions.sessions()
    }

    #[must_use]
    pub fn content_codes(&self) -> &ContentCodeBag {
        &self.shared.bag
    }

    /// What to announce for this share; `None` until the server is bound.
    #[must_use]
    pub fn advertisement(&self) -> Option<Advertisement> {
        let port = self.local_addr()?.port();
        Some(Advertisement::new(
            &self.name(),
            port,
            self.auth_method().is_required(),
            self.shared.machine_id.as_deref(),
        ))
    }

    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    #[must_use]
    pub const fn limits(&self) -> &TransportLimits {
        &self.config.limits
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}

struct DaapHandler {
    shared: Arc<Shared>,
}

impl Handler for DaapHandler {
    fn handle(&self, request: &Request, response: &mut ResponseWriter<'_>) -> TransportResult<Flow> {
        match self.dispatch(request, response) {
            Ok(flow) => Ok(flow),
            Err(RequestError::Transport(err)) => Err(err),
            Err(err) => {
                debug!(path = %request.path, status = err.status().code(), error = %err, "request failed");
                response.text(err.status(), &err.to_string())?;
                Ok(Flow::KeepAlive)
            }
        }
    }
}

impl DaapHandler {
    fn dispatch(
        &self,
        request: &Request,
        response: &mut ResponseWriter<'_>,
    ) -> Result<Flow, RequestError> {
        let query = &request.query;
        let session = query.get_i32("session-id").unwrap_or(0);
        let route = Route::parse(&request.path);
        if route.map_or(true, Route::requires_session) {
            self.shared.sessions.touch(session)?;
        }
        let route = route.ok_or(RequestError::UnknownPath)?;
        let revision = Revision::new(query.get_i32("revision-number").unwrap_or(0));
        let delta = query.get_i32("delta").unwrap_or(0);

        match route {
            Route::ServerInfo => self.send(response, &self.server_info())?,
            Route::ContentCodes => self.send(response, &self.shared.bag.to_node())?,
            Route::Login => return self.login(request, response),
            Route::Logout => {
                if let Some(ended) = self.shared.sessions.logout(session) {
                    info!(session = ended.id, user = ?ended.user, address = %ended.address, "user logged out");
                }
                response.empty(Status::Ok)?;
                return Ok(Flow::Close);
            }
            Route::Update => {
                let hold = self.shared.sessions.hold(session);
                let current = self.shared.revisions.wait_for_change(revision)?;
                drop(hold);
                self.send(response, &update_node(current))?;
            }
            Route::Databases => {
                let node = match self.shared.revisions.snapshot(Revision::default()) {
                    Some(snapshot) => databases_node(snapshot.databases()),
                    None => databases_node(&[]),
                };
                self.send(response, &node)?;
            }
            Route::Items { db } => {
                let snapshot = self.snapshot(revision)?;
                let current = snapshot.database(db).ok_or(RequestError::InvalidDatabase)?;
                let deleted = self.shared.revisions.baseline(revision, delta).map(|baseline| {
                    baseline
                        .database(db)
                        .map_or_else(Vec::new, |base| removed_tracks(base, current))
                });
                let meta = query.get("meta").map(parse_meta);
                let node = match &meta {
                    Some(fields) => tracks_node(current, fields.as_slice(), deleted.as_deref()),
                    None => tracks_node(current, DEFAULT_META, deleted.as_deref()),
                };
                self.send(response, &node)?;
            }
            Route::Containers { db } => {
                let snapshot = self.snapshot(revision)?;
                let current = snapshot.database(db).ok_or(RequestError::InvalidDatabase)?;
                self.send(response, &playlists_node(current))?;
            }
            Route::ContainerItems { db, playlist } => {
                let snapshot = self.snapshot(revision)?;
                let current = snapshot.database(db).ok_or(RequestError::InvalidDatabase)?;
                let current_playlist = current
                    .playlist(playlist)
                    .ok_or(RequestError::InvalidPlaylist)?;
                let deleted = self.shared.revisions.baseline(revision, delta).map(|baseline| {
                    baseline
                        .database(db)
                        .and_then(|base| base.playlist(playlist))
                        .map_or_else(Vec::new, |base| removed_entries(base, current_playlist))
                });
                let node = playlist_tracks_node(current, current_playlist, deleted.as_deref());
                self.send(response, &node)?;
            }
            Route::Track { db, track } => {
                let snapshot = self.snapshot(revision)?;
                let database = snapshot.database(db).ok_or(RequestError::InvalidDatabase)?;
                let track = database.track(track).ok_or(RequestError::InvalidTrack)?;
                info!(
                    user = ?request.credentials.as_ref().map(|c| c.username.as_str()),
                    address = %response.peer().ip(),
                    database = %db,
                    track = %track.id(),
                    "track requested"
                );
                let path = track.file.as_ref().ok_or(RequestError::NoFile)?;
                let mut file = File::open(path).map_err(RequestError::File)?;
                let len = file.metadata().map_err(RequestError::File)?.len();
                let sent = response.stream(&mut file, len, request.range_offset)?;
                debug!(track = %track.id(), sent, "track stream finished");
                return Ok(Flow::Close);
            }
        }
        Ok(Flow::KeepAlive)
    }

    fn login(
        &self,
        request: &Request,
        response: &mut ResponseWriter<'_>,
    ) -> Result<Flow, RequestError> {
        let user = request.credentials.as_ref().map(|c| c.username.clone());
        let session = self.shared.sessions.login(user, response.peer().ip())?;
        self.send(response, &login_node(session.id))?;
        info!(session = session.id, user = ?session.user, address = %session.address, "user logged in");
        Ok(Flow::KeepAlive)
    }

    fn snapshot(&self, revision: Revision) -> Result<Arc<Snapshot>, RequestError> {
        self.shared
            .revisions
            .snapshot_or_current(revision)
            .ok_or(RequestError::InvalidDatabase)
    }

    fn server_info(&self) -> ContentNode {
        let name = self
            .shared
            .name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let database_count = self
            .shared
            .revisions
            .snapshot(Revision::default())
            .map_or(0, |snapshot| snapshot.databases().len());
        server_info_node(
            &name,
            self.shared.auth.method(),
            self.shared.sessions.timeout(),
            database_count,
        )
    }

    fn send(&self, response: &mut ResponseWriter<'_>, node: &ContentNode) -> Result<(), RequestError> {
        let body = wire::encode(&self.shared.bag, node)?;
        response.dmap(&body)?;
        Ok(())
    }
}
