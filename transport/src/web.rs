//! Thread-per-connection request loop.

use std::collections::HashMap;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::auth::Authenticator;
use crate::error::{TransportError, TransportResult};
use crate::limits::TransportLimits;
use crate::request::{read_request, Request};
use crate::response::{
    write_access_denied, write_body, write_dmap, write_empty, write_stream, write_text, Status,
};

/// The only path whose requests go through the credential check.
pub const LOGIN_PATH: &str = "/login";

/// How long [`WebServer::stop`] lets in-flight requests finish before
/// shutting their sockets.
pub const STOP_GRACE: Duration = Duration::from_secs(2);

/// Whether a connection should serve another request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    KeepAlive,
    Close,
}

/// Application logic behind a [`WebServer`].
///
/// Called on the connection's own thread, so it may block (for example
/// while waiting for a new revision).
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: &Request, response: &mut ResponseWriter<'_>) -> TransportResult<Flow>;
}

/// Writes responses to one connection.
pub struct ResponseWriter<'a> {
    out: &'a mut dyn Write,
    peer: SocketAddr,
}

impl<'a> ResponseWriter<'a> {
    pub fn new(out: &'a mut dyn Write, peer: SocketAddr) -> Self {
        Self { out, peer }
    }

    #[must_use]
    pub const fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// An encoded DMAP message with status 200.
    pub fn dmap(&mut self, body: &[u8]) -> TransportResult<()> {
        write_dmap(&mut *self.out, body)
    }

    pub fn body(&mut self, status: Status, content_type: &str, body: &[u8]) -> TransportResult<()> {
        write_body(&mut *self.out, status, content_type, body)
    }

    pub fn text(&mut self, status: Status, message: &str) -> TransportResult<()> {
        write_text(&mut *self.out, status, message)
    }

    pub fn empty(&mut self, status: Status) -> TransportResult<()> {
        write_empty(&mut *self.out, status)
    }

    pub fn access_denied(&mut self, realm: &str) -> TransportResult<()> {
        write_access_denied(&mut *self.out, realm)
    }

    /// Streams a body; see [`write_stream`].
    pub fn stream<R: Read + Seek + ?Sized>(
        &mut self,
        body: &mut R,
        len: u64,
        offset: Option<u64>,
    ) -> TransportResult<u64> {
        write_stream(&mut *self.out, body, len, offset)
    }
}

struct Shared {
    running: AtomicBool,
    next_connection: AtomicU64,
    connections: Mutex<HashMap<u64, TcpStream>>,
    /// Requests between being read and having their response flushed.
    in_flight: Mutex<usize>,
    settled: Condvar,
    auth: Arc<Authenticator>,
    limits: TransportLimits,
}

/// Counts one request as in flight until dropped.
struct InFlight<'a>(&'a Shared);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut count = self.0.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        *count = count.saturating_sub(1);
        drop(count);
        self.0.settled.notify_all();
    }
}

impl Shared {
    fn begin_request(&self) -> InFlight<'_> {
        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        InFlight(self)
    }

    /// Waits until no request is in flight; `false` if `grace` ran out first.
    fn wait_settled(&self, grace: Duration) -> bool {
        let count = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        let (count, _) = self
            .settled
            .wait_timeout_while(count, grace, |count| *count > 0)
            .unwrap_or_else(PoisonError::into_inner);
        *count == 0
    }

    fn register(&self, stream: &TcpStream) -> Option<u64> {
        let clone = stream.try_clone().ok()?;
        let id = self.next_connection.fetch_add(1, Ordering::Relaxed);
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, clone);
        Some(id)
    }

    fn unregister(&self, id: u64) {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

/// A listening socket with one thread per accepted connection.
///
/// Each connection reads requests in a loop, applies the `/login`
/// credential gate, and hands everything else to the [`Handler`]. Dropping
/// the server stops it.
pub struct WebServer {
    local_addr: SocketAddr,
    shared: Arc<Shared>,
    accept_thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for WebServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebServer")
            .field("local_addr", &self.local_addr)
            .field("connections", &self.connection_count())
            .finish_non_exhaustive()
    }
}

impl WebServer {
    /// Starts accepting on `listener`.
    pub fn start<H: Handler>(
        listener: TcpListener,
        handler: Arc<H>,
        auth: Arc<Authenticator>,
        limits: TransportLimits,
    ) -> TransportResult<Self> {
        let local_addr = listener.local_addr()?;
        let shared = Arc::new(Shared {
            running: AtomicBool::new(true),
            next_connection: AtomicU64::new(0),
            connections: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(0),
            settled: Condvar::new(),
            auth,
            limits,
        });

        let accept_shared = Arc::clone(&shared);
        let accept_thread = thread::Builder::new()
            .name("dmap-accept".into())
            .spawn(move || accept_loop(&listener, &accept_shared, &handler))?;

        info!(%local_addr, "web server listening");
        Ok(Self {
            local_addr,
            shared,
            accept_thread: Some(accept_thread),
        })
    }

    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<Authenticator> {
        &self.shared.auth
    }

    /// Connections currently open.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.shared
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Stops accepting and shuts down every open connection.
    ///
    /// Requests already being handled get up to [`STOP_GRACE`] to write
    /// their response. Handlers blocked on something other than their
    /// socket must be woken by their owner first, or their connection is
    /// shut down when the grace period ends.
    pub fn stop(&mut self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        // accept() only notices the flag once a connection arrives
        let _ = TcpStream::connect(wake_addr(self.local_addr));
        if let Some(accept_thread) = self.accept_thread.take() {
            if accept_thread.join().is_err() {
                warn!("accept thread panicked");
            }
        }
        if !self.shared.wait_settled(STOP_GRACE) {
            warn!(local_addr = %self.local_addr, "requests still running at shutdown");
        }
        let connections: Vec<TcpStream> = self
            .shared
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, stream)| stream)
            .collect();
        for stream in connections {
            let _ = stream.shutdown(Shutdown::Both);
        }
        info!(local_addr = %self.local_addr, "web server stopped");
    }
}

impl Drop for WebServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn wake_addr(local: SocketAddr) -> SocketAddr {
    match local.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => SocketAddr::new(Ipv4Addr::LOCALHOST.into(), local.port()),
        IpAddr::V6(ip) if ip.is_unspecified() => SocketAddr::new(Ipv6Addr::LOCALHOST.into(), local.port()),
        _ => local,
    }
}

fn accept_loop<H: Handler>(listener: &TcpListener, shared: &Arc<Shared>, handler: &Arc<H>) {
    for stream in listener.incoming() {
        if !shared.running.load(Ordering::SeqCst) {
            break;
        }
        let stream = match stream {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "accept failed");
                continue;
            }
        };
        let Some(id) = shared.register(&stream) else {
            continue;
        };
        let shared = Arc::clone(shared);
        let handler = Arc::clone(handler);
        let spawned = thread::Builder::new()
            .name("dmap-conn".into())
            .spawn(move || {
                serve_connection(&shared, handler.as_ref(), &stream);
                shared.unregister(id);
                let _ = stream.shutdown(Shutdown::Both);
            });
        if let Err(err) = spawned {
            warn!(error = %err, "failed to spawn connection thread");
        }
    }
}

fn serve_connection<H: Handler>(shared: &Shared, handler: &H, stream: &TcpStream) {
    let peer = match stream.peer_addr() {
        Ok(peer) => peer,
        Err(err) => {
            debug!(error = %err, "connection lost before first request");
            return;
        }
    };
    debug!(%peer, "connection opened");
    if let Err(err) = request_loop(shared, handler, stream, peer) {
        debug!(%peer, error = %err, "connection aborted");
    }
    debug!(%peer, "connection closed");
}

fn request_loop<H: Handler>(
    shared: &Shared,
    handler: &H,
    stream: &TcpStream,
    peer: SocketAddr,
) -> TransportResult<()> {
    let mut reader = BufReader::new(stream);
    let mut writer = BufWriter::new(stream);

    while shared.running.load(Ordering::SeqCst) {
        let request = match read_request(&mut reader, &shared.limits) {
            Ok(Some(request)) => request,
            Ok(None) => return Ok(()),
            Err(err @ TransportError::MalformedRequestLine { .. }) => {
                write_text(&mut writer, Status::BadRequest, "Bad Request")?;
                writer.flush()?;
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        if !shared.running.load(Ordering::SeqCst) {
            return Ok(());
        }
        let _in_flight = shared.begin_request();
        debug!(%peer, method = %request.method, path = %request.path, "request");

        if request.path == LOGIN_PATH && !shared.auth.is_valid(request.credentials.as_ref()) {
            debug!(%peer, undecodable = request.bad_authorization, "login credentials rejected");
            write_access_denied(&mut writer, &shared.auth.realm())?;
            writer.flush()?;
            if request.connection_close {
                return Ok(());
            }
            continue;
        }

        let flow = handler.handle(&request, &mut ResponseWriter::new(&mut writer, peer))?;
        writer.flush()?;
        if flow == Flow::Close || request.connection_close {
            return Ok(());
        }
    }
    Ok(())
}
