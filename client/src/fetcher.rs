//! One connection per request, with every open socket abortable.

use std::collections::HashMap;
use std::io::{self, BufReader, Read};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, trace};
use transport::{BasicCredentials, Query, Request, ResponseHead, TransportError};
use wire::{ContentCodeBag, ContentNode};

use crate::config::ClientConfig;
use crate::error::ClientError;

#[derive(Debug, Default)]
struct OpenState {
    streams: HashMap<u64, TcpStream>,
    next_id: u64,
    aborted: bool,
}

/// Sockets of in-flight requests.
#[derive(Debug, Clone, Default)]
struct OpenStreams {
    state: Arc<Mutex<OpenState>>,
}

impl OpenStreams {
    fn lock(&self) -> MutexGuard<'_, OpenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, stream: &TcpStream) -> io::Result<Registration> {
        let mut state = self.lock();
        if state.aborted {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "requests were aborted",
            ));
        }
        let id = state.next_id;
        state.next_id += 1;
        state.streams.insert(id, stream.try_clone()?);
        Ok(Registration {
            streams: self.clone(),
            id,
        })
    }

    fn abort_all(&self) -> usize {
        let mut state = self.lock();
        state.aborted = true;
        let count = state.streams.len();
        for (_, stream) in state.streams.drain() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        count
    }

    fn reopen(&self) {
        self.lock().aborted = false;
    }
}

/// Removes a socket from [`OpenStreams`] when its request is done.
#[derive(Debug)]
struct Registration {
    streams: OpenStreams,
    id: u64,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.streams.lock().streams.remove(&self.id);
    }
}

/// A streamed response body, typically track audio.
///
/// Reads stop at the length the server announced. Dropping the stream
/// closes its connection.
#[derive(Debug)]
pub struct TrackStream {
    reader: io::Take<BufReader<TcpStream>>,
    length: u64,
    _registration: Registration,
}

impl TrackStream {
    /// Bytes in the body, counted from the requested offset.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.length
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl Read for TrackStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Issues requests to one server.
///
/// The session id, once set, is appended to every request. Credentials are
/// sent with every request as `Authorization: Basic`.
#[derive(Debug)]
pub(crate) struct Fetcher {
    addr: SocketAddr,
    host: String,
    config: ClientConfig,
    credentials: RwLock<Option<BasicCredentials>>,
    session_id: AtomicI32,
    open: OpenStreams,
}

impl Fetcher {
    pub(crate) fn new(addr: SocketAddr, config: ClientConfig) -> Self {
        Self {
            addr,
            host: addr.to_string(),
            config,
            credentials: RwLock::new(None),
            session_id: AtomicI32::new(0),
            open: OpenStreams::default(),
        }
    }

    pub(crate) const fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub(crate) const fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn session_id(&self) -> i32 {
        self.session_id.load(Ordering::Acquire)
    }

    pub(crate) fn set_session_id(&self, id: i32) {
        self.session_id.store(id, Ordering::Release);
    }

    pub(crate) fn set_credentials(&self, credentials: Option<BasicCredentials>) {
        *self
            .credentials
            .write()
            .unwrap_or_else(PoisonError::into_inner) = credentials;
    }

    fn credentials(&self) -> Option<BasicCredentials> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn connect(&self) -> io::Result<TcpStream> {
        let stream = match self.config.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(&self.addr, timeout)?,
            None => TcpStream::connect(self.addr)?,
        };
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn send(
        &self,
        path: &str,
        query: Query,
        range_offset: Option<u64>,
    ) -> Result<(BufReader<TcpStream>, ResponseHead, Registration), ClientError> {
        let stream = self.connect()?;
        let registration = self.open.register(&stream)?;

        let session = self.session_id();
        let query = if session == 0 {
            query
        } else {
            query.with("session-id", session)
        };
        let mut request = Request::get(path, query);
        request.credentials = self.credentials();
        request.range_offset = range_offset;
        request.connection_close = true;
        trace!(target = %request.target(), "sending request");
        request.write_to(&mut &stream, &self.host)?;

        let mut reader = BufReader::new(stream);
        let head = ResponseHead::read(&mut reader, &self.config.limits)?;
        if !head.is_success() {
            debug!(path, code = head.code, "request failed");
            return Err(ClientError::Status {
                path: path.to_owned(),
                code: head.code,
            });
        }
        Ok((reader, head, registration))
    }

    /// Fetches a whole response body.
    pub(crate) fn fetch(&self, path: &str, query: Query) -> Result<Vec<u8>, ClientError> {
        let (mut reader, head, _registration) = self.send(path, query, None)?;
        Ok(head.read_body(&mut reader, &self.config.limits)?)
    }

    /// Fetches and decodes a DMAP response.
    pub(crate) fn fetch_node(
        &self,
        bag: &ContentCodeBag,
        path: &str,
        query: Query,
    ) -> Result<ContentNode, ClientError> {
        let body = self.fetch(path, query)?;
        Ok(wire::decode(bag, &body, &self.config.decode_limits)?)
    }

    /// Starts a streamed download, resuming at `offset` when given.
    pub(crate) fn fetch_stream(
        &self,
        path: &str,
        offset: Option<u64>,
    ) -> Result<TrackStream, ClientError> {
        let (reader, head, registration) = self.send(path, Query::new(), offset)?;
        let length = head
            .content_length()
            .ok_or(TransportError::MalformedResponse {
                reason: "streamed response without Content-Length",
            })?;
        Ok(TrackStream {
            reader: reader.take(length),
            length,
            _registration: registration,
        })
    }

    /// Shuts down every open request and refuses new ones until
    /// [`reopen`](Self::reopen).
    pub(crate) fn abort_all(&self) {
        let aborted = self.open.abort_all();
        debug!(aborted, "aborted open requests");
    }

    pub(crate) fn reopen(&self) {
        self.open.reopen();
    }
}
