//! Request parsing.

use std::io::{BufRead, Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{TransportError, TransportResult};
use crate::limits::TransportLimits;
use crate::query::Query;

/// Username and password from an `Authorization: Basic` header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Decodes the base64 `user:password` token that follows `Basic `.
    pub fn decode(token: &str) -> TransportResult<Self> {
        let bytes = STANDARD
            .decode(token.trim())
            .map_err(|_| TransportError::InvalidAuthorization)?;
        let text = String::from_utf8(bytes).map_err(|_| TransportError::InvalidAuthorization)?;
        let (username, password) = text
            .split_once(':')
            .ok_or(TransportError::InvalidAuthorization)?;
        Ok(Self::new(username, password))
    }

    /// The full header value, `Basic <token>`.
    #[must_use]
    pub fn header_value(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

/// One parsed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    /// Absolute path without the query, e.g. `/databases/1/items`.
    pub path: String,
    pub query: Query,
    /// Start offset from `Range: bytes=<offset>-`.
    pub range_offset: Option<u64>,
    pub credentials: Option<BasicCredentials>,
    /// An `Authorization: Basic` token was present but could not be decoded.
    /// `credentials` stays `None`, so the login gate rejects it.
    pub bad_authorization: bool,
    /// The peer sent `Connection: close`.
    pub connection_close: bool,
}

impl Request {
    /// A `GET` for `path` with no headers set.
    pub fn get(path: impl Into<String>, query: Query) -> Self {
        Self {
            method: "GET".to_owned(),
            path: path.into(),
            query,
            range_offset: None,
            credentials: None,
            bad_authorization: false,
            connection_close: false,
        }
    }

    /// Path and query as sent on the request line.
    #[must_use]
    pub fn target(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }

    /// Writes the request the way a client sends it.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W, host: &str) -> TransportResult<()> {
        write!(writer, "{} {} HTTP/1.1\r\nHost: {host}\r\n", self.method, self.target())?;
        if let Some(credentials) = &self.credentials {
            write!(writer, "Authorization: {}\r\n", credentials.header_value())?;
        }
        if let Some(offset) = self.range_offset {
            write!(writer, "Range: bytes={offset}-\r\n")?;
        }
        if self.connection_close {
            writer.write_all(b"Connection: close\r\n")?;
        }
        writer.write_all(b"\r\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Reads one line without its terminator. `None` at end of stream.
pub(crate) fn read_line<R: BufRead>(reader: &mut R, limit: usize) -> TransportResult<Option<String>> {
    let mut buf = Vec::new();
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let read = reader.by_ref().take(cap).read_until(b'\n', &mut buf)?;
    if read == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') && buf.len() > limit {
        return Err(TransportError::LineTooLong { limit });
    }
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    String::from_utf8(buf)
        .map(Some)
        .map_err(|_| TransportError::InvalidUtf8)
}

/// Splits a request target into path and query, dropping any
/// `scheme://authority` prefix.
fn split_target(target: &str) -> (String, Query) {
    let target = match target.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("/", |idx| &rest[idx..]),
        None => target,
    };
    match target.split_once('?') {
        Some((path, query)) => (path.to_owned(), Query::parse(query)),
        None => (target.to_owned(), Query::new()),
    }
}

/// Parses `bytes=<offset>-`. Other range forms are ignored.
fn parse_range(value: &str) -> Option<u64> {
    let spec = value.trim().strip_prefix("bytes=")?;
    spec.strip_suffix('-')?.trim().parse().ok()
}

/// Reads the next request from a connection.
///
/// Returns `Ok(None)` when the peer closed the connection between requests.
/// Headers other than `Authorization`, `Range` and `Connection` are skipped.
pub fn read_request<R: BufRead>(
    reader: &mut R,
    limits: &TransportLimits,
) -> TransportResult<Option<Request>> {
    let line = loop {
        match read_line(reader, limits.max_line_bytes)? {
            None => return Ok(None),
            Some(line) if line.trim().is_empty() => {}
            Some(line) => break line,
        }
    };

    let mut parts = line.split_whitespace();
    let (Some(method), Some(target), Some(_version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(TransportError::MalformedRequestLine { line });
    };
    let (path, query) = split_target(target);
    let mut request = Request {
        method: method.to_owned(),
        path,
        query,
        range_offset: None,
        credentials: None,
        bad_authorization: false,
        connection_close: false,
    };

    let mut headers = 0usize;
    while let Some(header) = read_line(reader, limits.max_line_bytes)? {
        if header.is_empty() {
            break;
        }
        headers += 1;
        if headers > limits.max_headers {
            return Err(TransportError::TooManyHeaders {
                limit: limits.max_headers,
            });
        }
        let Some((name, value)) = header.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("authorization") {
            if let Some(token) = value.strip_prefix("Basic ") {
                match BasicCredentials::decode(token) {
                    Ok(credentials) => {
                        request.credentials = Some(credentials);
                        request.bad_authorization = false;
                    }
                    Err(_) => {
                        request.credentials = None;
                        request.bad_authorization = true;
                    }
                }
            }
        } else if name.eq_ignore_ascii_case("range") {
            request.range_offset = parse_range(value);
        } else if name.eq_ignore_ascii_case("connection") {
            request.connection_close = value.eq_ignore_ascii_case("close");
        }
    }

    Ok(Some(request))
}
