//! Response writing and, for clients, response reading.

use std::fmt;
use std::io::{BufRead, Read, Seek, SeekFrom, Write};

use crate::error::{TransportError, TransportResult};
use crate::limits::TransportLimits;
use crate::request::read_line;

/// Copy buffer size for streamed bodies.
pub const CHUNK_LEN: usize = 8192;

const SERVER_HEADER: &str = "DAAP-Server: dmap";

/// Response statuses the protocol uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    PartialContent,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    RangeNotSatisfiable,
    InternalServerError,
    ServiceUnavailable,
}

impl Status {
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::PartialContent => 206,
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::RangeNotSatisfiable => 416,
            Self::InternalServerError => 500,
            Self::ServiceUnavailable => 503,
        }
    }

    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::PartialContent => "Partial Content",
            Self::BadRequest => "Bad Request",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::RangeNotSatisfiable => "Range Not Satisfiable",
            Self::InternalServerError => "Internal Server Error",
            Self::ServiceUnavailable => "Service Unavailable",
        }
    }

    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            200 => Self::Ok,
            206 => Self::PartialContent,
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            416 => Self::RangeNotSatisfiable,
            500 => Self::InternalServerError,
            503 => Self::ServiceUnavailable,
            _ => return None,
        })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

fn write_head<W: Write + ?Sized>(
    writer: &mut W,
    status: Status,
    headers: &[(&str, &str)],
    content_length: u64,
) -> TransportResult<()> {
    let mut head = format!("HTTP/1.1 {status}\r\n{SERVER_HEADER}\r\n");
    for (name, value) in headers {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    head.push_str(&format!("Content-Length: {content_length}\r\n\r\n"));
    writer.write_all(head.as_bytes())?;
    Ok(())
}

/// Writes a response with an in-memory body.
pub fn write_body<W: Write + ?Sized>(
    writer: &mut W,
    status: Status,
    content_type: &str,
    body: &[u8],
) -> TransportResult<()> {
    let len = u64::try_from(body.len()).unwrap_or(u64::MAX);
    write_head(writer, status, &[("Content-Type", content_type)], len)?;
    writer.write_all(body)?;
    Ok(())
}

/// Writes an encoded DMAP message with status 200.
pub fn write_dmap<W: Write + ?Sized>(writer: &mut W, body: &[u8]) -> TransportResult<()> {
    write_body(writer, Status::Ok, wire::CONTENT_TYPE, body)
}

/// Writes a plain-text response, used for error messages.
pub fn write_text<W: Write + ?Sized>(
    writer: &mut W,
    status: Status,
    message: &str,
) -> TransportResult<()> {
    write_body(writer, status, "text/plain", message.as_bytes())
}

/// Writes a response with no body.
pub fn write_empty<W: Write + ?Sized>(writer: &mut W, status: Status) -> TransportResult<()> {
    write_head(writer, status, &[], 0)
}

/// Writes a 401 with a Basic challenge for `realm`.
pub fn write_access_denied<W: Write + ?Sized>(writer: &mut W, realm: &str) -> TransportResult<()> {
    let message = "Authorization Required";
    let challenge = format!("Basic realm=\"{realm}\"");
    write_head(
        writer,
        Status::Unauthorized,
        &[("WWW-Authenticate", &challenge), ("Content-Type", "text/plain")],
        message.len() as u64,
    )?;
    writer.write_all(message.as_bytes())?;
    Ok(())
}

/// Streams `len` bytes of `body`, resuming at `offset` when one is given.
///
/// A non-zero offset inside the body yields 206 with `Content-Range`; an
/// offset at or past the end yields 416 and no body. The copy stops early
/// if the body runs short. Returns the number of body bytes written.
pub fn write_stream<W, R>(
    writer: &mut W,
    body: &mut R,
    len: u64,
    offset: Option<u64>,
) -> TransportResult<u64>
where
    W: Write + ?Sized,
    R: Read + Seek + ?Sized,
{
    let remaining = match offset {
        Some(offset) if offset > 0 => {
            if offset >= len {
                let range = format!("bytes */{len}");
                write_head(writer, Status::RangeNotSatisfiable, &[("Content-Range", &range)], 0)?;
                return Ok(0);
            }
            body.seek(SeekFrom::Start(offset))?;
            let range = format!("bytes {offset}-{}/{len}", len - 1);
            let remaining = len - offset;
            write_head(
                writer,
                Status::PartialContent,
                &[("Content-Range", &range), ("Accept-Ranges", "bytes")],
                remaining,
            )?;
            remaining
        }
        _ => {
            write_head(writer, Status::Ok, &[("Accept-Ranges", "bytes")], len)?;
            len
        }
    };

    let mut buf = [0u8; CHUNK_LEN];
    let mut written = 0u64;
    while written < remaining {
        let want = usize::try_from(remaining - written).map_or(CHUNK_LEN, |left| left.min(CHUNK_LEN));
        let read = match body.read(&mut buf[..want]) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        writer.write_all(&buf[..read])?;
        written += read as u64;
    }
    Ok(written)
}

/// Status line and headers of a response, as read by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub code: u16,
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Reads the status line and headers up to the blank line.
    pub fn read<R: BufRead>(reader: &mut R, limits: &TransportLimits) -> TransportResult<Self> {
        let line = read_line(reader, limits.max_line_bytes)?.ok_or(
            TransportError::MalformedResponse {
                reason: "connection closed before status line",
            },
        )?;
        let mut parts = line.split_whitespace();
        let code = match (parts.next(), parts.next()) {
            (Some(version), Some(code)) if version.starts_with("HTTP/") => code.parse().ok(),
            _ => None,
        }
        .ok_or(TransportError::MalformedResponse {
            reason: "invalid status line",
        })?;

        let mut headers = Vec::new();
        while let Some(header) = read_line(reader, limits.max_line_bytes)? {
            if header.is_empty() {
                break;
            }
            if headers.len() >= limits.max_headers {
                return Err(TransportError::TooManyHeaders {
                    limit: limits.max_headers,
                });
            }
            if let Some((name, value)) = header.split_once(':') {
                headers.push((name.trim().to_owned(), value.trim().to_owned()));
            }
        }
        Ok(Self { code, headers })
    }

    #[must_use]
    pub fn status(&self) -> Option<Status> {
        Status::from_code(self.code)
    }

    /// First header named `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")?.parse().ok()
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code >= 200 && self.code < 300
    }

    /// Reads the whole body into memory.
    ///
    /// Without a `Content-Length` the body runs to the end of the stream.
    pub fn read_body<R: Read>(&self, reader: &mut R, limits: &TransportLimits) -> TransportResult<Vec<u8>> {
        match self.content_length() {
            Some(length) => {
                if length > limits.max_body_bytes {
                    return Err(TransportError::BodyTooLarge {
                        length,
                        limit: limits.max_body_bytes,
                    });
                }
                let mut body = Vec::with_capacity(usize::try_from(length).unwrap_or(0));
                reader.take(length).read_to_end(&mut body)?;
                if (body.len() as u64) < length {
                    return Err(TransportError::MalformedResponse {
                        reason: "body shorter than Content-Length",
                    });
                }
                Ok(body)
            }
            None => {
                let mut body = Vec::new();
                reader
                    .take(limits.max_body_bytes.saturating_add(1))
                    .read_to_end(&mut body)?;
                let length = body.len() as u64;
                if length > limits.max_body_bytes {
                    return Err(TransportError::BodyTooLarge {
                        length,
                        limit: limits.max_body_bytes,
                    });
                }
                Ok(body)
            }
        }
    }
}
