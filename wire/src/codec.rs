//! Encoding and decoding of DMAP node trees.
//!
//! Every node is framed as a 4-byte code, a 4-byte big-endian payload
//! length, then the payload. Container payloads are a run of sibling nodes.

use chrono::DateTime;

use crate::bag::ContentCodeBag;
use crate::code::{CodeNumber, ContentCode, ContentType};
use crate::error::{DecodeError, EncodeError, LimitKind, WireResult};
use crate::limits::Limits;
use crate::node::{ContentNode, ContentValue, Version};
use crate::reader::ByteReader;

/// Size of the code + length prefix on every node.
pub const NODE_HEADER_SIZE: usize = 8;

/// Decodes exactly one top-level node.
///
/// Trailing bytes after the node are rejected.
pub fn decode(bag: &ContentCodeBag, bytes: &[u8], limits: &Limits) -> WireResult<ContentNode> {
    let mut nodes = Decoder::new(bag, limits).decode_all(bytes)?;
    match nodes.len() {
        0 => Err(DecodeError::Empty),
        1 => Ok(nodes.remove(0)),
        _ => {
            let first_len = encoded_len(&nodes[0]);
            Err(DecodeError::TrailingData {
                remaining: bytes.len().saturating_sub(first_len),
            })
        }
    }
}

/// Decodes a run of sibling nodes.
pub fn decode_nodes(
    bag: &ContentCodeBag,
    bytes: &[u8],
    limits: &Limits,
) -> WireResult<Vec<ContentNode>> {
    Decoder::new(bag, limits).decode_all(bytes)
}

struct Decoder<'a> {
    bag: &'a ContentCodeBag,
    limits: &'a Limits,
    nodes: usize,
}

impl<'a> Decoder<'a> {
    const fn new(bag: &'a ContentCodeBag, limits: &'a Limits) -> Self {
        Self {
            bag,
            limits,
            nodes: 0,
        }
    }

    fn decode_all(&mut self, bytes: &[u8]) -> WireResult<Vec<ContentNode>> {
        if bytes.len() > self.limits.max_message_bytes {
            return Err(DecodeError::LimitsExceeded {
                kind: LimitKind::MessageBytes,
                limit: self.limits.max_message_bytes,
                actual: bytes.len(),
            });
        }
        self.read_siblings(bytes, 0)
    }

    fn read_siblings(&mut self, bytes: &[u8], depth: usize) -> WireResult<Vec<ContentNode>> {
        let mut reader = ByteReader::new(bytes);
        let mut nodes = Vec::new();
        while !reader.is_empty() {
            nodes.push(self.read_node(&mut reader, depth)?);
        }
        Ok(nodes)
    }

    fn read_node(&mut self, reader: &mut ByteReader<'_>, depth: usize) -> WireResult<ContentNode> {
        let code = CodeNumber::new(reader.read_u32()?);
        let len = usize::try_from(reader.read_u32()?).unwrap_or(usize::MAX);
        let payload = reader.read_slice(len)?;

        self.nodes += 1;
        if self.nodes > self.limits.max_nodes {
            return Err(DecodeError::LimitsExceeded {
                kind: LimitKind::NodeCount,
                limit: self.limits.max_nodes,
                actual: self.nodes,
            });
        }

        let Some(content_code) = self.bag.lookup_number(code) else {
            return Ok(ContentNode {
                name: code.to_string(),
                value: ContentValue::Unknown {
                    code,
                    bytes: payload.to_vec(),
                },
            });
        };

        let value = match content_code.content_type {
            ContentType::Container => {
                let child_depth = depth + 1;
                if child_depth > self.limits.max_depth {
                    return Err(DecodeError::LimitsExceeded {
                        kind: LimitKind::Depth,
                        limit: self.limits.max_depth,
                        actual: child_depth,
                    });
                }
                ContentValue::Container(self.read_siblings(payload, child_depth)?)
            }
            _ => decode_scalar(content_code, payload)?,
        };
        Ok(ContentNode {
            name: content_code.name.clone(),
            value,
        })
    }
}

fn decode_scalar(code: &ContentCode, payload: &[u8]) -> WireResult<ContentValue> {
    if let Some(expected) = code.content_type.fixed_width() {
        if payload.len() != expected {
            return Err(DecodeError::InvalidScalarLength {
                code: code.number,
                content_type: code.content_type,
                expected,
                actual: payload.len(),
            });
        }
    }
    let mut reader = ByteReader::new(payload);
    let value = match code.content_type {
        ContentType::Byte => ContentValue::Byte(reader.read_array::<1>()?[0]),
        ContentType::SignedByte => {
            ContentValue::SignedByte(i8::from_be_bytes(reader.read_array::<1>()?))
        }
        ContentType::Short => ContentValue::Short(i16::from_be_bytes(reader.read_array()?)),
        ContentType::Int => ContentValue::Int(i32::from_be_bytes(reader.read_array()?)),
        ContentType::Long => ContentValue::Long(i64::from_be_bytes(reader.read_array()?)),
        ContentType::String => ContentValue::String(
            String::from_utf8(payload.to_vec())
                .map_err(|_| DecodeError::InvalidUtf8 { code: code.number })?,
        ),
        ContentType::Date => {
            let secs = i32::from_be_bytes(reader.read_array()?);
            // every i32 second count is representable
            let date = DateTime::from_timestamp(i64::from(secs), 0).unwrap_or_default();
            ContentValue::Date(date)
        }
        ContentType::Version => ContentValue::Version(Version::from_bytes(reader.read_array()?)),
        ContentType::Container => ContentValue::Container(Vec::new()),
    };
    Ok(value)
}

/// Encodes a node tree into a fresh buffer.
pub fn encode(bag: &ContentCodeBag, node: &ContentNode) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::with_capacity(encoded_len(node));
    encode_into(bag, node, &mut out)?;
    Ok(out)
}

/// Appends the encoding of `node` to `out`.
///
/// Container lengths are patched in after their children are written, so
/// they always equal the bytes actually produced.
pub fn encode_into(
    bag: &ContentCodeBag,
    node: &ContentNode,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    let code = resolve_code(bag, node)?;
    out.extend_from_slice(&code.mnemonic());
    let len_pos = out.len();
    out.extend_from_slice(&[0; 4]);
    let start = out.len();

    match &node.value {
        ContentValue::Byte(v) => out.push(*v),
        ContentValue::SignedByte(v) => out.extend_from_slice(&v.to_be_bytes()),
        ContentValue::Short(v) => out.extend_from_slice(&v.to_be_bytes()),
        ContentValue::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
        ContentValue::Long(v) => out.extend_from_slice(&v.to_be_bytes()),
        ContentValue::String(s) => out.extend_from_slice(s.as_bytes()),
        ContentValue::Date(date) => {
            let secs = i32::try_from(date.timestamp()).map_err(|_| EncodeError::DateOutOfRange {
                name: node.name.clone(),
            })?;
            out.extend_from_slice(&secs.to_be_bytes());
        }
        ContentValue::Version(version) => out.extend_from_slice(&version.to_bytes()),
        ContentValue::Container(children) => {
            for child in children {
                encode_into(bag, child, out)?;
            }
        }
        ContentValue::Unknown { bytes, .. } => out.extend_from_slice(bytes),
    }

    let payload_len = out.len() - start;
    let len = u32::try_from(payload_len).map_err(|_| EncodeError::LengthOverflow {
        length: payload_len,
    })?;
    out[len_pos..start].copy_from_slice(&len.to_be_bytes());
    Ok(())
}

fn resolve_code(bag: &ContentCodeBag, node: &ContentNode) -> Result<CodeNumber, EncodeError> {
    let found = match (&node.value, node.value.content_type()) {
        (ContentValue::Unknown { code, .. }, _) => return Ok(*code),
        (_, Some(found)) => found,
        (_, None) => {
            return Err(EncodeError::UnknownName {
                name: node.name.clone(),
            })
        }
    };
    let code = bag
        .lookup_name(&node.name)
        .ok_or_else(|| EncodeError::UnknownName {
            name: node.name.clone(),
        })?;
    if code.content_type != found {
        return Err(EncodeError::TypeMismatch {
            name: node.name.clone(),
            expected: code.content_type,
            found,
        });
    }
    Ok(code.number)
}

/// Exact encoded size of a node, header included.
#[must_use]
pub fn encoded_len(node: &ContentNode) -> usize {
    let payload = match &node.value {
        ContentValue::Byte(_) | ContentValue::SignedByte(_) => 1,
        ContentValue::Short(_) => 2,
        ContentValue::Int(_) | ContentValue::Date(_) | ContentValue::Version(_) => 4,
        ContentValue::Long(_) => 8,
        ContentValue::String(s) => s.len(),
        ContentValue::Container(children) => children.iter().map(encoded_len).sum(),
        ContentValue::Unknown { bytes, .. } => bytes.len(),
    };
    NODE_HEADER_SIZE + payload
}
