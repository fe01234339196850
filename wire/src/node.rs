//! The decoded node tree.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::code::{CodeNumber, ContentType};

/// A packed protocol version: 16-bit major, 8-bit minor and patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Version {
    pub major: u16,
    pub minor: u8,
    pub patch: u8,
}

impl Version {
    #[must_use]
    pub const fn new(major: u16, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Unpacks the 4-byte wire form.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            major: u16::from_be_bytes([bytes[0], bytes[1]]),
            minor: bytes[2],
            patch: bytes[3],
        }
    }

    /// Packs into the 4-byte wire form.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 4] {
        let major = self.major.to_be_bytes();
        [major[0], major[1], self.minor, self.patch]
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A node value, one variant per content type.
///
/// The variant is fixed when the node is built (or decoded from the type the
/// bag declares); the encoder checks it against the code's registered type
/// instead of guessing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ContentValue {
    Byte(u8),
    SignedByte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    String(String),
    Date(DateTime<Utc>),
    Version(Version),
    Container(Vec<ContentNode>),
    /// A code the bag did not know, kept verbatim.
    Unknown { code: CodeNumber, bytes: Vec<u8> },
}

impl ContentValue {
    /// The content type this value encodes as, `None` for unknown codes.
    #[must_use]
    pub const fn content_type(&self) -> Option<ContentType> {
        Some(match self {
            Self::Byte(_) => ContentType::Byte,
            Self::SignedByte(_) => ContentType::SignedByte,
            Self::Short(_) => ContentType::Short,
            Self::Int(_) => ContentType::Int,
            Self::Long(_) => ContentType::Long,
            Self::String(_) => ContentType::String,
            Self::Date(_) => ContentType::Date,
            Self::Version(_) => ContentType::Version,
            Self::Container(_) => ContentType::Container,
            Self::Unknown { .. } => return None,
        })
    }
}

impl From<u8> for ContentValue {
    fn from(value: u8) -> Self {
        Self::Byte(value)
    }
}

impl From<i8> for ContentValue {
    fn from(value: i8) -> Self {
        Self::SignedByte(value)
    }
}

impl From<i16> for ContentValue {
    fn from(value: i16) -> Self {
        Self::Short(value)
    }
}

impl From<i32> for ContentValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for ContentValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<bool> for ContentValue {
    fn from(value: bool) -> Self {
        Self::Byte(u8::from(value))
    }
}

impl From<&str> for ContentValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for ContentValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<DateTime<Utc>> for ContentValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

impl From<Version> for ContentValue {
    fn from(value: Version) -> Self {
        Self::Version(value)
    }
}

impl From<Vec<ContentNode>> for ContentValue {
    fn from(children: Vec<ContentNode>) -> Self {
        Self::Container(children)
    }
}

/// A named, typed value in a DMAP message.
///
/// Child order inside containers is preserved exactly; several clients
/// depend on it (`dmap.itemkind` must lead a listing item, for instance).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ContentNode {
    pub name: String,
    pub value: ContentValue,
}

impl ContentNode {
    pub fn new(name: impl Into<String>, value: impl Into<ContentValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Builds a container node.
    pub fn container(name: impl Into<String>, children: Vec<Self>) -> Self {
        Self {
            name: name.into(),
            value: ContentValue::Container(children),
        }
    }

    /// Returns `true` for container nodes.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(self.value, ContentValue::Container(_))
    }

    /// Children of a container; empty for scalars.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match &self.value {
            ContentValue::Container(children) => children,
            _ => &[],
        }
    }

    /// First direct child with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children().iter().find(|child| child.name == name)
    }

    /// First node with the given name, searching depth-first (self included).
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Self> {
        if self.name == name {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(name))
    }

    /// Any integer variant widened to `i64`.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self.value {
            ContentValue::Byte(v) => Some(i64::from(v)),
            ContentValue::SignedByte(v) => Some(i64::from(v)),
            ContentValue::Short(v) => Some(i64::from(v)),
            ContentValue::Int(v) => Some(i64::from(v)),
            ContentValue::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Any integer variant that fits an `i32`.
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        self.as_integer().and_then(|v| i32::try_from(v).ok())
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            ContentValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_date(&self) -> Option<DateTime<Utc>> {
        match self.value {
            ContentValue::Date(date) => Some(date),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_version(&self) -> Option<Version> {
        match self.value {
            ContentValue::Version(version) => Some(version),
            _ => None,
        }
    }

    /// Integer value of the first direct child with `name`.
    #[must_use]
    pub fn child_i32(&self, name: &str) -> Option<i32> {
        self.child(name).and_then(Self::as_i32)
    }

    /// String value of the first direct child with `name`.
    #[must_use]
    pub fn child_str(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Self::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> ContentNode {
        ContentNode::container(
            "daap.databasesongs",
            vec![
                ContentNode::new("dmap.status", 200),
                ContentNode::container(
                    "dmap.listing",
                    vec![ContentNode::container(
                        "dmap.listingitem",
                        vec![
                            ContentNode::new("dmap.itemkind", 2u8),
                            ContentNode::new("dmap.itemid", 7),
                            ContentNode::new("dmap.itemname", "Song"),
                        ],
                    )],
                ),
            ],
        )
    }

    #[test]
    fn version_packs_major_minor_patch() {
        let version = Version::new(3, 0, 2);
        assert_eq!(version.to_bytes(), [0, 3, 0, 2]);
        assert_eq!(Version::from_bytes([0, 3, 0, 2]), version);
        assert_eq!(version.to_string(), "3.0.2");
    }

    #[test]
    fn child_and_find() {
        let node = listing();
        assert_eq!(node.child_i32("dmap.status"), Some(200));
        assert!(node.child("dmap.itemid").is_none());

        let item = node.find("dmap.listingitem").unwrap();
        assert_eq!(item.child_str("dmap.itemname"), Some("Song"));
        assert_eq!(node.find("dmap.itemid").and_then(ContentNode::as_i32), Some(7));
    }

    #[test]
    fn integer_accessors_widen() {
        assert_eq!(ContentNode::new("x", 2u8).as_i32(), Some(2));
        assert_eq!(ContentNode::new("x", -3i8).as_i32(), Some(-3));
        assert_eq!(ContentNode::new("x", i64::MAX).as_i32(), None);
        assert_eq!(ContentNode::new("x", "s").as_integer(), None);
    }

    #[test]
    fn scalars_have_no_children() {
        let node = ContentNode::new("dmap.status", 200);
        assert!(!node.is_container());
        assert!(node.children().is_empty());
    }

    #[test]
    fn value_types() {
        assert_eq!(ContentValue::from(true).content_type(), Some(ContentType::Byte));
        assert_eq!(ContentValue::from(1i64).content_type(), Some(ContentType::Long));
        let unknown = ContentValue::Unknown {
            code: CodeNumber::from_mnemonic(*b"zzzz"),
            bytes: vec![1],
        };
        assert_eq!(unknown.content_type(), None);
    }
}
