//! Content codes: the 4-byte tag, its dotted name, and its value type.

use std::fmt;

/// A 4-byte content code as it appears on the wire.
///
/// Codes are 4-character ASCII mnemonics (`miid`, `mlcl`) read as a
/// big-endian integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CodeNumber(u32);

impl CodeNumber {
    /// Creates a code from its raw big-endian value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Creates a code from its 4-character mnemonic.
    #[must_use]
    pub const fn from_mnemonic(mnemonic: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(mnemonic))
    }

    /// Parses a mnemonic string, returning `None` unless it is exactly 4 bytes.
    #[must_use]
    pub fn parse(mnemonic: &str) -> Option<Self> {
        let bytes: [u8; 4] = mnemonic.as_bytes().try_into().ok()?;
        Some(Self::from_mnemonic(bytes))
    }

    /// Reinterprets a signed `dmap.contentcodesnumber` value.
    #[must_use]
    pub const fn from_wire(value: i32) -> Self {
        Self(u32::from_be_bytes(value.to_be_bytes()))
    }

    /// Returns the value carried in `dmap.contentcodesnumber`.
    #[must_use]
    pub const fn to_wire(self) -> i32 {
        i32::from_be_bytes(self.0.to_be_bytes())
    }

    /// Returns the raw code value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the 4 mnemonic bytes.
    #[must_use]
    pub const fn mnemonic(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for CodeNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.mnemonic();
        if bytes.iter().all(u8::is_ascii_graphic) {
            bytes.iter().try_for_each(|b| write!(f, "{}", char::from(*b)))
        } else {
            write!(f, "0x{:08X}", self.0)
        }
    }
}

impl From<[u8; 4]> for CodeNumber {
    fn from(mnemonic: [u8; 4]) -> Self {
        Self::from_mnemonic(mnemonic)
    }
}

/// The declared value type of a content code.
///
/// Discriminants are the numbers carried in `dmap.contentcodestype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i16)]
pub enum ContentType {
    Byte = 1,
    SignedByte = 2,
    Short = 3,
    Int = 5,
    Long = 7,
    String = 9,
    Date = 10,
    Version = 11,
    Container = 12,
}

impl ContentType {
    /// Maps a `dmap.contentcodestype` value back to a type.
    #[must_use]
    pub const fn from_wire(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Byte),
            2 => Some(Self::SignedByte),
            3 => Some(Self::Short),
            5 => Some(Self::Int),
            7 => Some(Self::Long),
            9 => Some(Self::String),
            10 => Some(Self::Date),
            11 => Some(Self::Version),
            12 => Some(Self::Container),
            _ => None,
        }
    }

    /// Returns the value carried in `dmap.contentcodestype`.
    #[must_use]
    pub const fn to_wire(self) -> i16 {
        self as i16
    }

    /// Payload width for fixed-size scalars.
    #[must_use]
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Byte | Self::SignedByte => Some(1),
            Self::Short => Some(2),
            Self::Int | Self::Date | Self::Version => Some(4),
            Self::Long => Some(8),
            Self::String | Self::Container => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Byte => "byte",
            Self::SignedByte => "signed byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::String => "string",
            Self::Date => "date",
            Self::Version => "version",
            Self::Container => "container",
        };
        f.write_str(name)
    }
}

/// One entry of a [`ContentCodeBag`](crate::ContentCodeBag).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentCode {
    pub number: CodeNumber,
    pub name: String,
    pub content_type: ContentType,
}

impl ContentCode {
    pub fn new(
        number: impl Into<CodeNumber>,
        name: impl Into<String>,
        content_type: ContentType,
    ) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            content_type,
        }
    }
}
