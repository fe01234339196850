//! The content code dictionary.

use std::collections::HashMap;

use crate::builtin::{BOOTSTRAP_CODES, BUILTIN_CODES};
use crate::code::{CodeNumber, ContentCode, ContentType};
use crate::codec::decode;
use crate::error::WireResult;
use crate::limits::Limits;
use crate::node::ContentNode;

/// Bidirectional map between wire codes, dotted names, and value types.
///
/// A bag is an ordinary value: build one, then hand a reference to whatever
/// needs to encode or decode. Lookups for unknown codes return `None`.
///
/// Inserting a number that is already present keeps the first entry for
/// number lookups; inserting a name that is already present replaces it for
/// name lookups. The built-in table relies on this for `mlit`, which is both
/// `dmap.listingitem` (a container) and `dmap.listingitemstring`.
#[derive(Debug, Clone, Default)]
pub struct ContentCodeBag {
    codes: Vec<ContentCode>,
    by_number: HashMap<CodeNumber, usize>,
    by_name: HashMap<String, usize>,
}

impl ContentCodeBag {
    /// An empty bag.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Only the codes needed to parse a `dmap.contentcodesresponse`.
    #[must_use]
    pub fn bootstrap() -> Self {
        Self::from_table(BOOTSTRAP_CODES)
    }

    /// The bootstrap codes plus the full built-in table.
    #[must_use]
    pub fn builtin() -> Self {
        let mut bag = Self::bootstrap();
        for &(mnemonic, name, content_type) in BUILTIN_CODES {
            bag.insert(ContentCode::new(mnemonic, name, content_type));
        }
        bag
    }

    fn from_table(table: &[([u8; 4], &str, ContentType)]) -> Self {
        let mut bag = Self::empty();
        for &(mnemonic, name, content_type) in table {
            bag.insert(ContentCode::new(mnemonic, name, content_type));
        }
        bag
    }

    /// Builds a bag from a server's `/content-codes` response.
    ///
    /// The response is decoded with the built-in table, and every
    /// `dmap.dictionary` entry carrying a number, name and known type is
    /// merged on top. Incomplete entries are skipped.
    pub fn parse_codes(bytes: &[u8], limits: &Limits) -> WireResult<Self> {
        let mut bag = Self::builtin();
        let root = decode(&bag, bytes, limits)?;
        for dict in root.children() {
            if dict.name != "dmap.dictionary" {
                continue;
            }
            if let Some(code) = code_from_dictionary(dict) {
                bag.insert(code);
            }
        }
        Ok(bag)
    }

    /// Registers a code.
    pub fn insert(&mut self, code: ContentCode) {
        let index = self.codes.len();
        self.by_number.entry(code.number).or_insert(index);
        self.by_name.insert(code.name.clone(), index);
        self.codes.push(code);
    }

    #[must_use]
    pub fn lookup_number(&self, number: CodeNumber) -> Option<&ContentCode> {
        self.by_number.get(&number).map(|&index| &self.codes[index])
    }

    #[must_use]
    pub fn lookup_name(&self, name: &str) -> Option<&ContentCode> {
        self.by_name.get(name).map(|&index| &self.codes[index])
    }

    /// Number of distinct wire codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_number.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_number.is_empty()
    }

    /// Codes reachable by number, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ContentCode> {
        self.codes
            .iter()
            .enumerate()
            .filter(|(index, code)| self.by_number.get(&code.number) == Some(index))
            .map(|(_, code)| code)
    }

    /// Renders the bag as a `dmap.contentcodesresponse`.
    #[must_use]
    pub fn to_node(&self) -> ContentNode {
        let mut children = Vec::with_capacity(self.len() + 1);
        children.push(ContentNode::new("dmap.status", 200));
        children.extend(self.iter().map(|code| {
            ContentNode::container(
                "dmap.dictionary",
                vec![
                    ContentNode::new("dmap.contentcodesnumber", code.number.to_wire()),
                    ContentNode::new("dmap.contentcodesname", code.name.as_str()),
                    ContentNode::new("dmap.contentcodestype", code.content_type.to_wire()),
                ],
            )
        }));
        ContentNode::container("dmap.contentcodesresponse", children)
    }
}

fn code_from_dictionary(dict: &ContentNode) -> Option<ContentCode> {
    let mut number = None;
    let mut name = None;
    let mut content_type = None;
    for item in dict.children() {
        match item.name.as_str() {
            "dmap.contentcodesnumber" => number = item.as_i32().map(CodeNumber::from_wire),
            "dmap.contentcodesname" => name = item.as_str().map(str::to_owned),
            "dmap.contentcodestype" => {
                content_type = item
                    .as_integer()
                    .and_then(|v| i16::try_from(v).ok())
                    .and_then(ContentType::from_wire);
            }
            _ => {}
        }
    }
    Some(ContentCode {
        number: number?,
        name: name?,
        content_type: content_type?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;

    #[test]
    fn bootstrap_parses_dictionary_responses() {
        let bag = ContentCodeBag::bootstrap();
        assert_eq!(bag.len(), 6);
        assert!(bag.lookup_name("dmap.contentcodesresponse").is_some());
        assert!(bag.lookup_name("dmap.itemid").is_none());
    }

    #[test]
    fn builtin_lookups() {
        let bag = ContentCodeBag::builtin();
        let code = bag.lookup_name("dmap.itemid").unwrap();
        assert_eq!(code.number, CodeNumber::from_mnemonic(*b"miid"));
        assert_eq!(code.content_type, ContentType::Int);

        let by_number = bag.lookup_number(CodeNumber::from_mnemonic(*b"asal")).unwrap();
        assert_eq!(by_number.name, "daap.songalbum");
        assert!(bag.len() > 150);
    }

    #[test]
    fn unknown_lookups_are_none() {
        let bag = ContentCodeBag::builtin();
        assert!(bag.lookup_name("no.such.code").is_none());
        assert!(bag.lookup_number(CodeNumber::from_mnemonic(*b"zzzz")).is_none());
    }

    #[test]
    fn duplicate_number_keeps_first_duplicate_name_keeps_last() {
        let bag = ContentCodeBag::builtin();
        let by_number = bag.lookup_number(CodeNumber::from_mnemonic(*b"mlit")).unwrap();
        assert_eq!(by_number.name, "dmap.listingitem");
        assert_eq!(by_number.content_type, ContentType::Container);

        let by_name = bag.lookup_name("dmap.listingitemstring").unwrap();
        assert_eq!(by_name.content_type, ContentType::String);

        let mut bag = ContentCodeBag::empty();
        bag.insert(ContentCode::new(*b"aaaa", "test.first", ContentType::Int));
        bag.insert(ContentCode::new(*b"bbbb", "test.first", ContentType::Short));
        assert_eq!(
            bag.lookup_name("test.first").unwrap().number,
            CodeNumber::from_mnemonic(*b"bbbb")
        );
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn to_node_lists_each_number_once() {
        let bag = ContentCodeBag::builtin();
        let node = bag.to_node();
        assert_eq!(node.name, "dmap.contentcodesresponse");
        assert_eq!(node.child_i32("dmap.status"), Some(200));
        let dictionaries = node
            .children()
            .iter()
            .filter(|n| n.name == "dmap.dictionary")
            .count();
        assert_eq!(dictionaries, bag.len());
    }

    #[test]
    fn parse_codes_merges_server_codes() {
        let mut server = ContentCodeBag::builtin();
        server.insert(ContentCode::new(*b"xtra", "com.example.extra", ContentType::Long));
        let bytes = encode(&server, &server.to_node()).unwrap();

        let parsed = ContentCodeBag::parse_codes(&bytes, &Limits::default()).unwrap();
        let extra = parsed.lookup_name("com.example.extra").unwrap();
        assert_eq!(extra.number, CodeNumber::from_mnemonic(*b"xtra"));
        assert_eq!(extra.content_type, ContentType::Long);
        assert_eq!(parsed.len(), server.len());
    }

    #[test]
    fn parse_codes_skips_incomplete_dictionaries() {
        let bag = ContentCodeBag::bootstrap();
        let node = ContentNode::container(
            "dmap.contentcodesresponse",
            vec![
                ContentNode::new("dmap.status", 200),
                ContentNode::container(
                    "dmap.dictionary",
                    vec![ContentNode::new("dmap.contentcodesname", "half.entry")],
                ),
                ContentNode::container(
                    "dmap.dictionary",
                    vec![
                        ContentNode::new("dmap.contentcodesnumber", 0x7177_6572),
                        ContentNode::new("dmap.contentcodesname", "bad.type"),
                        ContentNode::new("dmap.contentcodestype", 4i16),
                    ],
                ),
            ],
        );
        let bytes = encode(&bag, &node).unwrap();
        let parsed = ContentCodeBag::parse_codes(&bytes, &Limits::default()).unwrap();
        assert!(parsed.lookup_name("half.entry").is_none());
        assert!(parsed.lookup_name("bad.type").is_none());
    }
}
