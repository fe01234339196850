use chrono::DateTime;
use proptest::prelude::*;
use wire::{
    decode, encode, ContentCode, ContentCodeBag, ContentNode, ContentType, ContentValue, Limits,
    Version,
};

fn sample_value(content_type: ContentType) -> ContentValue {
    match content_type {
        ContentType::Byte => ContentValue::Byte(0xA5),
        ContentType::SignedByte => ContentValue::SignedByte(-100),
        ContentType::Short => ContentValue::Short(-12_345),
        ContentType::Int => ContentValue::Int(0x1234_5678),
        ContentType::Long => ContentValue::Long(-0x0123_4567_89AB_CDEF),
        ContentType::String => ContentValue::String("Cœur de pirate".to_owned()),
        ContentType::Date => ContentValue::Date(DateTime::from_timestamp(1_234_567_890, 0).unwrap()),
        ContentType::Version => ContentValue::Version(Version::new(3, 0, 2)),
        ContentType::Container => ContentValue::Container(vec![
            ContentNode::new("dmap.status", 200),
            ContentNode::new("dmap.itemname", "child"),
        ]),
    }
}

fn value_strategy(content_type: ContentType) -> BoxedStrategy<ContentValue> {
    match content_type {
        ContentType::Byte => any::<u8>().prop_map(ContentValue::Byte).boxed(),
        ContentType::SignedByte => any::<i8>().prop_map(ContentValue::SignedByte).boxed(),
        ContentType::Short => any::<i16>().prop_map(ContentValue::Short).boxed(),
        ContentType::Int => any::<i32>().prop_map(ContentValue::Int).boxed(),
        ContentType::Long => any::<i64>().prop_map(ContentValue::Long).boxed(),
        ContentType::String => ".{0,32}".prop_map(ContentValue::String).boxed(),
        ContentType::Date => any::<i32>()
            .prop_map(|secs| {
                ContentValue::Date(DateTime::from_timestamp(i64::from(secs), 0).unwrap())
            })
            .boxed(),
        ContentType::Version => (any::<u16>(), any::<u8>(), any::<u8>())
            .prop_map(|(major, minor, patch)| ContentValue::Version(Version::new(major, minor, patch)))
            .boxed(),
        ContentType::Container => prop::collection::vec(scalar_node(), 0..6)
            .prop_map(ContentValue::Container)
            .boxed(),
    }
}

/// Codes that own their wire number, i.e. the ones a decoder resolves to.
fn number_owners() -> Vec<ContentCode> {
    ContentCodeBag::builtin().iter().cloned().collect()
}

fn scalar_node() -> impl Strategy<Value = ContentNode> {
    let scalars: Vec<ContentCode> = number_owners()
        .into_iter()
        .filter(|code| code.content_type != ContentType::Container)
        .collect();
    prop::sample::select(scalars).prop_flat_map(|code| {
        value_strategy(code.content_type).prop_map(move |value| ContentNode {
            name: code.name.clone(),
            value,
        })
    })
}

fn any_node() -> impl Strategy<Value = ContentNode> {
    prop::sample::select(number_owners()).prop_flat_map(|code| {
        value_strategy(code.content_type).prop_map(move |value| ContentNode {
            name: code.name.clone(),
            value,
        })
    })
}

#[test]
fn every_builtin_code_survives_a_round_trip() {
    let bag = ContentCodeBag::builtin();
    for code in bag.iter() {
        let node = ContentNode {
            name: code.name.clone(),
            value: sample_value(code.content_type),
        };
        let bytes = encode(&bag, &node).unwrap();
        assert_eq!(&bytes[..4], &code.number.mnemonic(), "code for {}", code.name);

        let decoded = decode(&bag, &bytes, &Limits::default()).unwrap();
        assert_eq!(decoded, node, "value for {}", code.name);
        assert_eq!(decoded.value.content_type(), Some(code.content_type));
        assert_eq!(encode(&bag, &decoded).unwrap(), bytes);
    }
}

#[test]
fn server_supplied_codes_decode_after_exchange() {
    let mut server_bag = ContentCodeBag::builtin();
    server_bag.insert(ContentCode::new(*b"xsmp", "com.example.smartplaylist", ContentType::Byte));
    let codes_blob = encode(&server_bag, &server_bag.to_node()).unwrap();

    let message = ContentNode::container(
        "dmap.listingitem",
        vec![
            ContentNode::new("dmap.itemid", 4),
            ContentNode::new("com.example.smartplaylist", 1u8),
        ],
    );
    let bytes = encode(&server_bag, &message).unwrap();

    // before the exchange the extra code is opaque
    let before = decode(&ContentCodeBag::builtin(), &bytes, &Limits::default()).unwrap();
    assert!(matches!(
        before.children()[1].value,
        ContentValue::Unknown { .. }
    ));

    let client_bag = ContentCodeBag::parse_codes(&codes_blob, &Limits::default()).unwrap();
    let after = decode(&client_bag, &bytes, &Limits::default()).unwrap();
    assert_eq!(after, message);
}

proptest! {
    #[test]
    fn random_nodes_round_trip(node in any_node()) {
        let bag = ContentCodeBag::builtin();
        let bytes = encode(&bag, &node).unwrap();
        prop_assert_eq!(bytes.len(), wire::encoded_len(&node));
        let decoded = decode(&bag, &bytes, &Limits::default()).unwrap();
        prop_assert_eq!(&decoded, &node);
        prop_assert_eq!(encode(&bag, &decoded).unwrap(), bytes);
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let bag = ContentCodeBag::builtin();
        let _ = decode(&bag, &bytes, &Limits::for_testing());
    }

    #[test]
    fn truncating_a_message_is_always_an_error(node in any_node(), cut in 1usize..64) {
        let bag = ContentCodeBag::builtin();
        let bytes = encode(&bag, &node).unwrap();
        let keep = bytes.len().saturating_sub(cut);
        prop_assert!(decode(&bag, &bytes[..keep], &Limits::default()).is_err());
    }
}
