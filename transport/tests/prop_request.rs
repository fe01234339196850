use std::io::Cursor;

use proptest::prelude::*;
use transport::{read_request, Query, TransportLimits};

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut reader = Cursor::new(bytes);
        let limits = TransportLimits::for_testing();
        // drain until the stream ends or parsing fails
        for _ in 0..64 {
            match read_request(&mut reader, &limits) {
                Ok(Some(_)) => {}
                Ok(None) | Err(_) => break,
            }
        }
    }

    #[test]
    fn query_values_survive(
        pairs in proptest::collection::vec(("[a-z-]{1,12}", "[A-Za-z0-9.,%-]{0,16}"), 0..8)
    ) {
        let mut query = Query::new();
        for (key, value) in &pairs {
            query = query.with(key.clone(), value);
        }
        let raw = format!("GET /databases?{query} HTTP/1.1\r\n\r\n");
        let request = read_request(&mut Cursor::new(raw.into_bytes()), &TransportLimits::default())
            .unwrap()
            .unwrap();
        for (key, _) in &pairs {
            let expected = pairs.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
            prop_assert_eq!(request.query.get(key), expected);
        }
    }
}
