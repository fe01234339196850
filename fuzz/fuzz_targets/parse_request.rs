#![no_main]

use libfuzzer_sys::fuzz_target;
use transport::{read_request, TransportLimits};

fuzz_target!(|data: &[u8]| {
    let limits = TransportLimits::default();
    let mut reader = data;
    // Keep reading: a connection carries any number of requests.
    for _ in 0..16 {
        match read_request(&mut reader, &limits) {
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => break,
        }
    }
});
