#![no_main]

use libfuzzer_sys::fuzz_target;
use transport::{ResponseHead, TransportLimits};

fuzz_target!(|data: &[u8]| {
    let mut reader = data;
    if let Ok(head) = ResponseHead::read(&mut reader, &TransportLimits::default()) {
        let _ = head.status();
        let _ = head.content_length();
    }
});
