#![no_main]

use libfuzzer_sys::fuzz_target;
use wire::{decode, ContentCodeBag, Limits};

fuzz_target!(|data: &[u8]| {
    let bag = ContentCodeBag::builtin();
    let limits = Limits::default();
    let _ = decode(&bag, data, &limits);

    // A content-codes body builds a bag from untrusted input.
    if let Ok(parsed) = ContentCodeBag::parse_codes(data, &limits) {
        let _ = decode(&parsed, data, &limits);
    }
});
