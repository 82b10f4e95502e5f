#![no_main]

use libfuzzer_sys::fuzz_target;
use profile_attest::{decode_badges, encode_badges, BadgeLimits};

fuzz_target!(|data: &[u8]| {
    let limits = BadgeLimits { max_badges: 64, max_field_len: 256 };
    // Anything that decodes must re-encode to the exact same bytes.
    if let Ok(badges) = decode_badges(data, limits) {
        assert_eq!(encode_badges(&badges), data);
    }
});
