//! Fuzz test for cache key decoding
//!
//! Feeds arbitrary text to `CacheKey::decode` to find panics and keys that
//! do not survive re-encoding.
//!
//! Run with: cargo +nightly fuzz run key_decode_fuzz -- -max_total_time=60

#![no_main]

use baselayout_cache::CacheKey;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Some(key) = CacheKey::decode(text) {
        let encoded = key.encode();
        assert!(
            encoded.starts_with(&CacheKey::database_prefix(key.database())),
            "Encoded key lost its database prefix"
        );
        assert_eq!(
            CacheKey::decode(&encoded).as_ref(),
            Some(&key),
            "Encoded key did not decode to itself"
        );
    }
});
