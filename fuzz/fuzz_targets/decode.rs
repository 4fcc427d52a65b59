#![no_main]
use libfuzzer_sys::fuzz_target;
use itsdangerous::encoding::{base64_decode, compress_decode, MAX_DECOMPRESSED_LEN};
use itsdangerous::timestamp::decode_timestamp;

fuzz_target!(|data: &[u8]| {
    let _ = base64_decode(data);
    let _ = decode_timestamp(data);
    if let Ok(out) = compress_decode(data) {
        assert!(out.len() as u64 <= MAX_DECOMPRESSED_LEN);
    }
});
