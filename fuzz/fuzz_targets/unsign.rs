#![no_main]
use libfuzzer_sys::fuzz_target;
use itsdangerous::sign::Signer;
use itsdangerous::timestamp::TimestampSigner;

fuzz_target!(|data: &[u8]| {
    // Must never panic, regardless of input.
    let signer = Signer::new("fuzz-secret");
    let _ = signer.unsign(data);
    let _ = signer.unsign_b64(data);

    let timed = TimestampSigner::from(signer);
    let _ = timed.unsign_at(data, 3600, 1_700_000_000);
    let _ = timed.unsign_b64_at(data, 0, 1_700_000_000);
});
