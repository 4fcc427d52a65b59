#![no_main]
use libfuzzer_sys::fuzz_target;
use itsdangerous::encoding::{compress_decode, compress_encode};
use itsdangerous::sign::Signer;
use itsdangerous::timestamp::TimestampSigner;

fuzz_target!(|data: &[u8]| {
    let signer = Signer::new("fuzz-secret");

    let signed = signer.sign(data).expect("sign");
    assert_eq!(signer.unsign(&signed).expect("unsign"), data);

    let signed = signer.sign_b64(data).expect("sign_b64");
    assert_eq!(signer.unsign_b64(&signed).expect("unsign_b64"), data);

    assert_eq!(compress_decode(&compress_encode(data)).expect("decode"), data);

    let timed = TimestampSigner::from(signer);
    let signed = timed.sign_at(data, 1_700_000_000).expect("sign_at");
    assert_eq!(
        timed.unsign_at(&signed, 60, 1_700_000_060).expect("unsign_at"),
        data
    );
});
