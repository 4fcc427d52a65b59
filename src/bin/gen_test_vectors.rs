//! Prints this crate's signing output in the layout of
//! `testdata/reference_vectors.json`, so it can be diffed against the
//! Python-generated file.
//! Run with: cargo run --bin gen_test_vectors

use itsdangerous::error::SignerError;
use itsdangerous::sign::Signer;
use itsdangerous::timestamp::TimestampSigner;
use itsdangerous::types::{DigestMethod, KeyDerivation};

const SECRET: &str = "secret-key";
const VALUE: &str = "my string";
const FROZEN_TIMESTAMP: u32 = 1_700_000_000;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut vectors: Vec<serde_json::Value> = Vec::new();

    // === Every derivation over three digests ===

    for key_derivation in [
        KeyDerivation::Concat,
        KeyDerivation::DjangoConcat,
        KeyDerivation::Hmac,
        KeyDerivation::None,
    ] {
        for digest_method in [DigestMethod::Sha1, DigestMethod::Sha256, DigestMethod::Sha512] {
            let signer = Signer::builder(SECRET)
                .key_derivation(key_derivation)
                .digest_method(digest_method)
                .build()?;
            vectors.push(vector(
                &format!("{key_derivation}_{digest_method}"),
                &signer,
                VALUE,
                signer.sign(VALUE.as_bytes())?,
            )?);
        }
    }

    // === Custom separator and salt ===

    let signer = Signer::builder(SECRET)
        .salt("activate")
        .separator("|")
        .build()?;
    let value = "user|42";
    vectors.push(vector(
        "custom_separator_and_salt",
        &signer,
        value,
        signer.sign(value.as_bytes())?,
    )?);

    // === Timestamped ===

    let timed = TimestampSigner::new(SECRET);
    let mut v = vector(
        "timestamp_default",
        timed.signer(),
        VALUE,
        timed.sign_at(VALUE.as_bytes(), FROZEN_TIMESTAMP)?,
    )?;
    if let Some(obj) = v.as_object_mut() {
        obj.insert("timestamp".into(), FROZEN_TIMESTAMP.into());
    }
    vectors.push(v);

    let output = serde_json::json!({
        "description": "Signed values produced by the Rust itsdangerous crate.",
        "generated_by": "gen_test_vectors",
        "vectors": vectors,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn vector(
    name: &str,
    signer: &Signer,
    value: &str,
    signed: Vec<u8>,
) -> Result<serde_json::Value, SignerError> {
    let salt = String::from_utf8_lossy(signer.salt());
    Ok(serde_json::json!({
        "name": name,
        "secret_key": SECRET,
        "salt": salt,
        "separator": String::from_utf8_lossy(signer.separator()),
        "key_derivation": signer.key_derivation().as_str(),
        "digest_method": signer.digest_method().as_str(),
        "derived_key_hex": hex::encode(signer.derive_key()?.as_slice()),
        "value": value,
        "signed": String::from_utf8_lossy(&signed),
    }))
}
