//! The base signer: `value || separator || base64(MAC(derived_key, value))`.

use std::fmt;
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::algorithm::{HmacAlgorithm, SigningAlgorithm};
use crate::encoding::{
    base64_decode, base64_encode, compress_decode, compress_encode, join_segments, rsplit_segment,
};
use crate::error::SignerError;
use crate::keys::{derive_key, SecretKey};
use crate::types::{DigestMethod, KeyDerivation, DEFAULT_SALT, DEFAULT_SEPARATOR};

/// Signs values and verifies signed values.
///
/// Configuration is fixed at construction. A `Signer` is cheap to clone and
/// can be shared across threads; every call derives its key afresh.
///
/// The salt namespaces signatures: a value signed with one salt does not
/// verify under another. Reusing the default salt across unrelated parts of
/// an application lets a value signed for one purpose be replayed for
/// another.
#[derive(Clone)]
pub struct Signer {
    secret_key: SecretKey,
    salt: Vec<u8>,
    separator: Vec<u8>,
    key_derivation: KeyDerivation,
    digest_method: DigestMethod,
    algorithm: Arc<dyn SigningAlgorithm>,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("secret_key", &self.secret_key)
            .field("salt", &String::from_utf8_lossy(&self.salt))
            .field("separator", &String::from_utf8_lossy(&self.separator))
            .field("key_derivation", &self.key_derivation)
            .field("digest_method", &self.digest_method)
            .field("algorithm", &self.algorithm.name())
            .finish()
    }
}

impl Signer {
    /// A signer with every option at its default.
    pub fn new(secret_key: impl Into<SecretKey>) -> Self {
        Self {
            secret_key: secret_key.into(),
            salt: DEFAULT_SALT.to_vec(),
            separator: DEFAULT_SEPARATOR.to_vec(),
            key_derivation: KeyDerivation::default(),
            digest_method: DigestMethod::default(),
            algorithm: Arc::new(HmacAlgorithm::default()),
        }
    }

    pub fn builder(secret_key: impl Into<SecretKey>) -> SignerBuilder {
        SignerBuilder::new(secret_key)
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn separator(&self) -> &[u8] {
        &self.separator
    }

    pub fn key_derivation(&self) -> KeyDerivation {
        self.key_derivation
    }

    pub fn digest_method(&self) -> DigestMethod {
        self.digest_method
    }

    pub fn algorithm(&self) -> &dyn SigningAlgorithm {
        self.algorithm.as_ref()
    }

    /// Derive the signing key for this signer's salt.
    pub fn derive_key(&self) -> Result<Zeroizing<Vec<u8>>, SignerError> {
        derive_key(&self.secret_key, &self.salt, self.digest_method, self.key_derivation)
    }

    /// Base64-encoded signature of `value`.
    pub fn get_signature(&self, value: &[u8]) -> Result<Vec<u8>, SignerError> {
        let key = self.derive_key()?;
        let sig = self.algorithm.get_signature(&key, value)?;
        Ok(base64_encode(&sig))
    }

    /// Check a base64-encoded signature against `value`.
    ///
    /// A signature that does not decode is reported as not matching.
    pub fn verify_signature(&self, value: &[u8], sig: &[u8]) -> Result<bool, SignerError> {
        let key = self.derive_key()?;
        let Ok(raw) = base64_decode(sig) else {
            tracing::trace!(sig_len = sig.len(), "signature segment is not valid base64");
            return Ok(false);
        };
        self.algorithm.verify_signature(&key, value, &raw)
    }

    /// `value || separator || signature`
    pub fn sign(&self, value: &[u8]) -> Result<Vec<u8>, SignerError> {
        let sig = self.get_signature(value)?;
        Ok(join_segments(value, &self.separator, &sig))
    }

    /// Verify `signed` and return the value it carries.
    pub fn unsign<'a>(&self, signed: &'a [u8]) -> Result<&'a [u8], SignerError> {
        let (value, sig) = self.split(signed)?;
        if self.verify_signature(value, sig)? {
            return Ok(value);
        }
        tracing::debug!(len = signed.len(), "rejecting value: signature does not match");
        Err(SignerError::BadSignature)
    }

    /// Like [`unsign`](Self::unsign) but only reports validity.
    pub fn validate(&self, signed: &[u8]) -> bool {
        self.unsign(signed).is_ok()
    }

    /// Sign arbitrary bytes, base64-encoding (and possibly compressing) them
    /// first so the token is URL safe.
    pub fn sign_b64(&self, value: &[u8]) -> Result<Vec<u8>, SignerError> {
        self.sign(&compress_encode(value))
    }

    /// Inverse of [`sign_b64`](Self::sign_b64).
    pub fn unsign_b64(&self, signed: &[u8]) -> Result<Vec<u8>, SignerError> {
        compress_decode(self.unsign(signed)?)
    }

    /// Split at the right-most separator into `(value, signature)`.
    pub(crate) fn split<'a>(&self, signed: &'a [u8]) -> Result<(&'a [u8], &'a [u8]), SignerError> {
        rsplit_segment(signed, &self.separator).ok_or_else(|| {
            tracing::debug!(len = signed.len(), "rejecting value: no separator");
            SignerError::MissingSeparator(String::from_utf8_lossy(&self.separator).into_owned())
        })
    }
}

/// Builds a [`Signer`], applying defaults for anything left unset.
pub struct SignerBuilder {
    secret_key: SecretKey,
    salt: Option<Vec<u8>>,
    separator: Option<Vec<u8>>,
    key_derivation: KeyDerivation,
    digest_method: DigestMethod,
    algorithm: Option<Arc<dyn SigningAlgorithm>>,
}

impl SignerBuilder {
    pub fn new(secret_key: impl Into<SecretKey>) -> Self {
        Self {
            secret_key: secret_key.into(),
            salt: None,
            separator: None,
            key_derivation: KeyDerivation::default(),
            digest_method: DigestMethod::default(),
            algorithm: None,
        }
    }

    pub fn salt(mut self, salt: impl Into<Vec<u8>>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    pub fn separator(mut self, separator: impl Into<Vec<u8>>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    pub fn key_derivation(mut self, key_derivation: KeyDerivation) -> Self {
        self.key_derivation = key_derivation;
        self
    }

    /// Digest used for key derivation, and for HMAC unless a custom
    /// algorithm is set.
    pub fn digest_method(mut self, digest_method: DigestMethod) -> Self {
        self.digest_method = digest_method;
        self
    }

    pub fn algorithm(mut self, algorithm: impl SigningAlgorithm + 'static) -> Self {
        self.algorithm = Some(Arc::new(algorithm));
        self
    }

    pub fn build(self) -> Result<Signer, SignerError> {
        let separator = self.separator.unwrap_or_else(|| DEFAULT_SEPARATOR.to_vec());
        validate_separator(&separator)?;

        let algorithm: Arc<dyn SigningAlgorithm> = match self.algorithm {
            Some(algorithm) => algorithm,
            None => Arc::new(HmacAlgorithm::new(self.digest_method)),
        };
        Ok(Signer {
            secret_key: self.secret_key,
            salt: self.salt.unwrap_or_else(|| DEFAULT_SALT.to_vec()),
            separator,
            key_derivation: self.key_derivation,
            digest_method: self.digest_method,
            algorithm,
        })
    }
}

/// The separator must be non-empty and must not be able to occur inside a
/// base64url signature segment.
fn validate_separator(separator: &[u8]) -> Result<(), SignerError> {
    if separator.is_empty() {
        return Err(SignerError::InvalidConfiguration("separator must not be empty".into()));
    }
    if separator
        .iter()
        .any(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'='))
    {
        return Err(SignerError::InvalidConfiguration(format!(
            "separator {:?} may occur inside a signature; ASCII letters, digits and '-_=' are not allowed",
            String::from_utf8_lossy(separator)
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const SIGNED: &[u8] = b"my string.wh6tMHxLgJqB6oY1uT73iMlyrOA";

    #[test]
    fn test_sign_known_vector() {
        let s = Signer::new("secret-key");
        assert_eq!(s.sign(b"my string").unwrap(), SIGNED);
    }

    #[test]
    fn test_unsign_known_vector() {
        let s = Signer::new("secret-key");
        assert_eq!(s.unsign(SIGNED).unwrap(), b"my string");
    }

    #[test]
    fn test_builder_defaults_match_new() {
        let built = Signer::builder("secret-key").build().unwrap();
        assert_eq!(built.sign(b"my string").unwrap(), SIGNED);
        assert_eq!(built.salt(), DEFAULT_SALT);
        assert_eq!(built.separator(), DEFAULT_SEPARATOR);
        assert_eq!(built.key_derivation(), KeyDerivation::DjangoConcat);
        assert_eq!(built.digest_method(), DigestMethod::Sha1);
        assert_eq!(built.algorithm().name(), "hmac-sha1");
    }

    #[test]
    fn test_unsign_missing_separator() {
        let s = Signer::new("secret-key");
        let err = s.unsign(b"no separator here").unwrap_err();
        assert!(matches!(err, SignerError::MissingSeparator(_)));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_unsign_wrong_key() {
        let signed = Signer::new("secret-key").sign(b"value").unwrap();
        let err = Signer::new("other-key").unsign(&signed).unwrap_err();
        assert!(matches!(err, SignerError::BadSignature));
    }

    #[test]
    fn test_unsign_wrong_salt() {
        let a = Signer::builder("k").salt("activate").build().unwrap();
        let b = Signer::builder("k").salt("reset").build().unwrap();
        let signed = a.sign(b"user-1").unwrap();
        assert!(b.unsign(&signed).is_err());
        assert_eq!(a.unsign(&signed).unwrap(), b"user-1");
    }

    #[test]
    fn test_tampered_value_rejected() {
        let s = Signer::new("secret-key");
        let mut signed = s.sign(b"my string").unwrap();
        signed[0] = b'M';
        assert!(matches!(s.unsign(&signed), Err(SignerError::BadSignature)));
    }

    #[test]
    fn test_garbage_signature_is_bad_signature() {
        let s = Signer::new("secret-key");
        assert!(matches!(s.unsign(b"my string.!!!"), Err(SignerError::BadSignature)));
        assert!(matches!(s.unsign(b"my string."), Err(SignerError::BadSignature)));
        assert!(!s.verify_signature(b"my string", b"*").unwrap());
    }

    #[test]
    fn test_value_containing_separator() {
        let s = Signer::new("secret-key");
        let signed = s.sign(b"a.b.c").unwrap();
        assert_eq!(s.unsign(&signed).unwrap(), b"a.b.c");
    }

    #[test]
    fn test_empty_value() {
        let s = Signer::new("secret-key");
        let signed = s.sign(b"").unwrap();
        assert_eq!(signed[0], b'.');
        assert_eq!(s.unsign(&signed).unwrap(), b"");
    }

    #[test]
    fn test_multibyte_separator() {
        let s = Signer::builder("k").separator("::").build().unwrap();
        let signed = s.sign(b"a::b").unwrap();
        assert_eq!(s.unsign(&signed).unwrap(), b"a::b");
        assert!(Signer::new("k").unsign(&signed).is_err());
    }

    #[test]
    fn test_invalid_separators() {
        for sep in ["", "a", "Z", "0", "-", "_", "=", ".a"] {
            let err = Signer::builder("k").separator(sep).build().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration, "{sep:?}");
        }
        for sep in [".", "|", ":", "~", "::"] {
            assert!(Signer::builder("k").separator(sep).build().is_ok(), "{sep:?}");
        }
    }

    #[test]
    fn test_digest_method_changes_signature() {
        let sha1 = Signer::new("k").sign(b"v").unwrap();
        let sha256 = Signer::builder("k")
            .digest_method(DigestMethod::Sha256)
            .build()
            .unwrap();
        let signed = sha256.sign(b"v").unwrap();
        assert_ne!(sha1, signed);
        assert_eq!(sha256.algorithm().name(), "hmac-sha256");
        assert_eq!(sha256.unsign(&signed).unwrap(), b"v");
    }

    #[test]
    fn test_sign_b64_roundtrip() {
        let s = Signer::new("secret-key");
        let payload = [0u8, 1, 2, 255, b'.', b'.'];
        let signed = s.sign_b64(&payload).unwrap();
        assert!(signed.iter().all(|b| b.is_ascii_alphanumeric() || b"-_.".contains(b)));
        assert_eq!(s.unsign_b64(&signed).unwrap(), payload);
    }

    #[test]
    fn test_sign_b64_compresses_long_payloads() {
        let s = Signer::new("secret-key");
        let payload = b"{\"key\": \"value\"}".repeat(40);
        let signed = s.sign_b64(&payload).unwrap();
        assert_eq!(signed[0], b'.');
        assert_eq!(s.unsign_b64(&signed).unwrap(), payload);
    }

    #[test]
    fn test_unsign_b64_bad_payload_is_decode_error() {
        let s = Signer::new("secret-key");
        let signed = s.sign(b"***").unwrap();
        assert_eq!(s.unsign_b64(&signed).unwrap_err().kind(), ErrorKind::Decode);
    }

    struct ConstantAlgorithm;

    impl SigningAlgorithm for ConstantAlgorithm {
        fn name(&self) -> &'static str {
            "constant"
        }

        fn get_signature(&self, _key: &[u8], _value: &[u8]) -> Result<Vec<u8>, SignerError> {
            Ok(b"sig".to_vec())
        }
    }

    #[test]
    fn test_custom_algorithm() {
        let s = Signer::builder("k").algorithm(ConstantAlgorithm).build().unwrap();
        let signed = s.sign(b"value").unwrap();
        assert_eq!(signed, b"value.c2ln");
        assert_eq!(s.unsign(b"anything.c2ln").unwrap(), b"anything");
        assert_eq!(s.algorithm().name(), "constant");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", Signer::new("hunter2"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("hmac-sha1"));
    }

    #[test]
    fn test_signer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Signer>();
    }

    #[test]
    fn test_concurrent_signing_is_consistent() {
        let s = Signer::new("secret-key");
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let s = s.clone();
                std::thread::spawn(move || {
                    let value = format!("value-{i}");
                    for _ in 0..200 {
                        let signed = s.sign(value.as_bytes()).unwrap();
                        assert_eq!(s.unsign(&signed).unwrap(), value.as_bytes());
                    }
                    s.sign(value.as_bytes()).unwrap()
                })
            })
            .collect();
        for (i, h) in handles.into_iter().enumerate() {
            let signed = h.join().unwrap();
            assert_eq!(signed, s.sign(format!("value-{i}").as_bytes()).unwrap());
        }
    }
}
