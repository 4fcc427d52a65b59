//! Signing algorithms: the pluggable MAC seam and its HMAC implementation.

use hmac::digest::core_api::BlockSizeUser;
use hmac::digest::Digest;
use hmac::{Mac, SimpleHmac};
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use crate::error::SignerError;
use crate::types::DigestMethod;

/// A keyed MAC used to sign and verify values.
///
/// Implementations must be stateless between calls: [`Signer`] shares one
/// instance across threads and invokes it concurrently.
///
/// [`Signer`]: crate::sign::Signer
pub trait SigningAlgorithm: Send + Sync {
    /// Short identifier, e.g. `"hmac-sha1"`.
    fn name(&self) -> &'static str;

    /// Compute the raw signature of `value` under `key`.
    fn get_signature(&self, key: &[u8], value: &[u8]) -> Result<Vec<u8>, SignerError>;

    /// Check `sig` against the signature of `value`.
    ///
    /// The default recomputes the signature and compares in constant time.
    fn verify_signature(&self, key: &[u8], value: &[u8], sig: &[u8]) -> Result<bool, SignerError> {
        let expected = self.get_signature(key, value)?;
        Ok(bool::from(expected.as_slice().ct_eq(sig)))
    }
}

/// HMAC over the configured digest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HmacAlgorithm {
    digest_method: DigestMethod,
}

impl HmacAlgorithm {
    pub fn new(digest_method: DigestMethod) -> Self {
        Self { digest_method }
    }

    pub fn digest_method(&self) -> DigestMethod {
        self.digest_method
    }
}

impl SigningAlgorithm for HmacAlgorithm {
    fn name(&self) -> &'static str {
        match self.digest_method {
            DigestMethod::Sha1 => "hmac-sha1",
            DigestMethod::Sha224 => "hmac-sha224",
            DigestMethod::Sha256 => "hmac-sha256",
            DigestMethod::Sha384 => "hmac-sha384",
            DigestMethod::Sha512 => "hmac-sha512",
        }
    }

    fn get_signature(&self, key: &[u8], value: &[u8]) -> Result<Vec<u8>, SignerError> {
        self.digest_method.hmac(key, &[value])
    }

    fn verify_signature(&self, key: &[u8], value: &[u8], sig: &[u8]) -> Result<bool, SignerError> {
        self.digest_method.hmac_verify(key, value, sig)
    }
}

// Each helper below instantiates its hasher or MAC locally, so every call
// starts from a freshly reset state.

impl DigestMethod {
    /// Hash the concatenation of `parts`.
    pub fn hash(self, parts: &[&[u8]]) -> Vec<u8> {
        match self {
            DigestMethod::Sha1 => hash_parts::<Sha1>(parts),
            DigestMethod::Sha224 => hash_parts::<Sha224>(parts),
            DigestMethod::Sha256 => hash_parts::<Sha256>(parts),
            DigestMethod::Sha384 => hash_parts::<Sha384>(parts),
            DigestMethod::Sha512 => hash_parts::<Sha512>(parts),
        }
    }

    /// HMAC of the concatenation of `parts` under `key`.
    pub fn hmac(self, key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, SignerError> {
        match self {
            DigestMethod::Sha1 => hmac_parts::<Sha1>(key, parts),
            DigestMethod::Sha224 => hmac_parts::<Sha224>(key, parts),
            DigestMethod::Sha256 => hmac_parts::<Sha256>(key, parts),
            DigestMethod::Sha384 => hmac_parts::<Sha384>(key, parts),
            DigestMethod::Sha512 => hmac_parts::<Sha512>(key, parts),
        }
    }

    /// Constant-time HMAC tag check.
    pub fn hmac_verify(self, key: &[u8], value: &[u8], tag: &[u8]) -> Result<bool, SignerError> {
        match self {
            DigestMethod::Sha1 => hmac_verify::<Sha1>(key, value, tag),
            DigestMethod::Sha224 => hmac_verify::<Sha224>(key, value, tag),
            DigestMethod::Sha256 => hmac_verify::<Sha256>(key, value, tag),
            DigestMethod::Sha384 => hmac_verify::<Sha384>(key, value, tag),
            DigestMethod::Sha512 => hmac_verify::<Sha512>(key, value, tag),
        }
    }
}

fn hash_parts<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = D::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}

fn new_mac<D: Digest + BlockSizeUser>(key: &[u8]) -> Result<SimpleHmac<D>, SignerError> {
    <SimpleHmac<D> as Mac>::new_from_slice(key)
        .map_err(|e| SignerError::InvalidConfiguration(format!("invalid HMAC key: {e}")))
}

fn hmac_parts<D: Digest + BlockSizeUser>(key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, SignerError> {
    let mut mac = new_mac::<D>(key)?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hmac_verify<D: Digest + BlockSizeUser>(
    key: &[u8],
    value: &[u8],
    tag: &[u8],
) -> Result<bool, SignerError> {
    let mut mac = new_mac::<D>(key)?;
    mac.update(value);
    Ok(mac.verify_slice(tag).is_ok())
}
