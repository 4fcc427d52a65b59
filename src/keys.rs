//! Secret keys and signing-key derivation.
//!
//! Derivation is not a password-stretching step: it only namespaces one
//! secret across salts. Use long random secrets ([`generate_secret_key`]).

use std::fmt;

use rand::RngCore;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::SignerError;
use crate::types::{DigestMethod, KeyDerivation, DJANGO_CONCAT_INFIX};

/// Recommended secret length in bytes for [`generate_secret_key`].
pub const DEFAULT_SECRET_KEY_LEN: usize = 32;

/// Caller-owned secret. Zeroed from memory when dropped and never printed.
#[derive(Clone)]
pub struct SecretKey(Zeroizing<Vec<u8>>);

impl SecretKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Constant-time in the key contents; only the lengths may leak.
impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.as_bytes().ct_eq(other.as_bytes()))
    }
}

impl Eq for SecretKey {}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED; {}])", self.0.len())
    }
}

impl From<&str> for SecretKey {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl From<String> for SecretKey {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}

impl From<&[u8]> for SecretKey {
    fn from(b: &[u8]) -> Self {
        Self::new(b)
    }
}

impl From<Vec<u8>> for SecretKey {
    fn from(b: Vec<u8>) -> Self {
        Self::new(b)
    }
}

impl<const N: usize> From<&[u8; N]> for SecretKey {
    fn from(b: &[u8; N]) -> Self {
        Self::new(b.as_slice())
    }
}

/// Derive the signing key for `salt` from `secret`.
///
/// | method          | derived key                      |
/// |-----------------|----------------------------------|
/// | `concat`        | digest(salt ‖ secret)            |
/// | `django-concat` | digest(salt ‖ "signer" ‖ secret) |
/// | `hmac`          | HMAC(key=secret, digest)(salt)   |
/// | `none`          | secret                           |
///
/// The result is computed fresh on every call and zeroed on drop.
pub fn derive_key(
    secret: &SecretKey,
    salt: &[u8],
    digest_method: DigestMethod,
    method: KeyDerivation,
) -> Result<Zeroizing<Vec<u8>>, SignerError> {
    let key = match method {
        KeyDerivation::Concat => digest_method.hash(&[salt, secret.as_bytes()]),
        KeyDerivation::DjangoConcat => {
            digest_method.hash(&[salt, DJANGO_CONCAT_INFIX, secret.as_bytes()])
        }
        KeyDerivation::Hmac => digest_method.hmac(secret.as_bytes(), &[salt])?,
        KeyDerivation::None => secret.as_bytes().to_vec(),
    };
    Ok(Zeroizing::new(key))
}

/// Generate `len` random bytes from the OS RNG for use as a secret.
pub fn generate_secret_key(len: usize) -> Result<SecretKey, SignerError> {
    if len == 0 {
        return Err(SignerError::InvalidConfiguration(
            "secret key length must be non-zero".into(),
        ));
    }
    let mut bytes = Zeroizing::new(vec![0u8; len]);
    rand::rngs::OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| SignerError::InvalidConfiguration(format!("OS RNG unavailable: {e}")))?;
    Ok(SecretKey(bytes))
}
