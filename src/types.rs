use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SignerError;

/// Salt used when none is configured.
pub const DEFAULT_SALT: &[u8] = b"itsdangerous.Signer";

/// Separator used when none is configured.
pub const DEFAULT_SEPARATOR: &[u8] = b".";

/// Leading byte marking a zlib-compressed base64 payload.
pub const COMPRESSION_MARKER: u8 = b'.';

/// Infix mixed between salt and secret by `django-concat` derivation.
pub const DJANGO_CONCAT_INFIX: &[u8] = b"signer";

/// Byte length of an encoded timestamp (big-endian u32).
pub const TIMESTAMP_LEN: usize = 4;

/// How the signing key is derived from the secret and salt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyDerivation {
    /// digest(salt || secret)
    Concat,
    /// digest(salt || "signer" || secret)
    #[default]
    DjangoConcat,
    /// HMAC(key = secret)(salt)
    Hmac,
    /// The secret is used verbatim.
    None,
}

impl KeyDerivation {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyDerivation::Concat => "concat",
            KeyDerivation::DjangoConcat => "django-concat",
            KeyDerivation::Hmac => "hmac",
            KeyDerivation::None => "none",
        }
    }
}

impl FromStr for KeyDerivation {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "concat" => Ok(KeyDerivation::Concat),
            "django-concat" => Ok(KeyDerivation::DjangoConcat),
            "hmac" => Ok(KeyDerivation::Hmac),
            "none" => Ok(KeyDerivation::None),
            _ => Err(SignerError::InvalidConfiguration(format!(
                "unknown key derivation method: {s}"
            ))),
        }
    }
}

impl TryFrom<String> for KeyDerivation {
    type Error = SignerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<KeyDerivation> for String {
    fn from(k: KeyDerivation) -> Self {
        k.as_str().to_string()
    }
}

impl fmt::Display for KeyDerivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hash function used for key derivation and by the HMAC signing algorithm.
///
/// SHA-1 is the default for compatibility with existing itsdangerous tokens.
/// Prefer SHA-256 or stronger for new deployments.
///
/// The enum is a pure selector. Every hash or MAC computation builds a
/// fresh hasher for that call, so no accumulator state is ever shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DigestMethod {
    #[default]
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            DigestMethod::Sha1 => "sha1",
            DigestMethod::Sha224 => "sha224",
            DigestMethod::Sha256 => "sha256",
            DigestMethod::Sha384 => "sha384",
            DigestMethod::Sha512 => "sha512",
        }
    }

    /// Digest output length in bytes.
    pub fn output_len(self) -> usize {
        match self {
            DigestMethod::Sha1 => 20,
            DigestMethod::Sha224 => 28,
            DigestMethod::Sha256 => 32,
            DigestMethod::Sha384 => 48,
            DigestMethod::Sha512 => 64,
        }
    }
}

impl FromStr for DigestMethod {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(DigestMethod::Sha1),
            "sha224" => Ok(DigestMethod::Sha224),
            "sha256" => Ok(DigestMethod::Sha256),
            "sha384" => Ok(DigestMethod::Sha384),
            "sha512" => Ok(DigestMethod::Sha512),
            _ => Err(SignerError::InvalidConfiguration(format!(
                "unknown digest method: {s}"
            ))),
        }
    }
}

impl TryFrom<String> for DigestMethod {
    type Error = SignerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<DigestMethod> for String {
    fn from(d: DigestMethod) -> Self {
        d.as_str().to_string()
    }
}

impl fmt::Display for DigestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
