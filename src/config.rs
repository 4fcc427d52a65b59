//! Serde-loadable signer configuration.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::SignerError;
use crate::keys::SecretKey;
use crate::sign::Signer;
use crate::timestamp::TimestampSigner;
use crate::types::{DigestMethod, KeyDerivation};

/// Construction data for a [`Signer`].
///
/// ```json
/// {
///   "secret_key": "super secret 1",
///   "salt": "cookie-session",
///   "key_derivation": "hmac",
///   "digest_method": "sha1"
/// }
/// ```
///
/// Omitted fields take the library defaults. Method names are only checked
/// by [`build`](Self::build).
#[derive(Clone, Serialize, Deserialize)]
pub struct SignerConfig {
    pub secret_key: Zeroizing<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    #[serde(default = "default_key_derivation")]
    pub key_derivation: String,
    #[serde(default = "default_digest_method")]
    pub digest_method: String,
}

fn default_key_derivation() -> String {
    KeyDerivation::default().as_str().to_string()
}

fn default_digest_method() -> String {
    DigestMethod::default().as_str().to_string()
}

impl fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerConfig")
            .field("secret_key", &"[REDACTED]")
            .field("salt", &self.salt)
            .field("separator", &self.separator)
            .field("key_derivation", &self.key_derivation)
            .field("digest_method", &self.digest_method)
            .finish()
    }
}

impl SignerConfig {
    /// A config with only the secret set.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: Zeroizing::new(secret_key.into()),
            salt: None,
            separator: None,
            key_derivation: default_key_derivation(),
            digest_method: default_digest_method(),
        }
    }

    pub fn build(&self) -> Result<Signer, SignerError> {
        let key_derivation: KeyDerivation = self.key_derivation.parse()?;
        let digest_method: DigestMethod = self.digest_method.parse()?;

        let mut builder = Signer::builder(SecretKey::new(self.secret_key.as_bytes()))
            .key_derivation(key_derivation)
            .digest_method(digest_method);
        if let Some(salt) = &self.salt {
            builder = builder.salt(salt.as_bytes());
        }
        if let Some(separator) = &self.separator {
            builder = builder.separator(separator.as_bytes());
        }
        builder.build()
    }

    pub fn build_timestamp_signer(&self) -> Result<TimestampSigner, SignerError> {
        self.build().map(TimestampSigner::from)
    }
}
