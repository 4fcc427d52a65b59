use thiserror::Error;

/// Message shown to end users for every rejected token, whatever the cause.
pub const INVALID_TOKEN_MESSAGE: &str = "invalid token";

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("no separator {0:?} found in value")]
    MissingSeparator(String),

    #[error("timestamp missing")]
    MissingTimestamp,

    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),

    #[error("signature does not match")]
    BadSignature,

    #[error("signature age {age} > {max_age} seconds")]
    SignatureExpired { age: u32, max_age: u32 },

    #[error("signature timestamp {timestamp} is in the future (now: {now})")]
    TimestampInFuture { timestamp: u32, now: u32 },
}

/// Coarse classification of a [`SignerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Format,
    Decode,
    Verification,
    Expired,
}

impl SignerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SignerError::InvalidConfiguration(_) => ErrorKind::Configuration,
            SignerError::MissingSeparator(_) | SignerError::MissingTimestamp => ErrorKind::Format,
            SignerError::MalformedEncoding(_) => ErrorKind::Decode,
            SignerError::BadSignature => ErrorKind::Verification,
            SignerError::SignatureExpired { .. } | SignerError::TimestampInFuture { .. } => {
                ErrorKind::Expired
            }
        }
    }

    /// True when the error means the presented token must be rejected, as
    /// opposed to the signer itself being misconfigured.
    pub fn is_invalid_token(&self) -> bool {
        self.kind() != ErrorKind::Configuration
    }

    /// Text safe to show to the party that presented the token.
    ///
    /// Verification, format, decode and expiry failures all collapse to
    /// [`INVALID_TOKEN_MESSAGE`] so the response cannot be used as an oracle.
    /// Use `Display` for the detailed reason in logs.
    pub fn public_message(&self) -> String {
        if self.is_invalid_token() {
            INVALID_TOKEN_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}
