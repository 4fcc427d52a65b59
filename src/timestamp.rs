//! Signed values that carry their creation time.
//!
//! Wire format:
//!
//! ```text
//! value || sep || base64(be_u32(timestamp)) || sep || base64(MAC(...))
//! ```
//!
//! The MAC covers the value and the timestamp segment, so the timestamp
//! cannot be altered without invalidating the signature.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::encoding::{
    base64_decode, base64_encode, compress_decode, compress_encode, join_segments, rsplit_segment,
};
use crate::error::SignerError;
use crate::keys::SecretKey;
use crate::sign::Signer;
use crate::types::TIMESTAMP_LEN;

/// Current Unix time in seconds, truncated to 32 bits.
pub fn current_timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

/// Base64 of the 4-byte big-endian timestamp. Never compressed.
#[must_use]
pub fn encode_timestamp(timestamp: u32) -> Vec<u8> {
    base64_encode(&timestamp.to_be_bytes())
}

/// Inverse of [`encode_timestamp`].
pub fn decode_timestamp(data: &[u8]) -> Result<u32, SignerError> {
    let bytes = base64_decode(data)?;
    let raw: [u8; TIMESTAMP_LEN] = bytes.as_slice().try_into().map_err(|_| {
        SignerError::MalformedEncoding(format!(
            "timestamp must be {TIMESTAMP_LEN} bytes, got {}",
            bytes.len()
        ))
    })?;
    Ok(u32::from_be_bytes(raw))
}

/// A [`Signer`] that also records when a value was signed, so signatures
/// can be expired.
///
/// `max_age` arguments are in seconds; `0` disables the age check.
#[derive(Debug, Clone)]
pub struct TimestampSigner {
    signer: Signer,
}

impl From<Signer> for TimestampSigner {
    fn from(signer: Signer) -> Self {
        Self { signer }
    }
}

impl TimestampSigner {
    /// A timestamp signer with every option at its default.
    pub fn new(secret_key: impl Into<SecretKey>) -> Self {
        Self::from(Signer::new(secret_key))
    }

    /// The wrapped signer, which also verifies the outer signature.
    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Sign `value` with the current time.
    pub fn sign(&self, value: &[u8]) -> Result<Vec<u8>, SignerError> {
        self.sign_at(value, current_timestamp())
    }

    /// Sign `value` as if at `timestamp`.
    pub fn sign_at(&self, value: &[u8], timestamp: u32) -> Result<Vec<u8>, SignerError> {
        let inner = join_segments(value, self.signer.separator(), &encode_timestamp(timestamp));
        self.signer.sign(&inner)
    }

    /// Verify `signed`, check its age against the current time, and return
    /// the value.
    pub fn unsign<'a>(&self, signed: &'a [u8], max_age: u32) -> Result<&'a [u8], SignerError> {
        self.unsign_at(signed, max_age, current_timestamp())
    }

    pub fn unsign_at<'a>(
        &self,
        signed: &'a [u8],
        max_age: u32,
        now: u32,
    ) -> Result<&'a [u8], SignerError> {
        self.unsign_with_timestamp_at(signed, max_age, now)
            .map(|(value, _)| value)
    }

    /// Like [`unsign`](Self::unsign) but also returns the signing time.
    pub fn unsign_with_timestamp<'a>(
        &self,
        signed: &'a [u8],
        max_age: u32,
    ) -> Result<(&'a [u8], u32), SignerError> {
        self.unsign_with_timestamp_at(signed, max_age, current_timestamp())
    }

    pub fn unsign_with_timestamp_at<'a>(
        &self,
        signed: &'a [u8],
        max_age: u32,
        now: u32,
    ) -> Result<(&'a [u8], u32), SignerError> {
        let inner = self.signer.unsign(signed)?;

        let (value, ts) = rsplit_segment(inner, self.signer.separator()).ok_or_else(|| {
            tracing::debug!(len = signed.len(), "rejecting value: timestamp missing");
            SignerError::MissingTimestamp
        })?;
        let timestamp = decode_timestamp(ts)?;

        check_age(timestamp, max_age, now)?;
        Ok((value, timestamp))
    }

    /// Whether `signed` verifies and is within `max_age`.
    pub fn validate(&self, signed: &[u8], max_age: u32) -> bool {
        self.unsign(signed, max_age).is_ok()
    }

    /// Sign arbitrary bytes, base64-encoding (and possibly compressing) the
    /// value first. The timestamp segment is never compressed.
    pub fn sign_b64(&self, value: &[u8]) -> Result<Vec<u8>, SignerError> {
        self.sign(&compress_encode(value))
    }

    pub fn sign_b64_at(&self, value: &[u8], timestamp: u32) -> Result<Vec<u8>, SignerError> {
        self.sign_at(&compress_encode(value), timestamp)
    }

    /// Inverse of [`sign_b64`](Self::sign_b64).
    pub fn unsign_b64(&self, signed: &[u8], max_age: u32) -> Result<Vec<u8>, SignerError> {
        compress_decode(self.unsign(signed, max_age)?)
    }

    pub fn unsign_b64_at(
        &self,
        signed: &[u8],
        max_age: u32,
        now: u32,
    ) -> Result<Vec<u8>, SignerError> {
        compress_decode(self.unsign_at(signed, max_age, now)?)
    }
}

/// A timestamp later than `now` is rejected rather than treated as age 0,
/// since it can only come from clock skew or a forged issuer.
fn check_age(timestamp: u32, max_age: u32, now: u32) -> Result<(), SignerError> {
    if max_age == 0 {
        return Ok(());
    }
    let Some(age) = now.checked_sub(timestamp) else {
        tracing::debug!(timestamp, now, "rejecting value: timestamp in the future");
        return Err(SignerError::TimestampInFuture { timestamp, now });
    };
    if age > max_age {
        tracing::debug!(age, max_age, "rejecting value: signature expired");
        return Err(SignerError::SignatureExpired { age, max_age });
    }
    Ok(())
}
