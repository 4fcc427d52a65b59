//! Wire encoding for signed values.
//!
//! - URL-safe base64 with padding stripped on encode and restored from the
//!   length on decode.
//! - Opportunistic zlib compression: the payload is compressed only when that
//!   saves more than the one marker byte, and the marker (`.`) is prepended to
//!   the base64 text so the decoder knows to inflate.
//! - Separator framing: segments are joined with the separator and split at
//!   its right-most occurrence, so the separator may appear inside a value.

use std::io::{Read as _, Write as _};

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::SignerError;
use crate::types::COMPRESSION_MARKER;

/// Upper bound on an inflated payload. Guards against zlib bombs.
pub const MAX_DECOMPRESSED_LEN: u64 = 16 * 1024 * 1024;

/// Encode bytes as unpadded URL-safe base64.
#[must_use]
pub fn base64_encode(data: &[u8]) -> Vec<u8> {
    URL_SAFE_NO_PAD.encode(data).into_bytes()
}

/// Decode URL-safe base64, re-padding to a multiple of four first.
pub fn base64_decode(data: &[u8]) -> Result<Vec<u8>, SignerError> {
    let pad = (4 - data.len() % 4) % 4;
    let mut padded = Vec::with_capacity(data.len() + pad);
    padded.extend_from_slice(data);
    padded.resize(data.len() + pad, b'=');

    URL_SAFE
        .decode(&padded)
        .map_err(|e| SignerError::MalformedEncoding(format!("invalid base64: {e}")))
}

/// Base64-encode `data`, compressing it first when that makes it smaller.
///
/// Compression failures are not errors: the payload is simply encoded
/// uncompressed.
#[must_use]
pub fn compress_encode(data: &[u8]) -> Vec<u8> {
    match zlib_compress(data) {
        Ok(compressed) if should_compress(compressed.len(), data.len()) => {
            let encoded = base64_encode(&compressed);
            let mut out = Vec::with_capacity(encoded.len() + 1);
            out.push(COMPRESSION_MARKER);
            out.extend_from_slice(&encoded);
            out
        }
        Ok(_) => base64_encode(data),
        Err(e) => {
            tracing::debug!(error = %e, "zlib compression failed, encoding uncompressed");
            base64_encode(data)
        }
    }
}

/// Inverse of [`compress_encode`].
pub fn compress_decode(data: &[u8]) -> Result<Vec<u8>, SignerError> {
    match data.split_first() {
        Some((&COMPRESSION_MARKER, rest)) => zlib_decompress(&base64_decode(rest)?),
        _ => base64_decode(data),
    }
}

/// Whether a compressed payload is worth its marker byte.
pub(crate) fn should_compress(compressed_len: usize, original_len: usize) -> bool {
    compressed_len + 1 < original_len
}

fn zlib_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 16), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn zlib_decompress(data: &[u8]) -> Result<Vec<u8>, SignerError> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .take(MAX_DECOMPRESSED_LEN + 1)
        .read_to_end(&mut out)
        .map_err(|e| SignerError::MalformedEncoding(format!("invalid zlib stream: {e}")))?;

    if out.len() as u64 > MAX_DECOMPRESSED_LEN {
        return Err(SignerError::MalformedEncoding(format!(
            "decompressed payload exceeds {MAX_DECOMPRESSED_LEN} bytes"
        )));
    }
    Ok(out)
}

// --- Framing ---

/// `head || separator || tail`
#[must_use]
pub fn join_segments(head: &[u8], separator: &[u8], tail: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(head.len() + separator.len() + tail.len());
    buf.extend_from_slice(head);
    buf.extend_from_slice(separator);
    buf.extend_from_slice(tail);
    buf
}

/// Split `data` at the right-most occurrence of `separator`.
///
/// Returns `None` when the separator is absent (or empty).
pub fn rsplit_segment<'a>(data: &'a [u8], separator: &[u8]) -> Option<(&'a [u8], &'a [u8])> {
    if separator.is_empty() || separator.len() > data.len() {
        return None;
    }
    let idx = data.windows(separator.len()).rposition(|w| w == separator)?;
    let (head, rest) = data.split_at(idx);
    let tail = rest.get(separator.len()..)?;
    Some((head, tail))
}
