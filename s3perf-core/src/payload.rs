//! In-memory payloads for write workloads.
//!
//! Payload contents are not part of what is measured, so every payload is a run of a single filler
//! byte. The same payload is shared across all writes of a run.

use bytes::Bytes;
use bytesize::ByteSize;

use crate::error::{Error, Result};

/// The byte every generated payload is filled with.
pub const FILLER: u8 = b'a';

/// Parses a human-readable size such as `10 KiB` or `1 MB` into an exact byte count.
///
/// Decimal units (`KB`, `MB`, ...) are powers of 1000, binary units (`KiB`, `MiB`, ...) are powers of
/// 1024. A bare integer is taken as a number of bytes.
pub fn parse_size(spec: &str) -> Result<u64> {
    let trimmed = spec.trim();
    if trimmed.is_empty() {
        return Err(invalid(spec, "size is empty"));
    }

    let size: ByteSize = trimmed.parse().map_err(|reason: String| invalid(spec, reason))?;

    // `bytesize` saturates on overflow instead of failing.
    if size.as_u64() == u64::MAX {
        return Err(invalid(spec, "size does not fit into 64 bits"));
    }

    Ok(size.as_u64())
}

/// Creates a payload of exactly the size described by `spec`.
///
/// Sizes that cannot be allocated are reported as [`Error::InvalidSizeSpec`].
pub fn generate(spec: &str) -> Result<Bytes> {
    let size = parse_size(spec)?;
    let len = usize::try_from(size)
        .ok()
        .filter(|len| isize::try_from(*len).is_ok())
        .ok_or_else(|| invalid(spec, "size exceeds addressable memory"))?;

    let mut payload = Vec::new();
    payload
        .try_reserve_exact(len)
        .map_err(|err| invalid(spec, err.to_string()))?;
    payload.resize(len, FILLER);

    Ok(Bytes::from(payload))
}

fn invalid(spec: &str, reason: impl Into<String>) -> Error {
    Error::InvalidSizeSpec {
        spec: spec.to_owned(),
        reason: reason.into(),
    }
}
