//! Base64url (RFC 4648 §5) helpers shared by every fixed-size id/hash
//! type. Unpadded is produced; both padded and unpadded are accepted
//! on parse, since older clients in the wild still pad.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use crate::error::{CResult, SerializerError};

pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn decode_exact<const N: usize>(s: &str) -> CResult<[u8; N]> {
    let decoded = URL_SAFE_NO_PAD
        .decode(s)
        .or_else(|_| URL_SAFE.decode(s))
        .map_err(|_| SerializerError::InvalidValue(format!("{s} is not valid base64url")))?;
    if decoded.len() != N {
        return Err(SerializerError::InvalidValue(format!(
            "expected {N} bytes, decoded {}",
            decoded.len()
        ))
        .into());
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&decoded);
    Ok(out)
}
