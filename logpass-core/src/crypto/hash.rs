use super::encoding;
use crate::error::CResult;
use crate::serializer::{Codec, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A SHA-256 digest. Used as the payload that transactions and blocks
/// sign over, and as the building block for [`crate::crypto::UserId`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash([u8; 32]);

impl Hash {
    pub const SIZE: usize = 32;

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn sha256(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Hash(hasher.finalize().into())
    }

    /// `false` for the all-zero hash, used as a sentinel "no value".
    pub fn is_valid(&self) -> bool {
        self.0 != [0u8; 32]
    }
}

impl Default for Hash {
    fn default() -> Self {
        Hash([0u8; 32])
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", encoding::encode(&self.0))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", encoding::encode(&self.0))
    }
}

impl FromStr for Hash {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Hash(encoding::decode_exact(s)?))
    }
}

impl Codec for Hash {
    fn encode(&self, s: &mut Serializer) {
        s.put_array(&self.0);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(Hash(s.get_array()?))
    }
}
