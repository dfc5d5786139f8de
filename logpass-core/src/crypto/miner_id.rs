use super::encoding;
use crate::error::CResult;
use crate::serializer::{Codec, Serializer};
use std::fmt;
use std::str::FromStr;

/// `MinerId = raw Ed25519 public-key bytes`, i.e. a public key with its
/// type tag stripped. Distinct from [`crate::crypto::UserId`]: the
/// same physical key produces a different `UserId` (hashed, tagged)
/// than `MinerId` (raw, untagged).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MinerId([u8; 32]);

impl MinerId {
    pub const SIZE: usize = 32;

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        MinerId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 != [0u8; 32]
    }

    /// A uniform random id, used to seed [`crate::columns::Column::scan_nearest`]
    /// for "random" sampling over the keyspace.
    pub fn random() -> Self {
        MinerId(rand::random())
    }
}

impl fmt::Debug for MinerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MinerId({})", encoding::encode(&self.0))
    }
}

impl fmt::Display for MinerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", encoding::encode(&self.0))
    }
}

impl FromStr for MinerId {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(MinerId(encoding::decode_exact(s)?))
    }
}

impl Codec for MinerId {
    fn encode(&self, s: &mut Serializer) {
        s.put_array(&self.0);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(MinerId(s.get_array()?))
    }
}
