use super::encoding;
use crate::error::CResult;
use crate::serializer::{Codec, Serializer};
use std::fmt;
use std::str::FromStr;

/// `UserId = SHA256(full serialized public key)`. Kept distinct from
/// [`crate::crypto::Hash`] even though the representation coincides,
/// since the two are never interchangeable in the domain model.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UserId([u8; 32]);

impl UserId {
    pub const SIZE: usize = 32;

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        UserId(bytes)
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
        UserId(rand::random())
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", encoding::encode(&self.0))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", encoding::encode(&self.0))
    }
}

impl FromStr for UserId {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(UserId(encoding::decode_exact(s)?))
    }
}

impl Codec for UserId {
    fn encode(&self, s: &mut Serializer) {
        s.put_array(&self.0);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(UserId(s.get_array()?))
    }
}
