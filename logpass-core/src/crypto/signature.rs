use super::encoding;
use crate::error::CResult;
use crate::serializer::{Codec, Serializer};
use std::fmt;
use std::str::FromStr;

/// A raw 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signature([u8; 64]);

impl Signature {
    pub const SIZE: usize = 64;

    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Signature(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    pub(crate) fn to_dalek(self) -> ed25519_dalek::Signature {
        ed25519_dalek::Signature::from_bytes(&self.0)
    }

    pub(crate) fn from_dalek(sig: ed25519_dalek::Signature) -> Self {
        Signature(sig.to_bytes())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", encoding::encode(&self.0))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", encoding::encode(&self.0))
    }
}

impl FromStr for Signature {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Signature(encoding::decode_exact(s)?))
    }
}

impl Codec for Signature {
    fn encode(&self, s: &mut Serializer) {
        s.put_array(&self.0);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(Signature(s.get_array()?))
    }
}
