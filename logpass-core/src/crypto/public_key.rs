use super::encoding;
use super::hash::Hash;
use super::signature::Signature;
use crate::error::{CResult, Error, SerializerError};
use crate::serializer::{Codec, Serializer};
use std::fmt;
use std::str::FromStr;

/// Key-type tag, packed into the low nibble of a [`crate::crypto::MultiSignatures`]
/// envelope type byte and as the leading byte of every serialized
/// public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Ed25519,
}

impl KeyType {
    pub const fn tag(self) -> u8 {
        match self {
            KeyType::Ed25519 => 0x01,
        }
    }

    pub fn from_tag(tag: u8) -> CResult<Self> {
        match tag {
            0x01 => Ok(KeyType::Ed25519),
            other => Err(SerializerError::InvalidValue(format!("unknown key type tag {other:#04x}")).into()),
        }
    }
}

/// A 33-byte public key: one type tag byte followed by 32 raw
/// Ed25519 key bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey {
    key_type: KeyType,
    raw: [u8; 32],
}

impl std::hash::Hash for KeyType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.tag().hash(state)
    }
}

impl PartialOrd for KeyType {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyType {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.tag().cmp(&other.tag())
    }
}

impl PublicKey {
    pub const SIZE: usize = 33;

    pub fn from_dalek(verifying_key: &ed25519_dalek::VerifyingKey) -> Self {
        PublicKey {
            key_type: KeyType::Ed25519,
            raw: verifying_key.to_bytes(),
        }
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn raw_bytes(&self) -> &[u8; 32] {
        &self.raw
    }

    /// `UserId = SHA256(full serialized public key)`.
    pub fn derive_user_id(&self) -> Hash {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.push(self.key_type.tag());
        buf.extend_from_slice(&self.raw);
        Hash::sha256(&buf)
    }

    /// `MinerId = raw Ed25519 public key bytes`, i.e. the key with its
    /// type tag stripped.
    pub fn derive_miner_id(&self) -> [u8; 32] {
        self.raw
    }

    fn to_dalek(&self) -> CResult<ed25519_dalek::VerifyingKey> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.raw)
            .map_err(|e| Error::crypto(format!("invalid ed25519 public key: {e}")))
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        use ed25519_dalek::Verifier;
        match self.to_dalek() {
            Ok(key) => key.verify(message, &signature.to_dalek()).is_ok(),
            Err(_) => false,
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.push(self.key_type.tag());
        buf.extend_from_slice(&self.raw);
        write!(f, "{}", encoding::encode(&buf))
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; Self::SIZE] = encoding::decode_exact(s)?;
        let key_type = KeyType::from_tag(bytes[0])?;
        let mut raw = [0u8; 32];
        raw.copy_from_slice(&bytes[1..]);
        Ok(PublicKey { key_type, raw })
    }
}

impl Codec for PublicKey {
    fn encode(&self, s: &mut Serializer) {
        s.put_u8(self.key_type.tag());
        s.put_array(&self.raw);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let key_type = KeyType::from_tag(s.get_u8()?)?;
        let raw = s.get_array()?;
        Ok(PublicKey { key_type, raw })
    }
}
