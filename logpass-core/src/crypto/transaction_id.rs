use super::encoding;
use super::hash::Hash;
use crate::error::CResult;
use crate::serializer::{Codec, Serializer};
use std::fmt;
use std::str::FromStr;

/// A 39-byte transaction identifier: a 7-byte header (the block id the
/// transaction was committed in, its type byte, and its serialized
/// size, all big-endian so that ids sort by block then by position
/// within the header) followed by the 32-byte hash the transaction
/// signs over. Sorting by raw bytes therefore sorts by block id first,
/// which is what the transaction-hash garbage-collection column relies
/// on.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId {
    block_id: u32,
    transaction_type: u8,
    size: u16,
    hash: Hash,
}

impl TransactionId {
    pub const SIZE: usize = 7 + Hash::SIZE;

    pub fn new(block_id: u32, transaction_type: u8, size: u16, hash: Hash) -> Self {
        TransactionId { block_id, transaction_type, size, hash }
    }

    pub fn block_id(&self) -> u32 {
        self.block_id
    }

    pub fn transaction_type(&self) -> u8 {
        self.transaction_type
    }

    pub fn size(&self) -> u16 {
        self.size
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = Serializer::with_capacity(Self::SIZE);
        self.encode(&mut s);
        write!(f, "{}", encoding::encode(s.as_slice()))
    }
}

impl FromStr for TransactionId {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; Self::SIZE] = encoding::decode_exact(s)?;
        let mut ser = Serializer::from_bytes(bytes.to_vec());
        TransactionId::decode(&mut ser)
    }
}

impl Codec for TransactionId {
    fn encode(&self, s: &mut Serializer) {
        s.put_u32(self.block_id);
        s.put_u8(self.transaction_type);
        s.put_u16(self.size);
        self.hash.encode(s);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let block_id = s.get_u32()?;
        let transaction_type = s.get_u8()?;
        let size = s.get_u16()?;
        let hash = Hash::decode(s)?;
        Ok(TransactionId { block_id, transaction_type, size, hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_by_block_id_first() {
        let a = TransactionId::new(1, 0x10, 10, Hash::sha256(b"a"));
        let b = TransactionId::new(2, 0x01, 1, Hash::sha256(b"z"));
        assert!(a < b);
    }

    #[test]
    fn string_round_trips() {
        let id = TransactionId::new(7, 0x20, 128, Hash::sha256(b"tx"));
        let s = id.to_string();
        assert_eq!(TransactionId::from_str(&s).unwrap(), id);
    }
}
