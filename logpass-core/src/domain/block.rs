//! The append-only block chain: a header carrying hash links and the
//! next-miners snapshot, a body summarizing the block's transactions,
//! and the transaction-id chunks those summaries point at.

use crate::crypto::{Hash, MinerId, TransactionId};
use crate::error::CResult;
use crate::serializer::{Codec, Serializer};

/// A snapshot of the upcoming miners queue, one entry per block that
/// will be allowed to close with a `Commit`.
pub type MinersQueue = Vec<MinerId>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub id: u32,
    pub depth: u32,
    pub previous_hash: Hash,
    pub body_hash: Hash,
    pub miners_queue: MinersQueue,
}

impl BlockHeader {
    pub fn hash(&self) -> Hash {
        let mut s = Serializer::new();
        self.encode(&mut s);
        Hash::sha256(s.as_slice())
    }
}

impl Codec for BlockHeader {
    fn encode(&self, s: &mut Serializer) {
        s.put_u32(self.id);
        s.put_u32_le(self.depth);
        self.previous_hash.encode(s);
        self.body_hash.encode(s);
        s.put_u8(self.miners_queue.len() as u8);
        for miner in &self.miners_queue {
            miner.encode(s);
        }
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let id = s.get_u32()?;
        let depth = s.get_u32_le()?;
        let previous_hash = Hash::decode(s)?;
        let body_hash = Hash::decode(s)?;
        let count = s.get_u8()? as usize;
        let mut miners_queue = Vec::with_capacity(count);
        for _ in 0..count {
            miners_queue.push(MinerId::decode(s)?);
        }
        Ok(BlockHeader { id, depth, previous_hash, body_hash, miners_queue })
    }
}

/// Summarizes a block's transactions without repeating their full
/// ids: one hash per transaction-id chunk, plus the total count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockBody {
    pub chunk_hashes: Vec<Hash>,
    pub transaction_count: u32,
}

impl BlockBody {
    pub fn hash(&self) -> Hash {
        let mut s = Serializer::new();
        self.encode(&mut s);
        Hash::sha256(s.as_slice())
    }
}

impl Codec for BlockBody {
    fn encode(&self, s: &mut Serializer) {
        s.put_u16(self.chunk_hashes.len() as u16);
        for hash in &self.chunk_hashes {
            hash.encode(s);
        }
        s.put_u32_le(self.transaction_count);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let count = s.get_u16()? as usize;
        let mut chunk_hashes = Vec::with_capacity(count);
        for _ in 0..count {
            chunk_hashes.push(Hash::decode(s)?);
        }
        let transaction_count = s.get_u32_le()?;
        Ok(BlockBody { chunk_hashes, transaction_count })
    }
}

/// An ordered run of transaction ids belonging to one block. Stored in
/// fixed-size chunks so a block's full transaction list can be paged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockTransactionIds {
    pub ids: Vec<TransactionId>,
}

impl BlockTransactionIds {
    pub fn hash(&self) -> Hash {
        let mut s = Serializer::new();
        self.encode(&mut s);
        Hash::sha256(s.as_slice())
    }
}

impl Codec for BlockTransactionIds {
    fn encode(&self, s: &mut Serializer) {
        s.put_u32(self.ids.len() as u32);
        for id in &self.ids {
            id.encode(s);
        }
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let count = s.get_u32()? as usize;
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            ids.push(TransactionId::decode(s)?);
        }
        Ok(BlockTransactionIds { ids })
    }
}

/// The full reconstructed block: header, body, and its transaction-id
/// chunks, verified to hash-chain together by whoever assembles one
/// (see `facade::blocks::get`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub body: BlockBody,
    pub transaction_id_chunks: Vec<BlockTransactionIds>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let header = BlockHeader {
            id: 5,
            depth: 5,
            previous_hash: Hash::sha256(b"prev"),
            body_hash: Hash::sha256(b"body"),
            miners_queue: vec![MinerId::from_bytes([1u8; 32]), MinerId::from_bytes([2u8; 32])],
        };
        let mut s = Serializer::new();
        header.encode(&mut s);
        let mut s = Serializer::from_bytes(s.into_bytes());
        assert_eq!(BlockHeader::decode(&mut s).unwrap(), header);
    }

    #[test]
    fn body_hash_is_deterministic() {
        let body = BlockBody { chunk_hashes: vec![Hash::sha256(b"chunk")], transaction_count: 3 };
        assert_eq!(body.hash(), body.clone().hash());
    }
}
