//! Column-key and record newtypes that don't belong in the domain
//! model proper — they describe storage layout, not ledger semantics.

use crate::crypto::{Hash, UserId};
use crate::domain::{Block, BlockBody, BlockHeader, BlockTransactionIds};
use crate::error::CResult;
use crate::serializer::{Codec, Serializer};
use std::collections::BTreeSet;

/// `{blockId, 'B'}` — a block body's key in the `blocks` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BodyKey(pub u32);

impl Codec for BodyKey {
    fn encode(&self, s: &mut Serializer) {
        s.put_u32(self.0);
        s.put_u8(b'B');
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let id = s.get_u32()?;
        let _tag = s.get_u8()?;
        Ok(BodyKey(id))
    }
}

/// `{blockId, 'T', chunkIdx}` — a transaction-id chunk's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChunkKey(pub u32, pub u16);

impl Codec for ChunkKey {
    fn encode(&self, s: &mut Serializer) {
        s.put_u32(self.0);
        s.put_u8(b'T');
        s.put_u16(self.1);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let id = s.get_u32()?;
        let _tag = s.get_u8()?;
        let chunk = s.get_u16()?;
        Ok(ChunkKey(id, chunk))
    }
}

/// `{prefix, key}` — a storage entry's key in `storage_entries`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StorageEntryKey {
    pub prefix: String,
    pub key: Vec<u8>,
}

impl Codec for StorageEntryKey {
    fn encode(&self, s: &mut Serializer) {
        s.put_string_u8(&self.prefix).expect("prefix id bounded by PREFIX_MAX_ID_LENGTH");
        s.put_bytes_u16(&self.key).expect("storage entry key bounded by STORAGE_ENTRY_MAX_VALUE_LENGTH");
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let prefix = s.get_string_u8()?;
        let key = s.get_bytes_u16()?;
        Ok(StorageEntryKey { prefix, key })
    }
}

/// `{blockId, hash}` — a transaction duplication marker's key in
/// `transaction_hashes`. Prefixing with the block id lets the garbage
/// collector drop every marker for blocks older than the expiry
/// window with one range delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TransactionHashKey(pub u32, pub Hash);

impl Codec for TransactionHashKey {
    fn encode(&self, s: &mut Serializer) {
        s.put_u32(self.0);
        self.1.encode(s);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let block_id = s.get_u32()?;
        let hash = Hash::decode(s)?;
        Ok(TransactionHashKey(block_id, hash))
    }
}

/// A committed transaction as stored in the `transactions` column:
/// the serialized [`crate::transactions::Transaction`] alongside the
/// block id it was committed in.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub committed_in: u32,
    pub bytes: Vec<u8>,
}

impl Codec for TransactionRecord {
    fn encode(&self, s: &mut Serializer) {
        s.put_u32_le(self.committed_in);
        s.put_raw(&self.bytes);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let committed_in = s.get_u32_le()?;
        let bytes = s.get_raw(s.remaining())?;
        Ok(TransactionRecord { committed_in, bytes })
    }
}

/// The set of user ids touched by a block, keyed by `blockId` in
/// `user_updates` — lets a follower preload exactly the accounts a
/// historical block's transactions will need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserIdSet(pub BTreeSet<UserId>);

impl Codec for UserIdSet {
    fn encode(&self, s: &mut Serializer) {
        s.put_set_u8(&self.0, |s, id| id.encode(s)).expect("block-touched user count is not adversarial");
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(UserIdSet(s.get_set_u8(UserId::decode)?))
    }
}

/// Reassembles a cached header/body pair and its transaction-id chunks
/// into a full [`Block`].
pub fn assemble_block(header: BlockHeader, body: BlockBody, chunks: Vec<BlockTransactionIds>) -> Block {
    Block { header, body, transaction_id_chunks: chunks }
}
