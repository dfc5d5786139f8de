//! The small per-column state headers persisted under the empty key
//! (see [`crate::columns::state::ColumnState`]).

use crate::crypto::MinerId;
use crate::domain::{BlockBody, BlockHeader, MinersQueue};
use crate::error::CResult;
use crate::serializer::{Codec, Serializer};

const STATE_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultState {
    pub version: u8,
    pub pricing: i16,
    /// Set once a `Commit` has been executed against the in-progress
    /// block, so a second one is rejected without re-deriving a count
    /// from the transactions column (spec §9 open question).
    pub commit_seen: bool,
    /// Set by `Init`; zero until the genesis block executes.
    pub initialization_time: u64,
    pub block_interval: u32,
}

impl Default for DefaultState {
    fn default() -> Self {
        DefaultState {
            version: STATE_VERSION,
            pricing: 0,
            commit_seen: false,
            initialization_time: 0,
            block_interval: 0,
        }
    }
}

impl Codec for DefaultState {
    fn encode(&self, s: &mut Serializer) {
        s.put_u8(self.version);
        s.put_i16(self.pricing);
        s.put_u8(self.commit_seen as u8);
        s.put_u64_le(self.initialization_time);
        s.put_u32_le(self.block_interval);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(DefaultState {
            version: s.get_u8()?,
            pricing: s.get_i16()?,
            commit_seen: s.get_u8()? != 0,
            initialization_time: s.get_u64_le()?,
            block_interval: s.get_u32_le()?,
        })
    }
}

/// Cache of the last `minersQueueSize + rollbackableBlocks` headers
/// and bodies, so recent blocks can be served without a store read,
/// plus the upcoming miners queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlocksState {
    pub latest_block_id: u32,
    pub miners_queue: MinersQueue,
    pub recent_headers: Vec<BlockHeader>,
    pub recent_bodies: Vec<BlockBody>,
}

impl Codec for BlocksState {
    fn encode(&self, s: &mut Serializer) {
        s.put_u32_le(self.latest_block_id);
        s.put_u16_le(self.miners_queue.len() as u16);
        for miner in &self.miners_queue {
            miner.encode(s);
        }
        s.put_u16_le(self.recent_headers.len() as u16);
        for header in &self.recent_headers {
            header.encode(s);
        }
        s.put_u16_le(self.recent_bodies.len() as u16);
        for body in &self.recent_bodies {
            body.encode(s);
        }
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let latest_block_id = s.get_u32_le()?;
        let queue_len = s.get_u16_le()? as usize;
        let mut miners_queue = Vec::with_capacity(queue_len);
        for _ in 0..queue_len {
            miners_queue.push(MinerId::decode(s)?);
        }
        let headers_len = s.get_u16_le()? as usize;
        let mut recent_headers = Vec::with_capacity(headers_len);
        for _ in 0..headers_len {
            recent_headers.push(BlockHeader::decode(s)?);
        }
        let bodies_len = s.get_u16_le()? as usize;
        let mut recent_bodies = Vec::with_capacity(bodies_len);
        for _ in 0..bodies_len {
            recent_bodies.push(BlockBody::decode(s)?);
        }
        Ok(BlocksState { latest_block_id, miners_queue, recent_headers, recent_bodies })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MinersState {
    pub count: u64,
    /// Sum of every miner's `stake` field, maintained incrementally so
    /// `CommitTransaction`'s reward formula can read it in O(1) rather
    /// than scanning the column.
    pub total_staked: u64,
}

impl Codec for MinersState {
    fn encode(&self, s: &mut Serializer) {
        s.put_u64_le(self.count);
        s.put_u64_le(self.total_staked);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(MinersState { count: s.get_u64_le()?, total_staked: s.get_u64_le()? })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoragePrefixesState {
    pub prefixes: u64,
}

impl Codec for StoragePrefixesState {
    fn encode(&self, s: &mut Serializer) {
        s.put_u64_le(self.prefixes);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(StoragePrefixesState { prefixes: s.get_u64_le()? })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageEntriesState {
    pub entries: u64,
}

impl Codec for StorageEntriesState {
    fn encode(&self, s: &mut Serializer) {
        s.put_u64_le(self.entries);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(StorageEntriesState { entries: s.get_u64_le()? })
    }
}

/// `blockId` beyond which `transaction_hashes` entries recorded at or
/// before it have been garbage collected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionHashesState {
    pub gc_floor: u32,
}

impl Codec for TransactionHashesState {
    fn encode(&self, s: &mut Serializer) {
        s.put_u32_le(self.gc_floor);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(TransactionHashesState { gc_floor: s.get_u32_le()? })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionsState {
    pub count: u64,
}

impl Codec for TransactionsState {
    fn encode(&self, s: &mut Serializer) {
        s.put_u64_le(self.count);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(TransactionsState { count: s.get_u64_le()? })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsersState {
    pub count: u64,
    /// Sum of every user's `tokens` balance, maintained incrementally
    /// for the same reason as `MinersState::total_staked`.
    pub total_tokens: u64,
}

impl Codec for UsersState {
    fn encode(&self, s: &mut Serializer) {
        s.put_u64_le(self.count);
        s.put_u64_le(self.total_tokens);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        Ok(UsersState { count: s.get_u64_le()?, total_tokens: s.get_u64_le()? })
    }
}

/// Empty state headers for columns with nothing beyond the version
/// byte to persist: all bookkeeping lives in the paged log itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmptyState;

impl Codec for EmptyState {
    fn encode(&self, _s: &mut Serializer) {}

    fn decode(_s: &mut Serializer) -> CResult<Self> {
        Ok(EmptyState)
    }
}
