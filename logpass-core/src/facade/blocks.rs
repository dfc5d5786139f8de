//! Stateless read/write helpers over the `blocks` column's three key
//! shapes (header, body, transaction-id chunk) plus its small recent-
//! blocks cache.

use crate::columns::keys::{assemble_block, BodyKey, ChunkKey};
use crate::columns::Columns;
use crate::config::BLOCKS_CACHE_SIZE;
use crate::domain::{Block, BlockBody, BlockHeader, BlockTransactionIds, MinersQueue};
use crate::error::CResult;

pub fn latest_block_id(columns: &Columns, confirmed: bool) -> u32 {
    columns.blocks_state.get(confirmed).latest_block_id
}

pub fn upcoming_miners_queue(columns: &Columns, confirmed: bool) -> MinersQueue {
    columns.blocks_state.get(confirmed).miners_queue
}

pub fn get_header(columns: &Columns, confirmed: bool, block_id: u32) -> CResult<Option<BlockHeader>> {
    columns.block_headers.get(confirmed, &block_id)
}

/// Reassembles the full block at `block_id`, or `None` if its header
/// is unknown. Single-chunk only: blocks are not split across more
/// than one transaction-id chunk by this implementation.
pub fn get(columns: &Columns, confirmed: bool, block_id: u32) -> CResult<Option<Block>> {
    let header = match columns.block_headers.get(confirmed, &block_id)? {
        Some(header) => header,
        None => return Ok(None),
    };
    let body = columns.block_bodies.get(confirmed, &BodyKey(block_id))?.unwrap_or(BlockBody {
        chunk_hashes: Vec::new(),
        transaction_count: 0,
    });
    let chunk = columns.block_chunks.get(confirmed, &ChunkKey(block_id, 0))?.unwrap_or_default();
    Ok(Some(assemble_block(header, body, vec![chunk])))
}

/// Closes a block: publishes its header, body and transaction-id
/// chunk, and rolls the recent-blocks cache and miners queue forward.
pub fn add(columns: &Columns, header: BlockHeader, body: BlockBody, ids: BlockTransactionIds) {
    let block_id = header.id;
    columns.block_headers.put(&block_id, header.clone());
    columns.block_bodies.put(&BodyKey(block_id), body.clone());
    columns.block_chunks.put(&ChunkKey(block_id, 0), ids);

    let mut state = columns.blocks_state.get(false);
    state.latest_block_id = block_id;
    state.miners_queue = header.miners_queue.clone();
    state.recent_headers.push(header);
    state.recent_bodies.push(body);
    if state.recent_headers.len() > BLOCKS_CACHE_SIZE {
        state.recent_headers.remove(0);
    }
    if state.recent_bodies.len() > BLOCKS_CACHE_SIZE {
        state.recent_bodies.remove(0);
    }
    columns.blocks_state.set_unconfirmed(state);
}
