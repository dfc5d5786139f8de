//! Stateless read/write helpers over the `transactions` +
//! `transaction_hashes` columns, enforcing the duplication-hash
//! invariant: every committed transaction also records a
//! `{blockId, duplicationHash}` marker so a later transaction signing
//! over the same hash is rejected as a replay.

use crate::columns::keys::{TransactionHashKey, TransactionRecord};
use crate::columns::Columns;
use crate::crypto::{Hash, TransactionId};
use crate::error::CResult;

pub fn get(columns: &Columns, confirmed: bool, id: &TransactionId) -> CResult<Option<Vec<u8>>> {
    Ok(columns.transactions.get(confirmed, id)?.map(|record| record.bytes))
}

pub fn has(columns: &Columns, confirmed: bool, id: &TransactionId) -> CResult<bool> {
    Ok(columns.transactions.get(confirmed, id)?.is_some())
}

pub fn has_hash(columns: &Columns, confirmed: bool, transaction_block_id: u32, hash: Hash) -> CResult<bool> {
    Ok(columns.transaction_hashes.get(confirmed, &TransactionHashKey(transaction_block_id, hash))?.is_some())
}

/// Records a committed transaction's bytes plus its duplication-hash
/// marker, and bumps the running count used by [`new_transactions_count`].
pub fn add(columns: &Columns, id: TransactionId, block_id: u32, bytes: Vec<u8>, duplication_hash: Hash) {
    columns.transactions.put(&id, TransactionRecord { committed_in: block_id, bytes });
    columns.transaction_hashes.put(&TransactionHashKey(id.block_id(), duplication_hash), ());
    let mut state = columns.transactions_state.get(false);
    state.count += 1;
    columns.transactions_state.set_unconfirmed(state);
}

pub fn count(columns: &Columns, confirmed: bool) -> u64 {
    columns.transactions_state.get(confirmed).count
}

/// Transactions added to the in-progress block but not yet committed —
/// what `Commit::validate` checks against its claimed transaction
/// count, and what the "already received a reward" check would scan
/// for `Commit`'s own type if this crate tracked counts per type
/// (it instead uses `facade::state::commit_seen`, see `DESIGN.md`).
pub fn new_transactions_count(columns: &Columns) -> u64 {
    count(columns, false) - count(columns, true)
}
