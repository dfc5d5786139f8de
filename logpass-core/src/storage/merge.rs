//! The `Append` merge operator: concatenates the existing value (or
//! the merge operands seen so far) with each incoming operand, in
//! order. Backs the paged history columns (`user_history`,
//! `user_sponsors`, `storage_entries`'s per-prefix transaction log),
//! each of which stores a page as one growing run of fixed-width
//! records.

use rocksdb::MergeOperands;

pub fn append_merge(_key: &[u8], existing: Option<&[u8]>, operands: &MergeOperands) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(existing.map_or(0, <[u8]>::len) + operands.iter().map(<[u8]>::len).sum::<usize>());
    if let Some(existing) = existing {
        out.extend_from_slice(existing);
    }
    for operand in operands.iter() {
        out.extend_from_slice(operand);
    }
    Some(out)
}
