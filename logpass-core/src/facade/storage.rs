//! Stateless read/write helpers over the `storage_prefixes` +
//! `storage_entries` columns (plus the per-prefix transaction-id log
//! backing `get_transactions_for_prefix`).

use crate::columns::keys::StorageEntryKey;
use crate::columns::Columns;
use crate::crypto::TransactionId;
use crate::domain::{Prefix, StorageEntry};
use crate::error::CResult;
use crate::serializer::{Codec, Serializer};

pub fn get_prefix(columns: &Columns, confirmed: bool, id: &str) -> CResult<Option<Prefix>> {
    columns.storage_prefixes.get(confirmed, &id.to_string())
}

pub fn prefix_exists(columns: &Columns, confirmed: bool, id: &str) -> CResult<bool> {
    Ok(columns.storage_prefixes.get(confirmed, &id.to_string())?.is_some())
}

pub fn add_prefix(columns: &Columns, prefix: Prefix) {
    columns.storage_prefixes.put(&prefix.id.clone(), prefix);
    let mut state = columns.storage_prefixes_state.get(false);
    state.prefixes += 1;
    columns.storage_prefixes_state.set_unconfirmed(state);
}

pub fn update_prefix(columns: &Columns, prefix: Prefix) {
    columns.storage_prefixes.put(&prefix.id.clone(), prefix);
}

pub fn prefixes_count(columns: &Columns, confirmed: bool) -> u64 {
    columns.storage_prefixes_state.get(confirmed).prefixes
}

pub fn get_entry(columns: &Columns, confirmed: bool, prefix: &str, key: &[u8]) -> CResult<Option<StorageEntry>> {
    columns.storage_entries.get(confirmed, &StorageEntryKey { prefix: prefix.to_string(), key: key.to_vec() })
}

pub fn entry_exists(columns: &Columns, confirmed: bool, prefix: &str, key: &[u8]) -> CResult<bool> {
    Ok(get_entry(columns, confirmed, prefix, key)?.is_some())
}

/// Stores the entry and appends its transaction id to the prefix's
/// per-page transaction log (`getTransasctionsForPrefix` in the
/// original system).
pub fn add_entry(columns: &Columns, prefix: &str, key: &[u8], entry: StorageEntry) -> CResult<()> {
    columns.storage_entries.put(&StorageEntryKey { prefix: prefix.to_string(), key: key.to_vec() }, entry);
    let mut s = Serializer::with_capacity(TransactionId::SIZE);
    entry.transaction_id.encode(&mut s);
    columns.storage_entries_log.append(prefix.as_bytes(), s.into_bytes())?;
    let mut state = columns.storage_entries_state.get(false);
    state.entries += 1;
    columns.storage_entries_state.set_unconfirmed(state);
    Ok(())
}

pub fn entries_count(columns: &Columns, confirmed: bool) -> u64 {
    columns.storage_entries_state.get(confirmed).entries
}

/// The one hundred transaction ids recorded on `page` of `prefix`'s
/// entry log.
pub fn transactions_for_prefix(columns: &Columns, confirmed: bool, prefix: &str, page: u32) -> CResult<Vec<TransactionId>> {
    let bytes = columns.storage_entries_log.read_page(confirmed, prefix.as_bytes(), page)?;
    let mut s = Serializer::from_bytes(bytes);
    let mut ids = Vec::new();
    while !s.is_empty_remaining() {
        ids.push(TransactionId::decode(&mut s)?);
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Hash, UserId};
    use std::sync::Arc;

    fn open_columns() -> (tempfile::TempDir, Columns) {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(crate::storage::open(dir.path()).unwrap());
        (dir, Columns::open(db).unwrap())
    }

    #[test]
    fn add_prefix_then_get_round_trips() {
        let (_dir, columns) = open_columns();
        let owner = UserId::from_bytes([1u8; 32]);
        let prefix = Prefix::create("demo".to_string(), owner, 1);
        add_prefix(&columns, prefix.clone());
        assert_eq!(get_prefix(&columns, false, "demo").unwrap().unwrap(), prefix);
        assert_eq!(prefixes_count(&columns, false), 1);
    }

    #[test]
    fn add_entry_appends_to_transaction_log() {
        let (_dir, columns) = open_columns();
        let id = TransactionId::new(1, 0x55, 64, Hash::sha256(b"entry"));
        add_entry(&columns, "demo", b"key", StorageEntry { id: 0, transaction_id: id }).unwrap();
        assert_eq!(entries_count(&columns, false), 1);
        let ids = transactions_for_prefix(&columns, false, "demo", 0).unwrap();
        assert_eq!(ids, vec![id]);
    }
}
