//! Per-owner append-only logs of fixed-width records, paged 100 rows
//! per key and merge-appended via the `Append` operator (see
//! `crate::storage::merge`). Backs `user_history`, `user_sponsors`,
//! and `storage_entries`'s per-prefix transaction-id history.

use crate::error::CResult;
use rocksdb::{WriteBatch, DB};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub const PAGE_SIZE: u32 = 100;

pub struct PagedLog {
    cf_name: &'static str,
    db: Arc<DB>,
    record_size: usize,
    /// Lazily computed total row count per owner, as of the confirmed
    /// (durable) store — scanning every page once is the simplest
    /// correct way to recover a count the on-disk format doesn't
    /// track redundantly.
    confirmed_counts: RwLock<HashMap<Vec<u8>, u32>>,
    /// Rows appended this block, not yet merged into the store.
    staged_counts: RwLock<HashMap<Vec<u8>, u32>>,
    staged_pages: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl PagedLog {
    pub fn new(db: Arc<DB>, cf_name: &'static str, record_size: usize) -> Self {
        PagedLog {
            cf_name,
            db,
            record_size,
            confirmed_counts: RwLock::new(HashMap::new()),
            staged_counts: RwLock::new(HashMap::new()),
            staged_pages: RwLock::new(HashMap::new()),
        }
    }

    fn cf(&self) -> &rocksdb::ColumnFamily {
        self.db.cf_handle(self.cf_name).expect("column family registered at open()")
    }

    fn page_key(owner: &[u8], page: u32) -> Vec<u8> {
        let mut key = owner.to_vec();
        key.extend_from_slice(&page.to_be_bytes());
        key
    }

    fn confirmed_count(&self, owner: &[u8]) -> CResult<u32> {
        if let Some(count) = self.confirmed_counts.read().expect("lock poisoned").get(owner) {
            return Ok(*count);
        }
        let mut count = 0u32;
        let mut page = 0u32;
        loop {
            let key = Self::page_key(owner, page);
            match self.db.get_cf(self.cf(), &key)? {
                Some(bytes) => {
                    count += (bytes.len() / self.record_size) as u32;
                    page += 1;
                }
                None => break,
            }
        }
        self.confirmed_counts.write().expect("lock poisoned").insert(owner.to_vec(), count);
        Ok(count)
    }

    /// Total number of rows appended for `owner`, confirmed plus
    /// whatever has been staged for the in-progress block.
    pub fn count(&self, owner: &[u8]) -> CResult<u32> {
        let confirmed = self.confirmed_count(owner)?;
        let staged = self.staged_counts.read().expect("lock poisoned").get(owner).copied().unwrap_or(0);
        Ok(confirmed + staged)
    }

    /// Appends one pre-encoded record to `owner`'s log.
    pub fn append(&self, owner: &[u8], record: Vec<u8>) -> CResult<()> {
        debug_assert_eq!(record.len(), self.record_size);
        let index = self.count(owner)?;
        let page = index / PAGE_SIZE;
        let key = Self::page_key(owner, page);
        self.staged_pages.write().expect("lock poisoned").entry(key).or_default().extend_from_slice(&record);
        *self.staged_counts.write().expect("lock poisoned").entry(owner.to_vec()).or_insert(0) += 1;
        Ok(())
    }

    /// Raw bytes of one page, confirmed plus any staged tail.
    pub fn read_page(&self, confirmed: bool, owner: &[u8], page: u32) -> CResult<Vec<u8>> {
        let key = Self::page_key(owner, page);
        let mut bytes = self.db.get_cf(self.cf(), &key)?.unwrap_or_default();
        if !confirmed {
            if let Some(staged) = self.staged_pages.read().expect("lock poisoned").get(&key) {
                bytes.extend_from_slice(staged);
            }
        }
        Ok(bytes)
    }

    pub fn prepare(&self, batch: &mut WriteBatch) {
        for (key, value) in self.staged_pages.read().expect("lock poisoned").iter() {
            batch.merge_cf(self.cf(), key, value);
        }
    }

    pub fn commit(&self) {
        let mut confirmed = self.confirmed_counts.write().expect("lock poisoned");
        for (owner, delta) in self.staged_counts.write().expect("lock poisoned").drain() {
            *confirmed.entry(owner).or_insert(0) += delta;
        }
        self.staged_pages.write().expect("lock poisoned").clear();
    }

    pub fn clear(&self) {
        self.staged_counts.write().expect("lock poisoned").clear();
        self.staged_pages.write().expect("lock poisoned").clear();
    }
}
