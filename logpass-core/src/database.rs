//! The per-block pipeline and commit/rollback protocol tying the
//! column families together: `clear` → `preload` → `validate`/`execute`
//! per transaction → `commit`, with rollback implemented as deletion
//! of the newest L0 SST file per column family.
//!
//! Rollback correctness rests on one invariant: every `commit` issues
//! exactly one flush per column family (`atomic_flush = true`), so
//! each committed block produces exactly one new L0 file per column.
//! Compaction is steered (never disabled outright) to always keep at
//! least `rollbackable_blocks` L0 files per column, via the level0
//! trigger thresholds set in [`crate::storage`].

use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};

use rocksdb::{WriteBatch, WriteOptions, DB};

use crate::columns::Columns;
use crate::config::Config;
use crate::crypto::UserId;
use crate::error::{CResult, Error};
use crate::filesystem;
use crate::runtime::Worker;
use crate::transactions::Transaction;

const COLUMN_FAMILY_NAMES: &[&str] = &[
    "default",
    "blocks",
    "miners",
    "storage_entries",
    "storage_prefixes",
    "transaction_hashes",
    "transactions",
    "user_history",
    "user_sponsors",
    "user_updates",
    "users",
];

pub struct Database {
    db: Arc<DB>,
    columns: Columns,
    config: Config,
    background: Worker,
    last_flush: Mutex<Option<Receiver<()>>>,
}

impl Database {
    /// Opens `<root>/database/`, creating it if missing.
    pub fn open(root: impl AsRef<Path>, config: Config) -> CResult<Self> {
        let dir = filesystem::database_dir(root.as_ref());
        filesystem::ensure_dir(&dir)?;
        let db = Arc::new(crate::storage::open(&dir)?);
        let columns = Columns::open(db.clone())?;
        Ok(Database {
            db,
            columns,
            config,
            background: Worker::spawn("logpass-db-flush"),
            last_flush: Mutex::new(None),
        })
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    /// Discards any staged mutations left over from a previous,
    /// abandoned block attempt.
    pub fn clear(&self) {
        self.columns.clear();
    }

    /// Pre-touches the users every candidate transaction in `block_id`
    /// will need, in one batched read, before validation starts.
    pub fn preload(&self, _block_id: u32, transactions: &[Transaction]) {
        let mut ids: Vec<UserId> = Vec::new();
        for tx in transactions {
            if !ids.contains(&tx.user_id()) {
                ids.push(tx.user_id());
            }
            if let Some(sponsor_id) = tx.signatures.sponsor_id {
                if !ids.contains(&sponsor_id) {
                    ids.push(sponsor_id);
                }
            }
        }
        let _ = self.columns.users.multi_get(false, &ids);
    }

    /// Validates `tx` against the unconfirmed view for `block_id`,
    /// then, on success, executes it, staging its mutations.
    pub fn validate_and_execute(&self, block_id: u32, tx: Transaction) -> CResult<()> {
        if tx.id.size() == 0 || tx.id.size() as usize > self.config.transaction_max_size {
            return Err(Error::transaction_validation("transaction size out of bounds"));
        }
        tx.validate(block_id, &self.columns)?;
        tx.execute(block_id, &self.columns)
    }

    fn cf_handles(&self) -> Vec<&rocksdb::ColumnFamily> {
        COLUMN_FAMILY_NAMES.iter().map(|name| self.db.cf_handle(name).expect("opened at open()")).collect()
    }

    /// Serializes staged mutations into one batch, applies it without
    /// waiting on the WAL (durability comes from the flush this
    /// enqueues), promotes every column's confirmed view, and kicks
    /// off the background flush/compaction-steering task.
    pub fn commit(&self, _block_id: u32) -> CResult<()> {
        let mut batch = WriteBatch::default();
        self.columns.prepare(&mut batch);

        if let Some(previous) = self.last_flush.lock().expect("lock poisoned").take() {
            let _ = previous.recv();
        }

        let mut write_opts = WriteOptions::default();
        write_opts.disable_wal(true);
        write_opts.set_sync(false);
        self.db.write_opt(batch, &write_opts)?;

        self.columns.commit();

        let (tx, rx) = mpsc::channel();
        let db = self.db.clone();
        let rollbackable_blocks = self.config.rollbackable_blocks as i32;
        self.background.submit(move || {
            let cfs: Vec<&rocksdb::ColumnFamily> =
                COLUMN_FAMILY_NAMES.iter().map(|name| db.cf_handle(name).expect("opened at open()")).collect();
            let _ = db.flush_cfs(&cfs);

            if let Ok(files) = db.live_files() {
                let mut by_cf: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
                for file in files.iter().filter(|f| f.level == 0) {
                    *by_cf.entry(file.column_family_name.as_str()).or_default() += 1;
                }
                if let Some((busiest, count)) = by_cf.iter().max_by_key(|(_, count)| **count) {
                    if *count as i32 > rollbackable_blocks {
                        if let Some(cf) = db.cf_handle(busiest) {
                            db.compact_range_cf(&cf, None::<&[u8]>, None::<&[u8]>);
                        }
                    }
                }
            }
            let _ = tx.send(());
        });
        *self.last_flush.lock().expect("lock poisoned") = Some(rx);

        Ok(())
    }

    /// Scans every column family's L0 files newest-to-oldest and
    /// returns the number of newest blocks that can currently be rolled
    /// back: the minimum, over all columns, of that column's L0 file
    /// count, capped at `rollbackable_blocks`. A column with a
    /// compaction currently pending contributes zero — its L0 set
    /// cannot be assumed stable while a compaction is in flight, which
    /// is exactly the race `commit()`'s own background compaction-
    /// steering task could otherwise cause. The whole scan is
    /// bracketed with auto-compaction disabled so the count can't be
    /// invalidated between being read and being acted on by the
    /// caller. Shared by both [`Database::get_max_rollback_depth`] and
    /// [`Database::rollback`], which must agree on the same ceiling.
    fn preserved_l0_frontier(&self) -> usize {
        for name in COLUMN_FAMILY_NAMES {
            if let Some(cf) = self.db.cf_handle(name) {
                let _ = self.db.set_options_cf(&cf, &[("disable_auto_compactions", "true")]);
            }
        }

        let frontier = (|| {
            let files = self.db.live_files().ok()?;
            let mut counts: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
            for name in COLUMN_FAMILY_NAMES {
                counts.insert(name, 0);
            }
            for file in files.iter().filter(|f| f.level == 0) {
                *counts.entry(file.column_family_name.as_str()).or_default() += 1;
            }

            let mut frontier = self.config.rollbackable_blocks as usize;
            for name in COLUMN_FAMILY_NAMES {
                let cf = self.db.cf_handle(name)?;
                let pending = self.db.property_int_value_cf(&cf, "rocksdb.compaction-pending").ok().flatten().unwrap_or(0);
                let count = if pending != 0 { 0 } else { counts.get(name).copied().unwrap_or(0) };
                frontier = frontier.min(count);
            }
            Some(frontier)
        })()
        .unwrap_or(0);

        for name in COLUMN_FAMILY_NAMES {
            if let Some(cf) = self.db.cf_handle(name) {
                let _ = self.db.set_options_cf(&cf, &[("disable_auto_compactions", "false")]);
            }
        }

        frontier
    }

    /// The number of blocks that can currently be rolled back. See
    /// [`Database::preserved_l0_frontier`].
    pub fn get_max_rollback_depth(&self) -> u32 {
        self.preserved_l0_frontier() as u32
    }

    /// Rolls back the newest `blocks` committed blocks by deleting the
    /// newest L0 SST file of every column family. Returns `Ok(false)`
    /// (never an error) if fewer than `blocks` are available.
    pub fn rollback(&self, blocks: u32) -> CResult<bool> {
        if blocks == 0 {
            return Ok(true);
        }
        if blocks as usize > self.preserved_l0_frontier() {
            return Ok(false);
        }

        self.columns.clear();
        for name in COLUMN_FAMILY_NAMES {
            if let Some(cf) = self.db.cf_handle(name) {
                let _ = self.db.set_options_cf(&cf, &[("disable_auto_compactions", "true")]);
            }
        }

        let files = self.db.live_files()?;
        let mut by_cf: std::collections::BTreeMap<&str, Vec<&rocksdb::LiveFile>> = std::collections::BTreeMap::new();
        for file in files.iter().filter(|f| f.level == 0) {
            by_cf.entry(file.column_family_name.as_str()).or_default().push(file);
        }

        for files in by_cf.values_mut() {
            files.sort_by(|a, b| b.name.cmp(&a.name));
        }

        for name in COLUMN_FAMILY_NAMES {
            let Some(cf) = self.db.cf_handle(name) else { continue };
            let Some(files) = by_cf.get(name) else { continue };
            for file in files.iter().take(blocks as usize) {
                let mut end = file.end_key.clone().unwrap_or_default();
                end.push(0);
                if let (Some(start), true) = (&file.start_key, !end.is_empty()) {
                    let _ = self.db.delete_file_in_range_cf(&cf, start, &end);
                }
            }
        }

        for name in COLUMN_FAMILY_NAMES {
            if let Some(cf) = self.db.cf_handle(name) {
                let _ = self.db.set_options_cf(&cf, &[("disable_auto_compactions", "false")]);
            }
        }

        self.columns.load()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::PrivateKey;
    use crate::transactions::init::InitTransaction;

    fn open_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path(), Config::default()).unwrap();
        (dir, db)
    }

    #[test]
    fn commits_a_genesis_block() {
        let (_dir, db) = open_db();
        let key = PrivateKey::generate();
        let init = InitTransaction::create(1, 0, 1_717_200_000, 60).sign(&key);
        db.preload(1, std::slice::from_ref(&init));
        db.validate_and_execute(1, init).unwrap();
        db.commit(1).unwrap();

        assert_eq!(crate::facade::users::count(&db.columns, true), 1);
    }

    #[test]
    fn max_rollback_depth_grows_with_commits() {
        let (_dir, db) = open_db();
        let key = PrivateKey::generate();
        let init = InitTransaction::create(1, 0, 1_717_200_000, 60).sign(&key);
        db.validate_and_execute(1, init).unwrap();
        db.commit(1).unwrap();

        assert!(db.get_max_rollback_depth() >= 1);
    }

    #[test]
    fn rollback_beyond_available_depth_returns_false() {
        let (_dir, db) = open_db();
        let key = PrivateKey::generate();
        let init = InitTransaction::create(1, 0, 1_717_200_000, 60).sign(&key);
        db.validate_and_execute(1, init).unwrap();
        db.commit(1).unwrap();

        assert!(!db.rollback(1_000).unwrap());
    }
}
