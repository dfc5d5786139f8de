//! Opens the on-disk embedded LSM store with the column family layout
//! and tunables that make one-L0-file-per-committed-block rollback
//! correctness possible: `atomic_flush`, level-style compaction with
//! L0 trigger thresholds pinned to `5 * rollbackableBlocks`, and the
//! "Append" merge operator on the three paged-log columns.
//!
//! Column family names are compatibility-critical and must match
//! [`crate::columns::Columns::open`] exactly.

use std::path::Path;

use rocksdb::{ColumnFamilyDescriptor, DBCompactionStyle, MergeOperands, Options, DB};

use crate::config::DATABASE_ROLLBACKABLE_BLOCKS;
use crate::error::CResult;

/// Column families carrying a paged append log, requiring the
/// "Append" merge operator (see [`crate::columns::paged_log::PagedLog::prepare`]).
const MERGED_COLUMNS: &[&str] = &["user_history", "user_sponsors", "storage_entries"];

const COLUMN_FAMILIES: &[&str] = &[
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

/// Concatenates the existing value (or merge operands seen so far)
/// with every new operand, in order. Used for the paged append logs:
/// a page's bytes are the concatenation of every record appended to it.
fn append_merge(_key: &[u8], existing: Option<&[u8]>, operands: &MergeOperands) -> Option<Vec<u8>> {
    let mut result = Vec::with_capacity(existing.map_or(0, <[u8]>::len));
    if let Some(existing) = existing {
        result.extend_from_slice(existing);
    }
    for operand in operands.iter() {
        result.extend_from_slice(operand);
    }
    Some(result)
}

fn column_options(name: &str) -> Options {
    let mut opts = Options::default();
    if MERGED_COLUMNS.contains(&name) {
        opts.set_merge_operator_associative("Append", append_merge);
    }
    if name == "transaction_hashes" {
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
    }
    opts
}

fn db_options() -> Options {
    let r = DATABASE_ROLLBACKABLE_BLOCKS as i32;
    let level0_trigger = 5 * r;

    let mut opts = Options::default();
    opts.create_if_missing(true);
    opts.create_missing_column_families(true);
    opts.set_paranoid_checks(true);
    opts.set_atomic_flush(true);
    opts.set_num_levels(6);
    opts.set_compaction_style(DBCompactionStyle::Level);
    opts.set_level_zero_file_num_compaction_trigger(level0_trigger);
    opts.set_level_zero_slowdown_writes_trigger(level0_trigger);
    opts.set_level_zero_stop_writes_trigger(level0_trigger);
    opts
}

/// Opens (or creates) the database directory at `path` with every
/// column family the state engine uses.
pub fn open(path: impl AsRef<Path>) -> CResult<DB> {
    let descriptors = COLUMN_FAMILIES.iter().map(|name| ColumnFamilyDescriptor::new(*name, column_options(name)));
    let db = DB::open_cf_descriptors(&db_options(), path, descriptors)?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_every_declared_column_family() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(dir.path()).unwrap();
        for name in COLUMN_FAMILIES {
            assert!(db.cf_handle(name).is_some(), "missing column family {name}");
        }
    }

    #[test]
    fn reopen_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = open(dir.path()).unwrap();
            let cf = db.cf_handle("users").unwrap();
            db.put_cf(&cf, b"k", b"v").unwrap();
        }
        let db = open(dir.path()).unwrap();
        let cf = db.cf_handle("users").unwrap();
        assert_eq!(db.get_cf(&cf, b"k").unwrap().as_deref(), Some(&b"v"[..]));
    }

    #[test]
    fn merge_column_concatenates_operands() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(dir.path()).unwrap();
        let cf = db.cf_handle("user_history").unwrap();
        db.merge_cf(&cf, b"page", b"abc").unwrap();
        db.merge_cf(&cf, b"page", b"def").unwrap();
        assert_eq!(db.get_cf(&cf, b"page").unwrap().as_deref(), Some(&b"abcdef"[..]));
    }
}
