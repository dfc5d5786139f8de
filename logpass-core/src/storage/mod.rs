//! The embedded LSM store: column family names, tuning, and the
//! concatenating merge operator shared by the paged history columns.

pub mod merge;

use crate::config::DATABASE_ROLLBACKABLE_BLOCKS as R;
use crate::error::CResult;
use rocksdb::{ColumnFamilyDescriptor, Options, DB};
use std::path::Path;

/// Column family names, in the compatibility-critical order the
/// on-disk layout is specified in.
pub const COLUMN_FAMILIES: &[&str] = &[
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

/// Columns whose values are bounded-length homogeneous record streams,
/// appended to with the `Append` merge operator rather than overwritten.
const MERGE_COLUMN_FAMILIES: &[&str] = &["user_history", "user_sponsors", "storage_entries"];

fn base_options() -> Options {
    let mut opts = Options::default();
    opts.create_if_missing(true);
    opts.create_missing_column_families(true);
    opts.set_paranoid_checks(true);
    opts.set_atomic_flush(true);
    opts.set_write_buffer_size(1024 * 1024 * 1024);
    opts.set_max_write_buffer_number(20);
    opts.set_max_background_jobs(4);
    opts.set_max_subcompactions(4);
    // One L0 SST per committed block per column family: compaction must
    // not kick in until well past the rollback horizon, or the
    // newest-R-files invariant rollback relies on breaks.
    let trigger = (5 * R) as i32;
    opts.set_level_zero_file_num_compaction_trigger(trigger);
    opts.set_level_zero_slowdown_writes_trigger(trigger);
    opts.set_level_zero_stop_writes_trigger(trigger);
    opts
}

fn column_family_options(name: &str) -> Options {
    let mut opts = base_options();
    if name == "transaction_hashes" {
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
    }
    if MERGE_COLUMN_FAMILIES.contains(&name) {
        opts.set_merge_operator_associative("Append", merge::append_merge);
    }
    opts
}

/// Opens (creating if absent) the on-disk store at `path` with every
/// column family the state engine needs.
pub fn open(path: impl AsRef<Path>) -> CResult<DB> {
    let mut db_opts = base_options();
    db_opts.create_missing_column_families(true);
    let descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
        .iter()
        .map(|name| ColumnFamilyDescriptor::new(*name, column_family_options(name)))
        .collect();
    db_opts.create_if_missing(true);
    let db = DB::open_cf_descriptors(&db_opts, path, descriptors)?;
    Ok(db)
}
