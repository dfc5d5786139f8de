//! The eleven concrete column families, grouped behind one `Columns`
//! handle the facade layer and database orchestrator share.

pub mod column;
pub mod keys;
pub mod paged_log;
pub mod state;
pub mod states;

pub use column::Column;
pub use paged_log::PagedLog;
pub use state::ColumnState;

use crate::crypto::{MinerId, TransactionId, UserId};
use crate::domain::{BlockBody, BlockHeader, BlockTransactionIds, Miner, Prefix, StorageEntry, User, UserHistory, UserSponsor};
use crate::error::CResult;
use keys::{BodyKey, ChunkKey, StorageEntryKey, TransactionHashKey, TransactionRecord, UserIdSet};
use rocksdb::{WriteBatch, DB};
use states::*;
use std::sync::Arc;

pub struct Columns {
    pub db: Arc<DB>,

    pub default_state: ColumnState<DefaultState>,

    pub block_headers: Column<u32, BlockHeader>,
    pub block_bodies: Column<BodyKey, BlockBody>,
    pub block_chunks: Column<ChunkKey, BlockTransactionIds>,
    pub blocks_state: ColumnState<BlocksState>,

    pub miners: Column<MinerId, Miner>,
    pub miners_state: ColumnState<MinersState>,

    pub storage_entries: Column<StorageEntryKey, StorageEntry>,
    pub storage_entries_log: PagedLog,
    pub storage_entries_state: ColumnState<StorageEntriesState>,

    pub storage_prefixes: Column<String, Prefix>,
    pub storage_prefixes_state: ColumnState<StoragePrefixesState>,

    pub transaction_hashes: Column<TransactionHashKey, ()>,
    pub transaction_hashes_state: ColumnState<TransactionHashesState>,

    pub transactions: Column<TransactionId, TransactionRecord>,
    pub transactions_state: ColumnState<TransactionsState>,

    pub user_history: PagedLog,
    pub user_history_state: ColumnState<EmptyState>,

    pub user_sponsors: PagedLog,
    pub user_sponsors_state: ColumnState<EmptyState>,

    pub user_updates: Column<u32, UserIdSet>,
    pub user_updates_state: ColumnState<EmptyState>,

    pub users: Column<UserId, User>,
    pub users_state: ColumnState<UsersState>,
}

impl Columns {
    pub fn open(db: Arc<DB>) -> CResult<Self> {
        let columns = Columns {
            default_state: ColumnState::new(db.clone(), "default"),

            block_headers: Column::new(db.clone(), "blocks"),
            block_bodies: Column::new(db.clone(), "blocks"),
            block_chunks: Column::new(db.clone(), "blocks"),
            blocks_state: ColumnState::new(db.clone(), "blocks"),

            miners: Column::new(db.clone(), "miners"),
            miners_state: ColumnState::new(db.clone(), "miners"),

            storage_entries: Column::new(db.clone(), "storage_entries"),
            storage_entries_log: PagedLog::new(db.clone(), "storage_entries", TransactionId::SIZE),
            storage_entries_state: ColumnState::new(db.clone(), "storage_entries"),

            storage_prefixes: Column::new(db.clone(), "storage_prefixes"),
            storage_prefixes_state: ColumnState::new(db.clone(), "storage_prefixes"),

            transaction_hashes: Column::new(db.clone(), "transaction_hashes"),
            transaction_hashes_state: ColumnState::new(db.clone(), "transaction_hashes"),

            transactions: Column::new(db.clone(), "transactions"),
            transactions_state: ColumnState::new(db.clone(), "transactions"),

            user_history: PagedLog::new(db.clone(), "user_history", UserHistory::SIZE),
            user_history_state: ColumnState::new(db.clone(), "user_history"),

            user_sponsors: PagedLog::new(db.clone(), "user_sponsors", UserSponsor::SIZE),
            user_sponsors_state: ColumnState::new(db.clone(), "user_sponsors"),

            user_updates: Column::new(db.clone(), "user_updates"),
            user_updates_state: ColumnState::new(db.clone(), "user_updates"),

            users: Column::new(db.clone(), "users"),
            users_state: ColumnState::new(db.clone(), "users"),

            db,
        };
        columns.load()?;
        Ok(columns)
    }

    pub fn load(&self) -> CResult<()> {
        self.default_state.load()?;
        self.blocks_state.load()?;
        self.miners_state.load()?;
        self.storage_entries_state.load()?;
        self.storage_prefixes_state.load()?;
        self.transaction_hashes_state.load()?;
        self.transactions_state.load()?;
        self.user_history_state.load()?;
        self.user_sponsors_state.load()?;
        self.user_updates_state.load()?;
        self.users_state.load()?;
        Ok(())
    }

    pub fn prepare(&self, batch: &mut WriteBatch) {
        self.default_state.prepare(batch);

        self.block_headers.prepare(batch);
        self.block_bodies.prepare(batch);
        self.block_chunks.prepare(batch);
        self.blocks_state.prepare(batch);

        self.miners.prepare(batch);
        self.miners_state.prepare(batch);

        self.storage_entries.prepare(batch);
        self.storage_entries_log.prepare(batch);
        self.storage_entries_state.prepare(batch);

        self.storage_prefixes.prepare(batch);
        self.storage_prefixes_state.prepare(batch);

        self.transaction_hashes.prepare(batch);
        self.transaction_hashes_state.prepare(batch);

        self.transactions.prepare(batch);
        self.transactions_state.prepare(batch);

        self.user_history.prepare(batch);
        self.user_history_state.prepare(batch);

        self.user_sponsors.prepare(batch);
        self.user_sponsors_state.prepare(batch);

        self.user_updates.prepare(batch);
        self.user_updates_state.prepare(batch);

        self.users.prepare(batch);
        self.users_state.prepare(batch);
    }

    pub fn commit(&self) {
        self.default_state.commit();

        self.block_headers.commit();
        self.block_bodies.commit();
        self.block_chunks.commit();
        self.blocks_state.commit();

        self.miners.commit();
        self.miners_state.commit();

        self.storage_entries.commit();
        self.storage_entries_log.commit();
        self.storage_entries_state.commit();

        self.storage_prefixes.commit();
        self.storage_prefixes_state.commit();

        self.transaction_hashes.commit();
        self.transaction_hashes_state.commit();

        self.transactions.commit();
        self.transactions_state.commit();

        self.user_history.commit();
        self.user_history_state.commit();

        self.user_sponsors.commit();
        self.user_sponsors_state.commit();

        self.user_updates.commit();
        self.user_updates_state.commit();

        self.users.commit();
        self.users_state.commit();
    }

    pub fn clear(&self) {
        self.default_state.clear();

        self.block_headers.clear();
        self.block_bodies.clear();
        self.block_chunks.clear();
        self.blocks_state.clear();

        self.miners.clear();
        self.miners_state.clear();

        self.storage_entries.clear();
        self.storage_entries_log.clear();
        self.storage_entries_state.clear();

        self.storage_prefixes.clear();
        self.storage_prefixes_state.clear();

        self.transaction_hashes.clear();
        self.transaction_hashes_state.clear();

        self.transactions.clear();
        self.transactions_state.clear();

        self.user_history.clear();
        self.user_history_state.clear();

        self.user_sponsors.clear();
        self.user_sponsors_state.clear();

        self.user_updates.clear();
        self.user_updates_state.clear();

        self.users.clear();
        self.users_state.clear();
    }
}
