//! Global constants lifted into a single table, per the design's
//! re-architecture guidance (spec §9): these are network-compatibility
//! values, not independently chosen per deployment. Only `D`
//! (`STAKING_DURATION`) and `R` (`DATABASE_ROLLBACKABLE_BLOCKS`) are
//! given literal values in the originating design's testable-scenario
//! section; the remainder are assumed, internally-consistent values of
//! the same kind (matching the originating system's comment that they
//! are "assumed" rather than independently re-derived).

/// Number of power levels (LOWEST, LOW, MEDIUM, HIGH, HIGHEST).
pub const USER_POWER_LEVELS: usize = 5;
/// Ceiling on a user's raw accumulated power (fits in `u8`).
pub const MAX_POWER: u8 = 255;

/// Maximum number of keys a user account may hold.
pub const USER_MAX_KEYS: usize = 10;
/// Maximum number of supervisors a user account may hold.
pub const USER_MAX_SUPERVISORS: usize = 10;
/// Upper bound, in blocks, on any settings-update delay.
pub const USER_MAX_UPDATE_DELAY: u32 = 1_000_000;

pub const USER_MIN_FREE_TRANSACTIONS: u8 = 0;
pub const USER_MAX_FREE_TRANSACTIONS: u8 = 200;

/// Initial balance credited to the first (genesis) user.
pub const FIRST_USER_BALANCE: u64 = 1_000_000_000_000;
/// Initial stake credited to the first (genesis) miner.
pub const FIRST_USER_STAKE: u64 = 1_000_000_000_000;
/// Total token supply ceiling used for deterministic reward math and
/// the miner-endpoints cache sizing.
pub const TOTAL_NUMBER_OF_TOKENS: u64 = FIRST_USER_BALANCE + FIRST_USER_STAKE;

/// Number of daily buckets in a miner's locked-stake ring (`D`).
pub const STAKING_DURATION: usize = 56;
/// Number of recent blocks for which one-L0-file-per-block is
/// preserved, enabling rollback by file-segment deletion (`R`).
pub const DATABASE_ROLLBACKABLE_BLOCKS: u32 = 50;

/// Seconds between blocks.
pub const BLOCK_INTERVAL: u64 = 60;
/// Blocks per calendar day at `BLOCK_INTERVAL`.
pub const BLOCKS_PER_DAY: u32 = (24 * 60 * 60) / BLOCK_INTERVAL as u32;

/// Size of the upcoming-miners queue cached in the blocks column state.
pub const MINERS_QUEUE_SIZE: usize = 21;
/// Additional recent headers+bodies kept on top of the miners queue, so
/// a rollback of up to `R` blocks can still serve cached headers.
pub const BLOCKS_CACHE_SIZE: usize = MINERS_QUEUE_SIZE + DATABASE_ROLLBACKABLE_BLOCKS as usize;

/// Hard ceiling on a fully serialized transaction's byte size.
pub const TRANSACTION_MAX_SIZE: usize = 16 * 1024;
/// A transaction is rejected once `blockId >= submittedAt + this`.
pub const TRANSACTION_MAX_BLOCK_ID_DIFFERENCE: u32 = 100;

/// Base fee (pre pricing-scaling) charged for an ordinary transaction.
pub const TRANSACTION_FEE: u64 = 100;

/// Maximum number of users allowed on a storage prefix's allow-list.
pub const STORAGE_PREFIX_MAX_ALLOWED_USERS: usize = 32;
/// Maximum byte length of a storage entry's value.
pub const STORAGE_ENTRY_MAX_VALUE_LENGTH: usize = 8 * 1024;

/// Cache sizing for the miners column's "well known endpoints" map.
pub const MINER_ENDPOINTS_SIZE: usize = 10_000;
pub const MINER_ENDPOINTS_MINIMUM_STAKE: u64 = TOTAL_NUMBER_OF_TOKENS / MINER_ENDPOINTS_SIZE as u64;
/// Cache sizing for the miners column's top-stake set.
pub const TOP_MINERS_SIZE: usize = MINERS_QUEUE_SIZE * 2;

/// Once a committed block id exceeds `B + this`, transaction-hash
/// entries recorded under block id `B` are garbage collected.
pub const MAX_BLOCK_ID_DIFFERENCE: u32 = TRANSACTION_MAX_BLOCK_ID_DIFFERENCE;

/// A deployment-wide bundle of the above, allowing tests to exercise
/// alternate values without touching the constants directly. In
/// production a single canonical `Config::default()` is used; the
/// network-compatibility values above back it.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub rollbackable_blocks: u32,
    pub staking_duration: usize,
    pub miners_queue_size: usize,
    pub block_interval: u64,
    pub transaction_max_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rollbackable_blocks: DATABASE_ROLLBACKABLE_BLOCKS,
            staking_duration: STAKING_DURATION,
            miners_queue_size: MINERS_QUEUE_SIZE,
            block_interval: BLOCK_INTERVAL,
            transaction_max_size: TRANSACTION_MAX_SIZE,
        }
    }
}
