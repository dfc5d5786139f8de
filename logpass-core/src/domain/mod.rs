//! The ledger's entity types: accounts (users, miners), the append-only
//! block chain, the key/value storage layer exposed to transactions,
//! and the small fixed-width history records kept per user.

pub mod block;
pub mod miner;
pub mod miner_settings;
pub mod power_level;
pub mod prefix;
pub mod storage_entry;
pub mod user;
pub mod user_history;
pub mod user_keys;
pub mod user_security_rules;
pub mod user_settings;
pub mod user_sponsor;
pub mod user_supervisors;

pub use block::{Block, BlockHeader, BlockBody, BlockTransactionIds, MinersQueue};
pub use miner::Miner;
pub use miner_settings::MinerSettings;
pub use power_level::PowerLevel;
pub use prefix::{Prefix, PrefixSettings};
pub use storage_entry::StorageEntry;
pub use user::{PendingUpdate, User};
pub use user_history::{UserHistory, UserHistoryType};
pub use user_keys::{KeySettings, Scopes, UserKeys};
pub use user_security_rules::UserSecurityRules;
pub use user_settings::UserSettings;
pub use user_sponsor::UserSponsor;
pub use user_supervisors::{SupervisorSettings, UserSupervisors};
