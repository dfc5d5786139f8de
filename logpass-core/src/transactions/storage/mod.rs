//! Storage-namespace transactions: registering a [`crate::domain::Prefix`],
//! changing its access settings, and appending [`crate::domain::StorageEntry`]
//! values under it.

pub mod add_entry;
pub mod create_prefix;
pub mod update_prefix;
