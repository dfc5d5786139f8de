//! `logpass-core` is the state engine of a Logpass node: a typed,
//! versioned, column-sharded embedded-LSM database that maintains a
//! confirmed view (committed and flushed blocks) and an unconfirmed
//! view (confirmed plus staged-for-the-next-block mutations), together
//! with the transaction validation/execution pipeline and the
//! commit/rollback protocol that ties the two views together.
//!
//! ## Getting started
//!
//! ```no_run
//! use logpass_core::config::Config;
//! use logpass_core::crypto::PrivateKey;
//! use logpass_core::database::Database;
//! use logpass_core::transactions::init::InitTransaction;
//!
//! fn main() -> logpass_core::error::CResult<()> {
//!     let config = Config::default();
//!     let mut db = Database::open("./data", config)?;
//!
//!     let key = PrivateKey::generate();
//!     let init = InitTransaction::create(1, 0, 1_700_000_000, 60).sign(&key);
//!
//!     db.preload(1, &[init.clone()]);
//!     db.validate_and_execute(1, init)?;
//!     db.commit(1)?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod serializer;
pub mod crypto;
pub mod domain;
pub mod transactions;
pub mod storage;
pub mod columns;
pub mod facade;
pub mod database;
pub mod filesystem;
pub mod runtime;
