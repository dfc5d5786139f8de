//! A Logpass node process: bootstrap, CLI argument parsing,
//! configuration file loading, logging initialization, and the
//! submission entry point wired onto `logpass-core`'s database.
//!
//! ## Getting started
//!
//! ```doc
//! ❯ ./logpass-node --data-dir ./data
//!
//! opened database at ./data/database
//! block 1: genesis accepted, id AQAAAA...
//! ```

pub mod config;
pub mod submission;
pub mod trace;
