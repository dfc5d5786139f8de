//! Confirmed/unconfirmed dual facades over [`crate::columns::Columns`].
//! Each submodule is a set of free functions taking `&Columns` plus a
//! `confirmed: bool` flag, rather than a pair of owning facade
//! objects — the teacher's stateless-helper style generalizes more
//! directly to this crate's single shared `Columns` handle than
//! constructing two bound facade instances per column group would.

pub mod blocks;
pub mod miners;
pub mod state;
pub mod storage;
pub mod transactions;
pub mod users;
