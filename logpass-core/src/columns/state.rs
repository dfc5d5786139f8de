//! A column's small persisted header record, stored under the empty
//! key in its own column family. Unlike the bulk key space, this one
//! record is cheap enough to keep fully resident, confirmed and
//! unconfirmed copies side by side, exactly as `StatefulColumn`
//! (spec §4.5) describes.

use crate::error::CResult;
use crate::serializer::{Codec, Serializer};
use rocksdb::{WriteBatch, DB};
use std::sync::{Arc, RwLock};

pub struct ColumnState<S> {
    cf_name: &'static str,
    db: Arc<DB>,
    confirmed: RwLock<S>,
    unconfirmed: RwLock<S>,
}

impl<S: Codec + Clone + Default> ColumnState<S> {
    pub fn new(db: Arc<DB>, cf_name: &'static str) -> Self {
        ColumnState { cf_name, db, confirmed: RwLock::new(S::default()), unconfirmed: RwLock::new(S::default()) }
    }

    fn cf(&self) -> &rocksdb::ColumnFamily {
        self.db.cf_handle(self.cf_name).expect("column family registered at open()")
    }

    pub fn get(&self, confirmed: bool) -> S {
        if confirmed { self.confirmed.read().expect("lock poisoned").clone() } else { self.unconfirmed.read().expect("lock poisoned").clone() }
    }

    pub fn set_unconfirmed(&self, state: S) {
        *self.unconfirmed.write().expect("lock poisoned") = state;
    }

    /// Reads the persisted header (if any) back into both copies.
    /// Called once at open and again after a rollback.
    pub fn load(&self) -> CResult<()> {
        let state = match self.db.get_cf(self.cf(), b"")? {
            Some(bytes) => {
                let mut s = Serializer::from_bytes(bytes);
                S::decode(&mut s)?
            }
            None => S::default(),
        };
        *self.confirmed.write().expect("lock poisoned") = state.clone();
        *self.unconfirmed.write().expect("lock poisoned") = state;
        Ok(())
    }

    pub fn prepare(&self, batch: &mut WriteBatch) {
        let mut s = Serializer::new();
        self.unconfirmed.read().expect("lock poisoned").encode(&mut s);
        batch.put_cf(self.cf(), b"", s.into_bytes());
    }

    pub fn commit(&self) {
        let state = self.unconfirmed.read().expect("lock poisoned").clone();
        *self.confirmed.write().expect("lock poisoned") = state;
    }

    pub fn clear(&self) {
        let state = self.confirmed.read().expect("lock poisoned").clone();
        *self.unconfirmed.write().expect("lock poisoned") = state;
    }
}
