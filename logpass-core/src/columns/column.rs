//! Generic typed wrapper over one column family: confirmed reads go
//! straight to the (already-durable) store, unconfirmed reads consult
//! a staged override map first. `prepare`/`commit`/`clear` implement
//! the promote-or-discard half of the per-block pipeline (see
//! `crate::database`).

use crate::error::CResult;
use crate::serializer::{Codec, Serializer};
use rocksdb::{WriteBatch, DB};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

/// A staged mutation: `Some(v)` to put, `None` to delete.
type Override<V> = Option<V>;

pub struct Column<K, V> {
    cf_name: &'static str,
    db: Arc<DB>,
    overrides: RwLock<BTreeMap<Vec<u8>, Override<V>>>,
    _marker: PhantomData<K>,
}

impl<K, V> Column<K, V>
where
    K: Codec,
    V: Codec + Clone,
{
    pub fn new(db: Arc<DB>, cf_name: &'static str) -> Self {
        Column { cf_name, db, overrides: RwLock::new(BTreeMap::new()), _marker: PhantomData }
    }

    fn encode_key(key: &K) -> Vec<u8> {
        let mut s = Serializer::new();
        key.encode(&mut s);
        s.into_bytes()
    }

    fn cf(&self) -> &rocksdb::ColumnFamily {
        self.db.cf_handle(self.cf_name).expect("column family registered at open()")
    }

    fn get_confirmed_raw(&self, raw_key: &[u8]) -> CResult<Option<V>> {
        match self.db.get_cf(self.cf(), raw_key)? {
            Some(bytes) => {
                let mut s = Serializer::from_bytes(bytes);
                Ok(Some(V::decode(&mut s)?))
            }
            None => Ok(None),
        }
    }

    pub fn get(&self, confirmed: bool, key: &K) -> CResult<Option<V>> {
        let raw_key = Self::encode_key(key);
        if !confirmed {
            if let Some(staged) = self.overrides.read().expect("lock poisoned").get(&raw_key) {
                return Ok(staged.clone());
            }
        }
        self.get_confirmed_raw(&raw_key)
    }

    /// Stages `value` under `key`, visible to unconfirmed readers
    /// immediately, persisted at the next `prepare`/`commit`.
    pub fn put(&self, key: &K, value: V) {
        let raw_key = Self::encode_key(key);
        self.overrides.write().expect("lock poisoned").insert(raw_key, Some(value));
    }

    pub fn remove(&self, key: &K) {
        let raw_key = Self::encode_key(key);
        self.overrides.write().expect("lock poisoned").insert(raw_key, None);
    }

    /// Batched point reads over the unconfirmed view: staged overrides
    /// win, everything else falls through to the store in one call.
    pub fn multi_get(&self, confirmed: bool, keys: &[K]) -> CResult<Vec<Option<V>>> {
        keys.iter().map(|k| self.get(confirmed, k)).collect()
    }

    pub fn prepare(&self, batch: &mut WriteBatch) {
        for (key, value) in self.overrides.read().expect("lock poisoned").iter() {
            match value {
                Some(v) => {
                    let mut s = Serializer::new();
                    v.encode(&mut s);
                    batch.put_cf(self.cf(), key, s.into_bytes());
                }
                None => batch.delete_cf(self.cf(), key),
            }
        }
    }

    /// The write batch built from `prepare` has already landed in the
    /// store by the time this is called; promoting confirmed state is
    /// therefore just discarding the now-redundant overrides.
    pub fn commit(&self) {
        self.overrides.write().expect("lock poisoned").clear();
    }

    pub fn clear(&self) {
        self.overrides.write().expect("lock poisoned").clear();
    }

    /// Seeks to the first stored entry at or after `seed_key`, falling
    /// back to the last entry before it if the keyspace wraps past the
    /// end. Used for uniform "random" sampling over a 256-bit keyspace:
    /// the caller seeds with a freshly generated random key and this
    /// returns whichever real entry lands nearest it, preserving the
    /// store's existing selection distribution rather than picking a
    /// pseudo-random index over a materialized list.
    pub fn scan_nearest(&self, confirmed: bool, seed_key: &K) -> CResult<Option<(K, V)>> {
        let raw_seed = Self::encode_key(seed_key);
        let mut iter = self.db.raw_iterator_cf(self.cf());
        iter.seek(&raw_seed);
        if !iter.valid() {
            iter.seek_for_prev(&raw_seed);
        }
        if let (Some(raw_key), Some(raw_value)) = (iter.key(), iter.value()) {
            let mut key_s = Serializer::from_bytes(raw_key.to_vec());
            let mut value_s = Serializer::from_bytes(raw_value.to_vec());
            return Ok(Some((K::decode(&mut key_s)?, V::decode(&mut value_s)?)));
        }
        if !confirmed {
            if let Some((raw_key, Some(value))) = self.overrides.read().expect("lock poisoned").iter().next() {
                let mut key_s = Serializer::from_bytes(raw_key.clone());
                return Ok(Some((K::decode(&mut key_s)?, value.clone())));
            }
        }
        Ok(None)
    }
}
