//! Cursor-based byte buffer used for all on-disk and on-wire encoding.
//!
//! Integers that are compared byte-for-byte as sort keys (block ids,
//! user ids, the transaction-id header) are written big-endian so that
//! lexicographic byte order matches numeric order. Integers that only
//! ever round-trip through a single process (value payloads) are
//! written little-endian, matching the host's native order and the
//! teacher's own convention for non-key fields.

use crate::error::{CResult, SerializerError};
use std::collections::{BTreeMap, BTreeSet};

/// Growable write cursor / shrinking read cursor over a byte vector.
#[derive(Debug, Default, Clone)]
pub struct Serializer {
    buf: Vec<u8>,
    pos: usize,
}

impl Serializer {
    pub fn new() -> Self {
        Serializer { buf: Vec::new(), pos: 0 }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Serializer { buf: Vec::with_capacity(cap), pos: 0 }
    }

    /// Wrap an existing buffer for reading.
    pub fn from_bytes(buf: Vec<u8>) -> Self {
        Serializer { buf, pos: 0 }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty_remaining(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> CResult<&[u8]> {
        if self.remaining() < n {
            return Err(SerializerError::UnexpectedEof.into());
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.buf[start..self.pos])
    }

    // -- raw bytes --------------------------------------------------

    pub fn put_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn get_raw(&mut self, n: usize) -> CResult<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    pub fn put_array<const N: usize>(&mut self, arr: &[u8; N]) {
        self.buf.extend_from_slice(arr);
    }

    pub fn get_array<const N: usize>(&mut self) -> CResult<[u8; N]> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    // -- big-endian fixed width (sortable keys) ----------------------

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn get_u8(&mut self) -> CResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn put_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn get_u16(&mut self) -> CResult<u16> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn get_u32(&mut self) -> CResult<u32> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn get_u64(&mut self) -> CResult<u64> {
        Ok(u64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn put_i16(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn get_i16(&mut self) -> CResult<i16> {
        Ok(i16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn put_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn get_i32(&mut self) -> CResult<i32> {
        Ok(i32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    // -- little-endian fixed width (value payloads) ------------------

    pub fn put_u16_le(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn get_u16_le(&mut self) -> CResult<u16> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn put_u32_le(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn get_u32_le(&mut self) -> CResult<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn put_u64_le(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn get_u64_le(&mut self) -> CResult<u64> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn put_i64_le(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn get_i64_le(&mut self) -> CResult<i64> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    // -- length-prefixed byte strings ---------------------------------

    pub fn put_bytes_u8(&mut self, bytes: &[u8]) -> CResult<()> {
        if bytes.len() > u8::MAX as usize {
            return Err(SerializerError::TooLarge("byte string exceeds u8 length prefix".into()).into());
        }
        self.put_u8(bytes.len() as u8);
        self.put_raw(bytes);
        Ok(())
    }

    pub fn get_bytes_u8(&mut self) -> CResult<Vec<u8>> {
        let len = self.get_u8()? as usize;
        self.get_raw(len)
    }

    pub fn put_bytes_u16(&mut self, bytes: &[u8]) -> CResult<()> {
        if bytes.len() > u16::MAX as usize {
            return Err(SerializerError::TooLarge("byte string exceeds u16 length prefix".into()).into());
        }
        self.put_u16(bytes.len() as u16);
        self.put_raw(bytes);
        Ok(())
    }

    pub fn get_bytes_u16(&mut self) -> CResult<Vec<u8>> {
        let len = self.get_u16()? as usize;
        self.get_raw(len)
    }

    pub fn put_string_u8(&mut self, s: &str) -> CResult<()> {
        self.put_bytes_u8(s.as_bytes())
    }

    pub fn get_string_u8(&mut self) -> CResult<String> {
        let bytes = self.get_bytes_u8()?;
        String::from_utf8(bytes)
            .map_err(|_| SerializerError::InvalidValue("not valid utf-8".into()).into())
    }

    // -- option: presence byte + payload ------------------------------

    pub fn put_option<T>(&mut self, value: &Option<T>, encode: impl FnOnce(&mut Self, &T)) {
        match value {
            Some(v) => {
                self.put_u8(1);
                encode(self, v);
            }
            None => self.put_u8(0),
        }
    }

    pub fn get_option<T>(&mut self, decode: impl FnOnce(&mut Self) -> CResult<T>) -> CResult<Option<T>> {
        match self.get_u8()? {
            0 => Ok(None),
            1 => Ok(Some(decode(self)?)),
            _ => Err(SerializerError::InvalidValue("option tag must be 0 or 1".into()).into()),
        }
    }

    // -- ordered containers, canonical sorted output ------------------

    pub fn put_set_u8<T: Ord>(&mut self, set: &BTreeSet<T>, encode: impl Fn(&mut Self, &T)) -> CResult<()> {
        if set.len() > u8::MAX as usize {
            return Err(SerializerError::TooLarge("set exceeds u8 length prefix".into()).into());
        }
        self.put_u8(set.len() as u8);
        for item in set {
            encode(self, item);
        }
        Ok(())
    }

    pub fn get_set_u8<T: Ord>(&mut self, decode: impl Fn(&mut Self) -> CResult<T>) -> CResult<BTreeSet<T>> {
        let len = self.get_u8()? as usize;
        let mut out = BTreeSet::new();
        for _ in 0..len {
            out.insert(decode(self)?);
        }
        Ok(out)
    }

    pub fn put_map_u8<K: Ord, V>(
        &mut self,
        map: &BTreeMap<K, V>,
        encode_key: impl Fn(&mut Self, &K),
        encode_value: impl Fn(&mut Self, &V),
    ) -> CResult<()> {
        if map.len() > u8::MAX as usize {
            return Err(SerializerError::TooLarge("map exceeds u8 length prefix".into()).into());
        }
        self.put_u8(map.len() as u8);
        for (k, v) in map {
            encode_key(self, k);
            encode_value(self, v);
        }
        Ok(())
    }

    pub fn get_map_u8<K: Ord, V>(
        &mut self,
        decode_key: impl Fn(&mut Self) -> CResult<K>,
        decode_value: impl Fn(&mut Self) -> CResult<V>,
    ) -> CResult<BTreeMap<K, V>> {
        let len = self.get_u8()? as usize;
        let mut out = BTreeMap::new();
        for _ in 0..len {
            let k = decode_key(self)?;
            let v = decode_value(self)?;
            out.insert(k, v);
        }
        Ok(out)
    }
}

/// Implemented by every type with a canonical on-disk/on-wire
/// representation. Kept local rather than pulled from `serde` because
/// Logpass's encodings mix big-endian sort keys with little-endian
/// payloads within a single struct, which `serde`'s format-agnostic
/// model cannot express directly.
pub trait Codec: Sized {
    fn encode(&self, s: &mut Serializer);
    fn decode(s: &mut Serializer) -> CResult<Self>;
}

/// Sort-key encoding: big-endian, since `u32` is used as a column key
/// (block ids) wherever byte order must match numeric order.
impl Codec for u32 {
    fn encode(&self, s: &mut Serializer) {
        s.put_u32(*self);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        s.get_u32()
    }
}

impl Codec for String {
    fn encode(&self, s: &mut Serializer) {
        s.put_string_u8(self).expect("column keys are short, printable identifiers");
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        s.get_string_u8()
    }
}

impl Codec for () {
    fn encode(&self, _s: &mut Serializer) {}

    fn decode(_s: &mut Serializer) -> CResult<Self> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_fixed_width_ints() {
        let mut s = Serializer::new();
        s.put_u32(42);
        s.put_u64_le(7);
        s.put_i16(-5);
        let mut s = Serializer::from_bytes(s.into_bytes());
        assert_eq!(s.get_u32().unwrap(), 42);
        assert_eq!(s.get_u64_le().unwrap(), 7);
        assert_eq!(s.get_i16().unwrap(), -5);
        assert!(s.is_empty_remaining());
    }

    #[test]
    fn round_trips_length_prefixed_bytes() {
        let mut s = Serializer::new();
        s.put_bytes_u8(b"hello").unwrap();
        s.put_bytes_u16(&[0u8; 300]).unwrap();
        let mut s = Serializer::from_bytes(s.into_bytes());
        assert_eq!(s.get_bytes_u8().unwrap(), b"hello");
        assert_eq!(s.get_bytes_u16().unwrap().len(), 300);
    }

    #[test]
    fn option_round_trips_both_variants() {
        let mut s = Serializer::new();
        s.put_option(&Some(9u32), |s, v| s.put_u32(*v));
        s.put_option::<u32>(&None, |s, v| s.put_u32(*v));
        let mut s = Serializer::from_bytes(s.into_bytes());
        assert_eq!(s.get_option(|s| s.get_u32()).unwrap(), Some(9));
        assert_eq!(s.get_option(|s| s.get_u32()).unwrap(), None);
    }

    #[test]
    fn set_round_trips_in_sorted_order() {
        let mut set = BTreeSet::new();
        set.insert(3u8);
        set.insert(1u8);
        set.insert(2u8);
        let mut s = Serializer::new();
        s.put_set_u8(&set, |s, v| s.put_u8(*v)).unwrap();
        let mut s = Serializer::from_bytes(s.into_bytes());
        let out = s.get_set_u8(|s| s.get_u8()).unwrap();
        assert_eq!(out, set);
    }

    #[test]
    fn read_past_end_is_unexpected_eof() {
        let mut s = Serializer::from_bytes(vec![1, 2]);
        s.get_u8().unwrap();
        s.get_u8().unwrap();
        assert!(s.get_u8().is_err());
    }
}
