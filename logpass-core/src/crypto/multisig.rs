//! Power-weighted multi-signature authorization envelope.
//!
//! A transaction is authorized by one account (`user_id`), optionally
//! acting through a sponsor (`sponsor_id`), with a main key plus up to
//! ten co-signing keys. All signatures are taken over the same
//! domain-separated message so that a signature produced for one
//! purpose can never be replayed as another.

use super::hash::Hash;
use super::public_key::{KeyType, PublicKey};
use super::signature::Signature;
use super::user_id::UserId;
use crate::error::{CResult, Error, SerializerError};
use crate::serializer::{Codec, Serializer};
use std::collections::BTreeMap;

/// Prepended to every message a [`MultiSignatures`] envelope signs
/// over, so a signature produced for Logpass transactions cannot be
/// replayed against an unrelated protocol that happens to hash the
/// same bytes.
pub const SIGNING_DOMAIN_PREFIX: &[u8] = b"LOGPASS SIGNED TRANSACTION:\n";

pub const MAX_CO_SIGNERS: usize = 10;

/// High nibble of the envelope type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeType {
    /// The envelope authorizes on behalf of `user_id` directly.
    User,
    /// The envelope authorizes on behalf of `user_id`, spending
    /// through a sponsor's balance (`sponsor_id` must be set).
    Sponsor,
}

impl EnvelopeType {
    const fn tag(self) -> u8 {
        match self {
            EnvelopeType::User => 0x10,
            EnvelopeType::Sponsor => 0x20,
        }
    }

    fn from_tag(tag: u8) -> CResult<Self> {
        match tag {
            0x10 => Ok(EnvelopeType::User),
            0x20 => Ok(EnvelopeType::Sponsor),
            other => Err(SerializerError::InvalidValue(format!("unknown envelope type {other:#04x}")).into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MultiSignatures {
    pub envelope_type: EnvelopeType,
    pub main_public_key: PublicKey,
    pub user_id: UserId,
    pub sponsor_id: Option<UserId>,
    pub co_signers: BTreeMap<PublicKey, Signature>,
    pub main_signature: Signature,
}

impl MultiSignatures {
    pub fn validate(&self) -> CResult<()> {
        if self.envelope_type == EnvelopeType::Sponsor && self.sponsor_id.is_none() {
            return Err(Error::crypto("sponsor envelope requires a sponsor id"));
        }
        if let Some(sponsor_id) = self.sponsor_id {
            if sponsor_id == self.user_id {
                return Err(Error::crypto("user id and sponsor id must differ"));
            }
        }
        if self.co_signers.len() > MAX_CO_SIGNERS {
            return Err(Error::crypto(format!(
                "at most {MAX_CO_SIGNERS} co-signers allowed, got {}",
                self.co_signers.len()
            )));
        }
        if self.co_signers.contains_key(&self.main_public_key) {
            return Err(Error::crypto("main key must not also appear as a co-signer"));
        }
        Ok(())
    }

    fn type_byte(&self) -> u8 {
        self.envelope_type.tag() | self.main_public_key.key_type().tag()
    }

    /// The envelope's fields serialized without either signature,
    /// mirroring the wire representation minus the trailing
    /// signature(s).
    fn envelope_without_sigs(&self) -> Vec<u8> {
        let mut s = Serializer::new();
        s.put_u8(self.type_byte());
        self.main_public_key.encode(&mut s);
        self.user_id.encode(&mut s);
        s.put_option(&self.sponsor_id, |s, id| id.encode(s));
        s.into_bytes()
    }

    fn co_signers_serialized(&self) -> Vec<u8> {
        let mut s = Serializer::new();
        s.put_map_u8(
            &self.co_signers,
            |s, k| k.encode(s),
            |s, v| v.encode(s),
        )
        .expect("co-signer count already bounded by validate()");
        s.into_bytes()
    }

    fn message_for_co_signers(&self, hash: &Hash) -> Vec<u8> {
        let mut msg = Vec::with_capacity(SIGNING_DOMAIN_PREFIX.len() + Hash::SIZE + 64);
        msg.extend_from_slice(SIGNING_DOMAIN_PREFIX);
        msg.extend_from_slice(hash.as_bytes());
        msg.extend_from_slice(&self.envelope_without_sigs());
        msg
    }

    fn message_for_main(&self, hash: &Hash) -> Vec<u8> {
        let mut msg = self.message_for_co_signers(hash);
        msg.extend_from_slice(&self.co_signers_serialized());
        msg
    }

    /// Verifies every co-signer signature, then the main signature
    /// over the co-signers' serialized map. Returns `false` (never
    /// panics) on any malformed envelope.
    pub fn verify(&self, hash: &Hash) -> bool {
        if self.validate().is_err() {
            return false;
        }
        let co_signer_message = self.message_for_co_signers(hash);
        for (public_key, signature) in &self.co_signers {
            if !public_key.verify(&co_signer_message, signature) {
                return false;
            }
        }
        let main_message = self.message_for_main(hash);
        self.main_public_key.verify(&main_message, &self.main_signature)
    }

    /// Builds a fully signed envelope. `co_signer_keys` may include a
    /// key matching `main_key`'s public key; it is skipped there since
    /// the main key signs separately, last, over the co-signers' map.
    pub fn sign(
        envelope_type: EnvelopeType,
        user_id: UserId,
        sponsor_id: Option<UserId>,
        main_key: &super::private_key::PrivateKey,
        co_signer_keys: &[super::private_key::PrivateKey],
        hash: &Hash,
    ) -> Self {
        let main_public_key = main_key.public_key();
        let mut envelope = MultiSignatures {
            envelope_type,
            main_public_key,
            user_id,
            sponsor_id,
            co_signers: BTreeMap::new(),
            main_signature: Signature::from_bytes([0u8; 64]),
        };

        let co_signer_message = envelope.message_for_co_signers(hash);
        for key in co_signer_keys {
            let public_key = key.public_key();
            if public_key == main_public_key {
                continue;
            }
            let signature = key.sign(&co_signer_message);
            envelope.co_signers.insert(public_key, signature);
        }

        let main_message = envelope.message_for_main(hash);
        envelope.main_signature = main_key.sign(&main_message);
        envelope
    }
}

impl Codec for MultiSignatures {
    fn encode(&self, s: &mut Serializer) {
        s.put_u8(self.type_byte());
        self.main_public_key.encode(s);
        self.user_id.encode(s);
        s.put_option(&self.sponsor_id, |s, id| id.encode(s));
        s.put_map_u8(&self.co_signers, |s, k| k.encode(s), |s, v| v.encode(s))
            .expect("co-signer count already bounded by validate()");
        self.main_signature.encode(s);
    }

    fn decode(s: &mut Serializer) -> CResult<Self> {
        let type_byte = s.get_u8()?;
        let envelope_type = EnvelopeType::from_tag(type_byte & 0xf0)?;
        let _key_type = KeyType::from_tag(type_byte & 0x0f)?;
        let main_public_key = PublicKey::decode(s)?;
        let user_id = UserId::decode(s)?;
        let sponsor_id = s.get_option(UserId::decode)?;
        let co_signers = s.get_map_u8(PublicKey::decode, Signature::decode)?;
        let main_signature = Signature::decode(s)?;
        let envelope = MultiSignatures {
            envelope_type,
            main_public_key,
            user_id,
            sponsor_id,
            co_signers,
            main_signature,
        };
        envelope.validate()?;
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::private_key::PrivateKey;

    #[test]
    fn signs_and_verifies_with_no_co_signers() {
        let main = PrivateKey::generate();
        let hash = Hash::sha256(b"transaction body");
        let envelope = MultiSignatures::sign(
            EnvelopeType::User,
            UserId::from_bytes(main.public_key().derive_user_id().as_bytes().to_owned()),
            None,
            &main,
            &[],
            &hash,
        );
        assert!(envelope.verify(&hash));
    }

    #[test]
    fn signs_and_verifies_with_co_signers() {
        let main = PrivateKey::generate();
        let co1 = PrivateKey::generate();
        let co2 = PrivateKey::generate();
        let hash = Hash::sha256(b"transaction body");
        let user_id = UserId::from_bytes(main.public_key().derive_user_id().as_bytes().to_owned());
        let envelope = MultiSignatures::sign(
            EnvelopeType::User,
            user_id,
            None,
            &main,
            &[co1, co2],
            &hash,
        );
        assert_eq!(envelope.co_signers.len(), 2);
        assert!(envelope.verify(&hash));
    }

    #[test]
    fn tampered_hash_fails_verification() {
        let main = PrivateKey::generate();
        let hash = Hash::sha256(b"original");
        let user_id = UserId::from_bytes(main.public_key().derive_user_id().as_bytes().to_owned());
        let envelope = MultiSignatures::sign(EnvelopeType::User, user_id, None, &main, &[], &hash);
        let other_hash = Hash::sha256(b"tampered");
        assert!(!envelope.verify(&other_hash));
    }

    #[test]
    fn rejects_too_many_co_signers() {
        let main = PrivateKey::generate();
        let user_id = UserId::from_bytes(main.public_key().derive_user_id().as_bytes().to_owned());
        let co_signers: Vec<PrivateKey> = (0..MAX_CO_SIGNERS + 1).map(|_| PrivateKey::generate()).collect();
        let hash = Hash::sha256(b"body");
        let envelope = MultiSignatures::sign(EnvelopeType::User, user_id, None, &main, &co_signers, &hash);
        assert!(envelope.validate().is_err());
    }

    #[test]
    fn sponsor_envelope_requires_distinct_ids() {
        let main = PrivateKey::generate();
        let user_id = UserId::from_bytes(main.public_key().derive_user_id().as_bytes().to_owned());
        let hash = Hash::sha256(b"body");
        let mut envelope = MultiSignatures::sign(
            EnvelopeType::Sponsor,
            user_id,
            Some(user_id),
            &main,
            &[],
            &hash,
        );
        assert!(envelope.validate().is_err());
        envelope.sponsor_id = Some(UserId::from_bytes([9u8; 32]));
        assert!(envelope.validate().is_ok());
    }
}
