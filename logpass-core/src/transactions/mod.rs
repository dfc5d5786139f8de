//! The transaction envelope, the shared validate/execute pipeline every
//! concrete transaction type composes with, and the type-byte dispatch
//! table tying the two together.
//!
//! Every concrete type (one submodule each) is a plain data struct
//! describing only its own body fields — the envelope (block id,
//! pricing, signatures, hash, id) lives once, here, on [`Transaction`].
//! `Init` is the sole type that bypasses the shared validate/execute
//! template: it is the genesis transaction that brings the very first
//! user and miner into existence, so there is no pre-existing account
//! to authorize against.

pub mod commit;
pub mod create_miner;
pub mod create_user;
pub mod increase_stake;
pub mod init;
pub mod lock_user;
pub mod logout_user;
pub mod select_miner;
pub mod sponsor_user;
pub mod storage;
pub mod transfer;
pub mod unlock_user;
pub mod update_miner;
pub mod update_user;
pub mod withdraw_stake;

use crate::columns::Columns;
use crate::config::TRANSACTION_MAX_BLOCK_ID_DIFFERENCE;
use crate::crypto::{EnvelopeType, Hash, MultiSignatures, PrivateKey, PublicKey, TransactionId, UserId};
use crate::domain::{PowerLevel, User, UserHistoryType};
use crate::error::{CResult, Error};
use crate::facade;
use crate::serializer::{Codec, Serializer};
use std::collections::BTreeSet;

pub mod type_byte {
    pub const INIT: u8 = 0x01;
    pub const CREATE_USER: u8 = 0x03;
    pub const SPONSOR_USER: u8 = 0x04;
    pub const UPDATE_USER: u8 = 0x06;
    pub const LOCK_USER: u8 = 0x0A;
    pub const UNLOCK_USER: u8 = 0x0B;
    pub const LOGOUT_USER: u8 = 0x0E;
    pub const TRANSFER: u8 = 0x10;
    pub const CREATE_MINER: u8 = 0x20;
    pub const UPDATE_MINER: u8 = 0x21;
    pub const SELECT_MINER: u8 = 0x25;
    pub const INCREASE_STAKE: u8 = 0x27;
    pub const WITHDRAW_STAKE: u8 = 0x28;
    pub const STORAGE_CREATE_PREFIX: u8 = 0x50;
    pub const STORAGE_UPDATE_PREFIX: u8 = 0x51;
    pub const STORAGE_ADD_ENTRY: u8 = 0x55;
    pub const COMMIT: u8 = 0x80;
}

/// Per-type knobs the shared validate/execute pipeline reads instead of
/// hard-coding a `match` over every concern at every call site.
#[derive(Debug, Clone, Copy)]
pub struct TransactionSettings {
    /// Locked keys/supervisors still count toward power even below
    /// `MEDIUM`. Used by the handful of types that must remain usable
    /// even while an account is otherwise locked down (logging out,
    /// unlocking).
    pub ignores_lock: bool,
    /// Pricing must equal the network's current pricing exactly
    /// (rather than its absolute value), and the fee is waived.
    pub is_blockchain_management_transaction: bool,
    /// Eligible to be paid for out of an account's free-transaction
    /// allowance (`pricing == 0`).
    pub is_user_management_transaction: bool,
    pub transaction_fee_multiplier: u32,
    pub minimum_power_level: PowerLevel,
}

impl Default for TransactionSettings {
    fn default() -> Self {
        TransactionSettings {
            ignores_lock: false,
            is_blockchain_management_transaction: false,
            is_user_management_transaction: false,
            transaction_fee_multiplier: 1,
            minimum_power_level: PowerLevel::LOW,
        }
    }
}

/// `base_cost * 20 * 25 / (24 + pricing)` when pricing is positive
/// (surge pricing), `base_cost * 25 / (24 - pricing)` when negative
/// (discount pricing), `0` at `pricing == 0` (free-transaction
/// allowance covers it instead).
pub(crate) fn base_fee(pricing: i16, multiplier: u32) -> u64 {
    if pricing == 0 {
        return 0;
    }
    let base_cost = (crate::config::TRANSACTION_FEE * multiplier as u64) as i64;
    let fee = if pricing > 0 {
        base_cost * 20 * 25 / (24 + pricing as i64)
    } else {
        base_cost * 25 / (24 - pricing as i64)
    };
    fee as u64
}

/// The sixteen concrete transaction bodies, tagged by the type byte
/// each variant's module declares under [`type_byte`].
#[derive(Debug, Clone)]
pub enum TransactionBody {
    Init(init::InitTransaction),
    CreateUser(create_user::CreateUserTransaction),
    SponsorUser(sponsor_user::SponsorUserTransaction),
    UpdateUser(update_user::UpdateUserTransaction),
    LockUser(lock_user::LockUserTransaction),
    UnlockUser(unlock_user::UnlockUserTransaction),
    LogoutUser(logout_user::LogoutUserTransaction),
    Transfer(transfer::TransferTransaction),
    CreateMiner(create_miner::CreateMinerTransaction),
    UpdateMiner(update_miner::UpdateMinerTransaction),
    SelectMiner(select_miner::SelectMinerTransaction),
    IncreaseStake(increase_stake::IncreaseStakeTransaction),
    WithdrawStake(withdraw_stake::WithdrawStakeTransaction),
    StorageCreatePrefix(storage::create_prefix::CreatePrefixTransaction),
    StorageUpdatePrefix(storage::update_prefix::UpdatePrefixTransaction),
    StorageAddEntry(storage::add_entry::AddEntryTransaction),
    Commit(commit::CommitTransaction),
}

impl TransactionBody {
    pub fn type_byte(&self) -> u8 {
        match self {
            TransactionBody::Init(_) => type_byte::INIT,
            TransactionBody::CreateUser(_) => type_byte::CREATE_USER,
            TransactionBody::SponsorUser(_) => type_byte::SPONSOR_USER,
            TransactionBody::UpdateUser(_) => type_byte::UPDATE_USER,
            TransactionBody::LockUser(_) => type_byte::LOCK_USER,
            TransactionBody::UnlockUser(_) => type_byte::UNLOCK_USER,
            TransactionBody::LogoutUser(_) => type_byte::LOGOUT_USER,
            TransactionBody::Transfer(_) => type_byte::TRANSFER,
            TransactionBody::CreateMiner(_) => type_byte::CREATE_MINER,
            TransactionBody::UpdateMiner(_) => type_byte::UPDATE_MINER,
            TransactionBody::SelectMiner(_) => type_byte::SELECT_MINER,
            TransactionBody::IncreaseStake(_) => type_byte::INCREASE_STAKE,
            TransactionBody::WithdrawStake(_) => type_byte::WITHDRAW_STAKE,
            TransactionBody::StorageCreatePrefix(_) => type_byte::STORAGE_CREATE_PREFIX,
            TransactionBody::StorageUpdatePrefix(_) => type_byte::STORAGE_UPDATE_PREFIX,
            TransactionBody::StorageAddEntry(_) => type_byte::STORAGE_ADD_ENTRY,
            TransactionBody::Commit(_) => type_byte::COMMIT,
        }
    }

    pub fn settings(&self) -> TransactionSettings {
        match self {
            TransactionBody::Init(b) => b.settings(),
            TransactionBody::CreateUser(b) => b.settings(),
            TransactionBody::SponsorUser(b) => b.settings(),
            TransactionBody::UpdateUser(b) => b.settings(),
            TransactionBody::LockUser(b) => b.settings(),
            TransactionBody::UnlockUser(b) => b.settings(),
            TransactionBody::LogoutUser(b) => b.settings(),
            TransactionBody::Transfer(b) => b.settings(),
            TransactionBody::CreateMiner(b) => b.settings(),
            TransactionBody::UpdateMiner(b) => b.settings(),
            TransactionBody::SelectMiner(b) => b.settings(),
            TransactionBody::IncreaseStake(b) => b.settings(),
            TransactionBody::WithdrawStake(b) => b.settings(),
            TransactionBody::StorageCreatePrefix(b) => b.settings(),
            TransactionBody::StorageUpdatePrefix(b) => b.settings(),
            TransactionBody::StorageAddEntry(b) => b.settings(),
            TransactionBody::Commit(b) => b.settings(),
        }
    }

    fn encode_body(&self, s: &mut Serializer) {
        match self {
            TransactionBody::Init(b) => b.encode(s),
            TransactionBody::CreateUser(b) => b.encode(s),
            TransactionBody::SponsorUser(b) => b.encode(s),
            TransactionBody::UpdateUser(b) => b.encode(s),
            TransactionBody::LockUser(b) => b.encode(s),
            TransactionBody::UnlockUser(b) => b.encode(s),
            TransactionBody::LogoutUser(b) => b.encode(s),
            TransactionBody::Transfer(b) => b.encode(s),
            TransactionBody::CreateMiner(b) => b.encode(s),
            TransactionBody::UpdateMiner(b) => b.encode(s),
            TransactionBody::SelectMiner(b) => b.encode(s),
            TransactionBody::IncreaseStake(b) => b.encode(s),
            TransactionBody::WithdrawStake(b) => b.encode(s),
            TransactionBody::StorageCreatePrefix(b) => b.encode(s),
            TransactionBody::StorageUpdatePrefix(b) => b.encode(s),
            TransactionBody::StorageAddEntry(b) => b.encode(s),
            TransactionBody::Commit(b) => b.encode(s),
        }
    }

    fn decode_body(type_byte: u8, s: &mut Serializer) -> CResult<Self> {
        Ok(match type_byte {
            type_byte::INIT => TransactionBody::Init(init::InitTransaction::decode(s)?),
            type_byte::CREATE_USER => TransactionBody::CreateUser(create_user::CreateUserTransaction::decode(s)?),
            type_byte::SPONSOR_USER => TransactionBody::SponsorUser(sponsor_user::SponsorUserTransaction::decode(s)?),
            type_byte::UPDATE_USER => TransactionBody::UpdateUser(update_user::UpdateUserTransaction::decode(s)?),
            type_byte::LOCK_USER => TransactionBody::LockUser(lock_user::LockUserTransaction::decode(s)?),
            type_byte::UNLOCK_USER => TransactionBody::UnlockUser(unlock_user::UnlockUserTransaction::decode(s)?),
            type_byte::LOGOUT_USER => TransactionBody::LogoutUser(logout_user::LogoutUserTransaction::decode(s)?),
            type_byte::TRANSFER => TransactionBody::Transfer(transfer::TransferTransaction::decode(s)?),
            type_byte::CREATE_MINER => TransactionBody::CreateMiner(create_miner::CreateMinerTransaction::decode(s)?),
            type_byte::UPDATE_MINER => TransactionBody::UpdateMiner(update_miner::UpdateMinerTransaction::decode(s)?),
            type_byte::SELECT_MINER => TransactionBody::SelectMiner(select_miner::SelectMinerTransaction::decode(s)?),
            type_byte::INCREASE_STAKE => {
                TransactionBody::IncreaseStake(increase_stake::IncreaseStakeTransaction::decode(s)?)
            }
            type_byte::WITHDRAW_STAKE => {
                TransactionBody::WithdrawStake(withdraw_stake::WithdrawStakeTransaction::decode(s)?)
            }
            type_byte::STORAGE_CREATE_PREFIX => {
                TransactionBody::StorageCreatePrefix(storage::create_prefix::CreatePrefixTransaction::decode(s)?)
            }
            type_byte::STORAGE_UPDATE_PREFIX => {
                TransactionBody::StorageUpdatePrefix(storage::update_prefix::UpdatePrefixTransaction::decode(s)?)
            }
            type_byte::STORAGE_ADD_ENTRY => {
                TransactionBody::StorageAddEntry(storage::add_entry::AddEntryTransaction::decode(s)?)
            }
            type_byte::COMMIT => TransactionBody::Commit(commit::CommitTransaction::decode(s)?),
            other => {
                return Err(crate::error::SerializerError::InvalidValue(format!(
                    "unknown transaction type {other:#04x}"
                ))
                .into())
            }
        })
    }

    fn cost(&self) -> u64 {
        match self {
            TransactionBody::Transfer(b) => b.value,
            TransactionBody::IncreaseStake(b) => b.value,
            _ => 0,
        }
    }

    fn fee(&self, pricing: i16) -> u64 {
        let multiplier = self.settings().transaction_fee_multiplier;
        match self {
            TransactionBody::CreateUser(b) => {
                base_fee(pricing, multiplier) * (b.sponsored_transactions as u64 + 1)
            }
            TransactionBody::SponsorUser(b) => {
                base_fee(pricing, multiplier) * (b.sponsored_transactions as u64 + 1)
            }
            TransactionBody::StorageAddEntry(b) => {
                let base = base_fee(pricing, multiplier);
                base * (1 + (b.key.len() + b.value.len()) as u64 / 1024)
            }
            _ => base_fee(pricing, multiplier),
        }
    }

    fn validate_specific(
        &self,
        tx: &Transaction,
        current_block_id: u32,
        columns: &Columns,
        auth: &Authorization,
    ) -> CResult<()> {
        match self {
            TransactionBody::Init(_) => unreachable!("Init bypasses the shared validate pipeline"),
            TransactionBody::CreateUser(b) => b.validate(tx, current_block_id, columns, auth),
            TransactionBody::SponsorUser(b) => b.validate(tx, current_block_id, columns, auth),
            TransactionBody::UpdateUser(b) => b.validate(tx, current_block_id, columns, auth),
            TransactionBody::LockUser(b) => b.validate(tx, current_block_id, columns, auth),
            TransactionBody::UnlockUser(b) => b.validate(tx, current_block_id, columns, auth),
            TransactionBody::LogoutUser(b) => b.validate(tx, current_block_id, columns, auth),
            TransactionBody::Transfer(b) => b.validate(tx, current_block_id, columns, auth),
            TransactionBody::CreateMiner(b) => b.validate(tx, current_block_id, columns, auth),
            TransactionBody::UpdateMiner(b) => b.validate(tx, current_block_id, columns, auth),
            TransactionBody::SelectMiner(b) => b.validate(tx, current_block_id, columns, auth),
            TransactionBody::IncreaseStake(b) => b.validate(tx, current_block_id, columns, auth),
            TransactionBody::WithdrawStake(b) => b.validate(tx, current_block_id, columns, auth),
            TransactionBody::StorageCreatePrefix(b) => b.validate(tx, current_block_id, columns, auth),
            TransactionBody::StorageUpdatePrefix(b) => b.validate(tx, current_block_id, columns, auth),
            TransactionBody::StorageAddEntry(b) => b.validate(tx, current_block_id, columns, auth),
            TransactionBody::Commit(b) => b.validate(tx, current_block_id, columns, auth),
        }
    }

    fn execute_specific(&self, tx: &Transaction, current_block_id: u32, columns: &Columns) -> CResult<()> {
        match self {
            TransactionBody::Init(b) => b.execute(tx, current_block_id, columns),
            TransactionBody::CreateUser(b) => b.execute(tx, current_block_id, columns),
            TransactionBody::SponsorUser(b) => b.execute(tx, current_block_id, columns),
            TransactionBody::UpdateUser(b) => b.execute(tx, current_block_id, columns),
            TransactionBody::LockUser(b) => b.execute(tx, current_block_id, columns),
            TransactionBody::UnlockUser(b) => b.execute(tx, current_block_id, columns),
            TransactionBody::LogoutUser(b) => b.execute(tx, current_block_id, columns),
            TransactionBody::Transfer(b) => b.execute(tx, current_block_id, columns),
            TransactionBody::CreateMiner(b) => b.execute(tx, current_block_id, columns),
            TransactionBody::UpdateMiner(b) => b.execute(tx, current_block_id, columns),
            TransactionBody::SelectMiner(b) => b.execute(tx, current_block_id, columns),
            TransactionBody::IncreaseStake(b) => b.execute(tx, current_block_id, columns),
            TransactionBody::WithdrawStake(b) => b.execute(tx, current_block_id, columns),
            TransactionBody::StorageCreatePrefix(b) => b.execute(tx, current_block_id, columns),
            TransactionBody::StorageUpdatePrefix(b) => b.execute(tx, current_block_id, columns),
            TransactionBody::StorageAddEntry(b) => b.execute(tx, current_block_id, columns),
            TransactionBody::Commit(b) => b.execute(tx, current_block_id, columns),
        }
    }
}

/// A fully built transaction body plus the envelope fields common to
/// every type, awaiting [`UnsignedTransaction::sign`].
pub struct UnsignedTransaction {
    block_id: u32,
    pricing: i16,
    body: TransactionBody,
}

impl UnsignedTransaction {
    pub(crate) fn new(block_id: u32, pricing: i16, body: TransactionBody) -> Self {
        UnsignedTransaction { block_id, pricing, body }
    }

    /// Overrides the default `pricing = 0` (free-transaction-allowance)
    /// a freshly built transaction starts with, e.g. to pay a staking
    /// fee (`pricing > 0`) or spend at a discount (`pricing < 0`).
    pub fn with_pricing(mut self, pricing: i16) -> Self {
        self.pricing = pricing;
        self
    }

    /// Signs as a direct, self-authorizing transaction: `user_id` is
    /// derived from `key`'s own public key, with no co-signers.
    pub fn sign(self, key: &PrivateKey) -> Transaction {
        let user_id = UserId::from_bytes(*key.public_key().derive_user_id().as_bytes());
        self.sign_as(EnvelopeType::User, user_id, None, key, &[])
    }

    /// Signs on behalf of `user_id`, with `key` as the main signer and
    /// `co_signer_keys` contributing additional co-signatures.
    pub fn sign_with(self, user_id: UserId, key: &PrivateKey, co_signer_keys: &[PrivateKey]) -> Transaction {
        self.sign_as(EnvelopeType::User, user_id, None, key, co_signer_keys)
    }

    /// Signs on behalf of `user_id`, spending out of `sponsor_id`'s
    /// balance instead of its own.
    pub fn sign_sponsored(
        self,
        user_id: UserId,
        sponsor_id: UserId,
        key: &PrivateKey,
        co_signer_keys: &[PrivateKey],
    ) -> Transaction {
        self.sign_as(EnvelopeType::Sponsor, user_id, Some(sponsor_id), key, co_signer_keys)
    }

    pub fn sign_as(
        self,
        envelope_type: EnvelopeType,
        user_id: UserId,
        sponsor_id: Option<UserId>,
        main_key: &PrivateKey,
        co_signer_keys: &[PrivateKey],
    ) -> Transaction {
        let mut header_and_body = Serializer::new();
        header_and_body.put_u8(self.body.type_byte());
        header_and_body.put_u32(self.block_id);
        header_and_body.put_i16(self.pricing);
        self.body.encode_body(&mut header_and_body);
        let hash = Hash::sha256(header_and_body.as_slice());

        let signatures = MultiSignatures::sign(envelope_type, user_id, sponsor_id, main_key, co_signer_keys, &hash);

        let mut full = Serializer::new();
        full.put_raw(header_and_body.as_slice());
        signatures.encode(&mut full);
        let size = full.into_bytes().len() as u16;

        let id = TransactionId::new(self.block_id, self.body.type_byte(), size, hash);
        Transaction { block_id: self.block_id, pricing: self.pricing, body: self.body, signatures, hash, id }
    }
}

/// A signed transaction: envelope (block id, pricing, type), body,
/// [`MultiSignatures`] footer, and the hash/id computed over them.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub block_id: u32,
    pub pricing: i16,
    pub body: TransactionBody,
    pub signatures: MultiSignatures,
    pub hash: Hash,
    pub id: TransactionId,
}

/// Computed once by [`Transaction::validate_common`] and reused by
/// both the type-specific validate hook and [`Transaction::execute`].
pub(crate) struct Authorization {
    pub power_level: PowerLevel,
    pub payer_id: UserId,
    pub payer_power_level: PowerLevel,
}

impl Transaction {
    pub fn user_id(&self) -> UserId {
        self.signatures.user_id
    }

    pub fn main_public_key(&self) -> PublicKey {
        self.signatures.main_public_key
    }

    pub fn cost(&self) -> u64 {
        self.body.cost()
    }

    pub fn fee(&self) -> u64 {
        self.body.fee(self.pricing)
    }

    pub fn signed_keys(&self) -> BTreeSet<PublicKey> {
        let mut keys = BTreeSet::new();
        keys.insert(self.signatures.main_public_key);
        keys.extend(self.signatures.co_signers.keys().copied());
        keys
    }

    /// `SHA256(hash || main public key || user id)` — the marker
    /// recorded in `transaction_hashes` so the same signed payload
    /// cannot be replayed as a second transaction.
    pub fn duplication_hash(&self) -> Hash {
        let mut buf = Vec::with_capacity(Hash::SIZE + PublicKey::SIZE + UserId::SIZE);
        buf.extend_from_slice(self.hash.as_bytes());
        buf.push(self.signatures.main_public_key.key_type().tag());
        buf.extend_from_slice(self.signatures.main_public_key.raw_bytes());
        buf.extend_from_slice(self.signatures.user_id.as_bytes());
        Hash::sha256(&buf)
    }

    fn encode_header_and_body(&self, s: &mut Serializer) {
        s.put_u8(self.body.type_byte());
        s.put_u32(self.block_id);
        s.put_i16(self.pricing);
        self.body.encode_body(s);
    }

    /// The full wire representation: header, body, signatures.
    pub fn serialize(&self) -> Vec<u8> {
        let mut s = Serializer::new();
        self.encode_header_and_body(&mut s);
        self.signatures.encode(&mut s);
        s.into_bytes()
    }

    /// Decodes a transaction and recomputes its hash/id from the
    /// parsed fields, rather than trusting a stored hash — the bytes
    /// are the only thing that travels the wire or sits on disk.
    pub fn load(bytes: Vec<u8>) -> CResult<Self> {
        let mut s = Serializer::from_bytes(bytes);
        let type_byte = s.get_u8()?;
        let block_id = s.get_u32()?;
        let pricing = s.get_i16()?;
        let body = TransactionBody::decode_body(type_byte, &mut s)?;
        let signatures = MultiSignatures::decode(&mut s)?;
        if !s.is_empty_remaining() {
            return Err(crate::error::SerializerError::InvalidValue("trailing bytes after transaction".into()).into());
        }

        let mut header_and_body = Serializer::new();
        header_and_body.put_u8(type_byte);
        header_and_body.put_u32(block_id);
        header_and_body.put_i16(pricing);
        body.encode_body(&mut header_and_body);
        let hash = Hash::sha256(header_and_body.as_slice());

        let mut full = Serializer::new();
        full.put_raw(header_and_body.as_slice());
        signatures.encode(&mut full);
        let size = full.into_bytes().len() as u16;
        let id = TransactionId::new(block_id, type_byte, size, hash);

        if id.size() as usize > crate::config::TRANSACTION_MAX_SIZE {
            return Err(Error::transaction_validation("transaction exceeds the maximum allowed size"));
        }
        Ok(Transaction { block_id, pricing, body, signatures, hash, id })
    }

    /// The shared preamble every non-`Init` transaction goes through:
    /// signature verification, expiry, replay, account existence,
    /// power-level derivation, payer resolution and affordability, and
    /// the pricing branch. Returns the computed [`Authorization`] for
    /// reuse by the type-specific validate hook.
    fn validate_common(&self, current_block_id: u32, columns: &Columns) -> CResult<Authorization> {
        if !self.signatures.verify(&self.hash) {
            return Err(Error::crypto("signature verification failed"));
        }
        if current_block_id >= self.block_id + TRANSACTION_MAX_BLOCK_ID_DIFFERENCE || self.block_id > current_block_id
        {
            return Err(Error::transaction_validation("transaction has expired"));
        }
        if facade::transactions::has_hash(columns, false, self.id.block_id(), self.duplication_hash())? {
            return Err(Error::transaction_validation("duplicate transaction"));
        }

        let settings = self.body.settings();
        let user = facade::users::get(columns, false, current_block_id, &self.user_id())?
            .ok_or_else(|| Error::transaction_validation("user does not exist"))?;

        let signed = self.signed_keys();
        let (power_level, mut used_keys) = user.get_power_level_with_used_keys(
            &signed,
            |id: &UserId| facade::users::get(columns, false, current_block_id, id).ok().flatten(),
            settings.ignores_lock,
        );
        if power_level.is_invalid() || power_level < settings.minimum_power_level {
            return Err(Error::transaction_validation("insufficient power level"));
        }

        let payer_id = match self.signatures.envelope_type {
            EnvelopeType::Sponsor => {
                if self.pricing > 0 {
                    return Err(Error::transaction_validation("staking is not allowed through a sponsor"));
                }
                let sponsor_id = self.signatures.sponsor_id.expect("envelope validated at decode");
                if sponsor_id == self.user_id() {
                    return Err(Error::transaction_validation("a user cannot sponsor itself"));
                }
                sponsor_id
            }
            EnvelopeType::User => {
                let unlocked_power = user.get_power_level(
                    &signed,
                    |id: &UserId| facade::users::get(columns, false, current_block_id, id).ok().flatten(),
                    true,
                );
                if unlocked_power.is_invalid() {
                    return Err(Error::transaction_validation("no signing key authorizes payment"));
                }
                self.user_id()
            }
        };

        let payer = if payer_id == self.user_id() {
            user.clone()
        } else {
            facade::users::get(columns, false, current_block_id, &payer_id)?
                .ok_or_else(|| Error::transaction_validation("sponsor does not exist"))?
        };
        let payer_power_level = if payer_id == self.user_id() {
            power_level
        } else {
            let (level, payer_used) = payer.get_power_level_with_used_keys(
                &signed,
                |id: &UserId| facade::users::get(columns, false, current_block_id, id).ok().flatten(),
                false,
            );
            used_keys.extend(payer_used);
            level
        };
        if payer_power_level.is_invalid() {
            return Err(Error::transaction_validation("sponsor has insufficient power level"));
        }
        if used_keys.len() != signed.len() {
            return Err(Error::transaction_validation("not every signing key was put to use"));
        }
        if !user.can_spend_tokens(self.cost(), power_level) {
            return Err(Error::transaction_validation("insufficient spending allowance for this transaction's cost"));
        }

        let network_pricing = facade::state::pricing(columns, false);
        if settings.is_blockchain_management_transaction {
            if self.pricing != network_pricing {
                return Err(Error::transaction_validation("pricing must equal the network's current pricing"));
            }
        } else if self.pricing == 0 {
            if !settings.is_user_management_transaction || payer.free_transactions == 0 {
                return Err(Error::transaction_validation("no free transactions available"));
            }
        } else {
            if self.pricing.abs() != network_pricing {
                return Err(Error::transaction_validation("pricing does not match the network's current pricing"));
            }
            if self.pricing > 0 {
                if !payer.miner.is_valid() || !facade::miners::exists(columns, false, &payer.miner)? {
                    return Err(Error::transaction_validation("payer has no miner selected to stake the fee to"));
                }
                let payer_cost =
                    self.fee() + if matches!(self.signatures.envelope_type, EnvelopeType::User) { self.cost() } else { 0 };
                if !payer.can_spend_tokens(payer_cost, payer_power_level) {
                    return Err(Error::transaction_validation("payer cannot afford this transaction's fee"));
                }
            }
        }

        Ok(Authorization { power_level, payer_id, payer_power_level })
    }

    pub fn validate(&self, current_block_id: u32, columns: &Columns) -> CResult<()> {
        if self.body.type_byte() == type_byte::INIT {
            let TransactionBody::Init(init) = &self.body else { unreachable!() };
            return init.validate_genesis(self, current_block_id, columns);
        }
        let auth = self.validate_common(current_block_id, columns)?;
        self.body.validate_specific(self, current_block_id, columns, &auth)
    }

    /// Shared tail every non-`Init` transaction's execute goes
    /// through, after its type-specific mutation has run: fee debit
    /// (unless blockchain management), cost debit, and history
    /// bookkeeping for both the submitter and, if distinct, the payer.
    fn execute_common(&self, current_block_id: u32, columns: &Columns) -> CResult<()> {
        let settings = self.body.settings();
        let mut user = facade::users::get(columns, false, current_block_id, &self.user_id())?
            .expect("validated to exist");
        let signed = self.signed_keys();
        let (power_level, _) = user.get_power_level_with_used_keys(
            &signed,
            |id: &UserId| facade::users::get(columns, false, current_block_id, id).ok().flatten(),
            settings.ignores_lock,
        );

        let payer_id = match self.signatures.envelope_type {
            EnvelopeType::Sponsor => self.signatures.sponsor_id.expect("validated"),
            EnvelopeType::User => self.user_id(),
        };
        let mut payer = if payer_id == self.user_id() {
            user.clone()
        } else {
            facade::users::get(columns, false, current_block_id, &payer_id)?.expect("validated to exist")
        };
        let payer_power_level = if payer_id == self.user_id() {
            power_level
        } else {
            payer.get_power_level(
                &signed,
                |id: &UserId| facade::users::get(columns, false, current_block_id, id).ok().flatten(),
                false,
            )
        };

        if !settings.is_blockchain_management_transaction {
            if self.pricing == 0 {
                payer.free_transactions -= 1;
            } else {
                let fee = self.fee();
                payer.spend_tokens(fee, payer_power_level);
                if self.pricing > 0 {
                    let mut miner = facade::miners::get(columns, false, &payer.miner)?.expect("validated to exist");
                    miner.add_stake(fee, true);
                    facade::miners::update(columns, payer.miner, miner)?;
                }
            }
        }
        user.spend_tokens(self.cost(), power_level);

        if payer_id != self.user_id() {
            facade::users::add_history(columns, current_block_id, payer_id, UserHistoryType::SponsoredTransaction, self.id)?;
            payer.operations += 1;
            facade::users::update(columns, current_block_id, payer_id, payer)?;
        }
        facade::users::add_history(columns, current_block_id, self.user_id(), UserHistoryType::OutgoingTransaction, self.id)?;
        user.operations += 1;
        facade::users::update(columns, current_block_id, self.user_id(), user)?;
        Ok(())
    }

    pub fn execute(&self, current_block_id: u32, columns: &Columns) -> CResult<()> {
        let bytes = self.serialize();
        facade::transactions::add(columns, self.id, current_block_id, bytes, self.duplication_hash());
        self.body.execute_specific(self, current_block_id, columns)?;
        if self.body.type_byte() != type_byte::INIT {
            self.execute_common(current_block_id, columns)?;
        }
        Ok(())
    }
}

pub(crate) fn resolve_user<'c>(columns: &'c Columns, current_block_id: u32) -> impl Fn(&UserId) -> Option<User> + 'c {
    move |id: &UserId| facade::users::get(columns, false, current_block_id, id).ok().flatten()
}
