//! Cryptographic primitives and identifiers: hashing, Ed25519 keys and
//! signatures, the fixed-size id types derived from them, and the
//! power-weighted multi-signature envelope used to authorize every
//! transaction.

pub mod encoding;
pub mod hash;
pub mod miner_id;
pub mod multisig;
pub mod private_key;
pub mod public_key;
pub mod signature;
pub mod transaction_id;
pub mod user_id;

pub use hash::Hash;
pub use miner_id::MinerId;
pub use multisig::{EnvelopeType, MultiSignatures, MAX_CO_SIGNERS, SIGNING_DOMAIN_PREFIX};
pub use private_key::PrivateKey;
pub use public_key::{KeyType, PublicKey};
pub use signature::Signature;
pub use transaction_id::TransactionId;
pub use user_id::UserId;
