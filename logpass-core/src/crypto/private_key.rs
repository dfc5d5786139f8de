use super::public_key::PublicKey;
use super::signature::Signature;
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;

/// An Ed25519 signing key. Never serialized by this crate — keys live
/// only in memory or in whatever key-storage the embedding binary
/// provides.
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl PrivateKey {
    pub fn generate() -> Self {
        let mut csprng = OsRng;
        PrivateKey {
            signing_key: SigningKey::generate(&mut csprng),
        }
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        PrivateKey {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_dalek(&self.signing_key.verifying_key())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature::from_dalek(self.signing_key.sign(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signs_and_verifies() {
        let key = PrivateKey::generate();
        let sig = key.sign(b"payload");
        assert!(key.public_key().verify(b"payload", &sig));
        assert!(!key.public_key().verify(b"tampered", &sig));
    }
}
