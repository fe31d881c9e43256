//! Ed25519 identities.
//!
//! A [`PrivateIdentity`] is derived deterministically from a 32-byte seed, so
//! anything holding the seed holds the identity. Seeds are wiped from memory
//! when the identity is dropped and never appear in `Debug` output.

use crate::error::{ProtoError, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::{RngCore, rngs::OsRng};
use ring::signature::{ED25519, Ed25519KeyPair, KeyPair, UnparsedPublicKey};
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Length of an ed25519 seed in bytes.
pub const SEED_SIZE: usize = 32;

/// Length of an ed25519 public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Public half of an ed25519 identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicIdentity([u8; PUBLIC_KEY_SIZE]);

impl PublicIdentity {
    /// Build a public identity from raw key bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let key: [u8; PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| {
            ProtoError::InvalidKey(format!(
                "public key must be {} bytes, got {}",
                PUBLIC_KEY_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(key))
    }

    /// Raw public key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// True for the all-zero key, which is never produced by key derivation.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Verify an ed25519 signature over `msg`.
    pub fn verify(&self, msg: &[u8], signature: &[u8]) -> Result<()> {
        UnparsedPublicKey::new(&ED25519, &self.0)
            .verify(msg, signature)
            .map_err(|_| ProtoError::InvalidSignature)
    }
}

impl fmt::Debug for PublicIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicIdentity({})", STANDARD.encode(self.0))
    }
}

/// An ed25519 keypair together with the seed it was derived from.
#[derive(Clone)]
pub struct PrivateIdentity {
    seed: Zeroizing<[u8; SEED_SIZE]>,
    keypair: Arc<Ed25519KeyPair>,
    public: PublicIdentity,
}

impl PrivateIdentity {
    /// Derive an identity from a seed. The same seed always yields the same
    /// identity.
    pub fn from_seed(seed: &[u8; SEED_SIZE]) -> Result<Self> {
        let keypair = Ed25519KeyPair::from_seed_unchecked(seed)
            .map_err(|e| ProtoError::InvalidKey(e.to_string()))?;
        let public = PublicIdentity::from_bytes(keypair.public_key().as_ref())?;
        Ok(Self {
            seed: Zeroizing::new(*seed),
            keypair: Arc::new(keypair),
            public,
        })
    }

    /// Generate a fresh identity from the operating system RNG.
    pub fn generate() -> Result<Self> {
        let mut seed = Zeroizing::new([0u8; SEED_SIZE]);
        OsRng
            .try_fill_bytes(&mut seed[..])
            .map_err(|e| ProtoError::Rng(e.to_string()))?;
        Self::from_seed(&seed)
    }

    /// The public half of this identity.
    pub fn public(&self) -> PublicIdentity {
        self.public
    }

    /// The seed this identity was derived from. Treat it like a private key.
    pub fn seed(&self) -> &[u8; SEED_SIZE] {
        &self.seed
    }

    /// Sign `msg` with the private key.
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        self.keypair.sign(msg).as_ref().to_vec()
    }
}

impl PartialEq for PrivateIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.public == other.public
    }
}

impl Eq for PrivateIdentity {}

impl fmt::Debug for PrivateIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateIdentity")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let seed = [7u8; SEED_SIZE];
        let a = PrivateIdentity::from_seed(&seed).unwrap();
        let b = PrivateIdentity::from_seed(&seed).unwrap();
        assert_eq!(a.public(), b.public());
        assert_eq!(a.seed(), &seed);
    }

    #[test]
    fn different_seeds_give_different_identities() {
        let a = PrivateIdentity::from_seed(&[1u8; SEED_SIZE]).unwrap();
        let b = PrivateIdentity::from_seed(&[2u8; SEED_SIZE]).unwrap();
        assert_ne!(a.public(), b.public());
    }

    #[test]
    fn generated_identities_are_distinct_and_nonzero() {
        let a = PrivateIdentity::generate().unwrap();
        let b = PrivateIdentity::generate().unwrap();
        assert_ne!(a, b);
        assert!(!a.public().is_zero());
    }

    #[test]
    fn signatures_verify_against_own_key_only() {
        let a = PrivateIdentity::generate().unwrap();
        let b = PrivateIdentity::generate().unwrap();
        let sig = a.sign(b"hello");

        assert!(a.public().verify(b"hello", &sig).is_ok());
        assert!(a.public().verify(b"hellO", &sig).is_err());
        assert!(b.public().verify(b"hello", &sig).is_err());
    }

    #[test]
    fn public_identity_rejects_wrong_length() {
        assert!(PublicIdentity::from_bytes(&[0u8; 31]).is_err());
        assert!(PublicIdentity::from_bytes(&[0u8; 32]).unwrap().is_zero());
    }

    #[test]
    fn debug_output_does_not_contain_seed() {
        let seed = [0xAB; SEED_SIZE];
        let identity = PrivateIdentity::from_seed(&seed).unwrap();
        let debug = format!("{:?}", identity);
        assert!(!debug.contains(&STANDARD.encode(seed)));
        assert!(debug.contains("PublicIdentity"));
    }
}
