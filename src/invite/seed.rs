//! Invite seeds.
//!
//! A seed is the secret half of an invite. Whoever holds it holds the private
//! key of the invite identity, so it is wiped on drop, compared in constant
//! time, and redacted from `Debug` output.

use crate::error::{Error, ValidationError};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ssb_proto::{PrivateIdentity, ProtoError, SEED_SIZE};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// 32 random bytes from which an invite identity is derived.
///
/// The default value is all zeroes and is never accepted by
/// [`Invite`](super::Invite).
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretKeySeed([u8; SEED_SIZE]);

impl SecretKeySeed {
    /// Generate a fresh seed from the operating system RNG.
    pub fn generate() -> Result<Self, Error> {
        let mut seed = Self::default();
        OsRng
            .try_fill_bytes(&mut seed.0)
            .map_err(|e| Error::Keygen(ProtoError::Rng(e.to_string())))?;
        Ok(seed)
    }

    /// Build a seed from raw bytes, which must be exactly 32 long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        let mut seed = Self::default();
        if bytes.len() != SEED_SIZE {
            return Err(ValidationError::InvalidSeedSize);
        }
        seed.0.copy_from_slice(bytes);
        Ok(seed)
    }

    /// Parse an invite code.
    pub fn from_base64(code: &str) -> Result<Self, ValidationError> {
        let bytes = Zeroizing::new(
            STANDARD
                .decode(code.trim())
                .map_err(|_| ValidationError::InvalidSeedSize)?,
        );
        Self::from_bytes(&bytes)
    }

    /// Encode as an invite code. The result is as secret as the seed.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// True for the all-zero seed.
    pub fn is_zero(&self) -> bool {
        self.0[..].ct_eq(&[0u8; SEED_SIZE][..]).into()
    }

    pub fn as_bytes(&self) -> &[u8; SEED_SIZE] {
        &self.0
    }

    /// Derive the keypair this seed stands for.
    pub fn identity(&self) -> Result<PrivateIdentity, ProtoError> {
        PrivateIdentity::from_seed(&self.0)
    }
}

impl PartialEq for SecretKeySeed {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for SecretKeySeed {}

impl fmt::Debug for SecretKeySeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKeySeed([REDACTED])")
    }
}

impl Serialize for SecretKeySeed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = Zeroizing::new(self.to_base64());
        serializer.serialize_str(&encoded)
    }
}

impl<'de> Deserialize<'de> for SecretKeySeed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = Zeroizing::new(String::deserialize(deserializer)?);
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}
