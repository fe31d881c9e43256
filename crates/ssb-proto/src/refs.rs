//! Sigil-prefixed references.
//!
//! Identities and feeds are written as `@<base64 public key>.ed25519`,
//! messages as `%<base64 sha256>.sha256`. All references serialize to and
//! from these strings.

use crate::error::{ProtoError, Result};
use crate::identity::PublicIdentity;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const ED25519_SUFFIX: &str = ".ed25519";
const SHA256_SUFFIX: &str = ".sha256";

fn parse_sigil<'a>(kind: &'static str, s: &'a str, sigil: char, suffix: &str) -> Result<&'a str> {
    s.strip_prefix(sigil)
        .and_then(|rest| rest.strip_suffix(suffix))
        .ok_or_else(|| ProtoError::InvalidRef {
            kind,
            value: s.to_string(),
        })
}

fn parse_key(kind: &'static str, s: &str) -> Result<PublicIdentity> {
    let encoded = parse_sigil(kind, s, '@', ED25519_SUFFIX)?;
    let bytes = STANDARD.decode(encoded)?;
    PublicIdentity::from_bytes(&bytes).map_err(|_| ProtoError::InvalidRef {
        kind,
        value: s.to_string(),
    })
}

macro_rules! string_serde {
    ($name:ident) => {
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }
    };
}

/// Reference to an identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityRef(PublicIdentity);

impl IdentityRef {
    /// Reference the given public identity.
    pub fn from_public(public: PublicIdentity) -> Self {
        Self(public)
    }

    /// The referenced public identity.
    pub fn public(&self) -> PublicIdentity {
        self.0
    }

    /// The main feed owned by this identity.
    pub fn main_feed(&self) -> FeedRef {
        FeedRef(self.0)
    }

    /// True if this references the all-zero key.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for IdentityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}{}", STANDARD.encode(self.0.as_bytes()), ED25519_SUFFIX)
    }
}

impl FromStr for IdentityRef {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self> {
        parse_key("identity", s).map(Self)
    }
}

string_serde!(IdentityRef);

/// Reference to a feed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedRef(PublicIdentity);

impl FeedRef {
    /// The identity that owns and signs this feed.
    pub fn identity(&self) -> IdentityRef {
        IdentityRef(self.0)
    }

    /// True if this references the all-zero key.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for FeedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}{}", STANDARD.encode(self.0.as_bytes()), ED25519_SUFFIX)
    }
}

impl FromStr for FeedRef {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self> {
        parse_key("feed", s).map(Self)
    }
}

string_serde!(FeedRef);

/// Reference to a message, by the sha256 hash of its raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef([u8; 32]);

impl MessageRef {
    /// Wrap a sha256 digest.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The sha256 digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// True for the all-zero hash.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Display for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}{}", STANDARD.encode(self.0), SHA256_SUFFIX)
    }
}

impl FromStr for MessageRef {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self> {
        let encoded = parse_sigil("message", s, '%', SHA256_SUFFIX)?;
        let bytes = STANDARD.decode(encoded)?;
        let hash: [u8; 32] = bytes.try_into().map_err(|_| ProtoError::InvalidRef {
            kind: "message",
            value: s.to_string(),
        })?;
        Ok(Self(hash))
    }
}

string_serde!(MessageRef);
