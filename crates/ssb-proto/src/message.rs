//! Signed feed messages.
//!
//! A message is serialized as
//! `{"previous","author","sequence","timestamp","hash","content","signature"}`.
//! The signature covers the same object without the `signature` field. When a
//! network key is configured the ed25519 signature is taken over
//! HMAC-SHA256(key, payload) instead of the payload itself, which keeps test
//! networks from accepting each other's messages.

use crate::error::{ProtoError, Result};
use crate::identity::{PrivateIdentity, PublicIdentity};
use crate::refs::{FeedRef, IdentityRef, MessageRef};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

const HASH_ALGORITHM: &str = "sha256";
const SIGNATURE_SUFFIX: &str = ".sig.ed25519";

/// Length of a message HMAC key in bytes.
pub const MESSAGE_HMAC_SIZE: usize = 32;

/// Encoded message content. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawContent(Vec<u8>);

impl RawContent {
    /// Wrap encoded content.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(ProtoError::ZeroValue("raw content"));
        }
        Ok(Self(bytes))
    }

    /// The encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Network key mixed into message signatures.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct MessageHmac([u8; MESSAGE_HMAC_SIZE]);

impl MessageHmac {
    /// Build a key from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let key: [u8; MESSAGE_HMAC_SIZE] =
            bytes.try_into().map_err(|_| ProtoError::InvalidHmac {
                expected: MESSAGE_HMAC_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self(key))
    }

    fn authenticate(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(&self.0).map_err(|_| {
            ProtoError::InvalidHmac {
                expected: MESSAGE_HMAC_SIZE,
                actual: self.0.len(),
            }
        })?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl fmt::Debug for MessageHmac {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MessageHmac(..)")
    }
}

#[derive(Serialize)]
struct UnsignedMessage<'a> {
    previous: Option<MessageRef>,
    author: IdentityRef,
    sequence: u64,
    timestamp: i64,
    hash: &'a str,
    content: &'a RawValue,
}

#[derive(Serialize)]
struct SignedMessage<'a> {
    previous: Option<MessageRef>,
    author: IdentityRef,
    sequence: u64,
    timestamp: i64,
    hash: &'a str,
    content: &'a RawValue,
    signature: String,
}

#[derive(Deserialize)]
struct TransportMessage {
    previous: Option<MessageRef>,
    author: IdentityRef,
    sequence: u64,
    timestamp: i64,
    hash: String,
    content: Box<RawValue>,
    signature: String,
}

/// A signed message in a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageRef,
    previous: Option<MessageRef>,
    sequence: u64,
    author: IdentityRef,
    timestamp: DateTime<Utc>,
    content: RawContent,
    signature: Vec<u8>,
    raw: Vec<u8>,
}

impl Message {
    /// Create and sign a message.
    pub fn sign(
        previous: Option<MessageRef>,
        sequence: u64,
        author: &PrivateIdentity,
        timestamp: DateTime<Utc>,
        content: RawContent,
        hmac: Option<&MessageHmac>,
    ) -> Result<Self> {
        let author_ref = IdentityRef::from_public(author.public());
        let raw_content: Box<RawValue> = serde_json::from_slice(content.as_bytes())?;
        let unsigned = UnsignedMessage {
            previous,
            author: author_ref,
            sequence,
            timestamp: timestamp.timestamp_millis(),
            hash: HASH_ALGORITHM,
            content: &raw_content,
        };

        let payload = serde_json::to_vec(&unsigned)?;
        let signature = author.sign(&signing_input(&payload, hmac)?);

        let raw = serde_json::to_vec(&SignedMessage {
            previous: unsigned.previous,
            author: unsigned.author,
            sequence: unsigned.sequence,
            timestamp: unsigned.timestamp,
            hash: unsigned.hash,
            content: unsigned.content,
            signature: format!("{}{}", STANDARD.encode(&signature), SIGNATURE_SUFFIX),
        })?;

        Ok(Self {
            id: message_id(&raw),
            previous,
            sequence,
            author: author_ref,
            timestamp: from_millis(timestamp.timestamp_millis())?,
            content,
            signature,
            raw,
        })
    }

    /// Parse a raw message without checking its signature. Used for messages
    /// read back from local storage.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let t: TransportMessage = serde_json::from_slice(raw)
            .map_err(|e| ProtoError::MalformedMessage(e.to_string()))?;
        if t.hash != HASH_ALGORITHM {
            return Err(ProtoError::MalformedMessage(format!(
                "unsupported hash {}",
                t.hash
            )));
        }
        let encoded = t.signature.strip_suffix(SIGNATURE_SUFFIX).ok_or_else(|| {
            ProtoError::MalformedMessage("signature has no ed25519 suffix".to_string())
        })?;
        let signature = STANDARD.decode(encoded)?;

        Ok(Self {
            id: message_id(raw),
            previous: t.previous,
            sequence: t.sequence,
            author: t.author,
            timestamp: from_millis(t.timestamp)?,
            content: RawContent::new(t.content.get().as_bytes().to_vec())?,
            signature,
            raw: raw.to_vec(),
        })
    }

    /// Check the signature against the author key.
    pub fn verify(&self, hmac: Option<&MessageHmac>) -> Result<()> {
        let content: Box<RawValue> = serde_json::from_slice(self.content.as_bytes())?;
        let payload = serde_json::to_vec(&UnsignedMessage {
            previous: self.previous,
            author: self.author,
            sequence: self.sequence,
            timestamp: self.timestamp.timestamp_millis(),
            hash: HASH_ALGORITHM,
            content: &content,
        })?;
        let author: PublicIdentity = self.author.public();
        author.verify(&signing_input(&payload, hmac)?, &self.signature)
    }

    /// Hash of the raw message.
    pub fn id(&self) -> MessageRef {
        self.id
    }

    /// Id of the preceding message, absent for the first message in a feed.
    pub fn previous(&self) -> Option<MessageRef> {
        self.previous
    }

    /// Position in the feed, starting at 1.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The signing identity.
    pub fn author(&self) -> IdentityRef {
        self.author
    }

    /// The feed this message belongs to.
    pub fn feed(&self) -> FeedRef {
        self.author.main_feed()
    }

    /// Claimed creation time, millisecond precision.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Encoded content.
    pub fn content(&self) -> &RawContent {
        &self.content
    }

    /// The message exactly as signed and stored.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

fn signing_input(payload: &[u8], hmac: Option<&MessageHmac>) -> Result<Vec<u8>> {
    match hmac {
        Some(key) => key.authenticate(payload),
        None => Ok(payload.to_vec()),
    }
}

fn message_id(raw: &[u8]) -> MessageRef {
    MessageRef::from_hash(Sha256::digest(raw).into())
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| ProtoError::MalformedMessage(format!("timestamp {} out of range", millis)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn content() -> RawContent {
        RawContent::new(br#"{"type":"contact","contact":"@sxlUkN7dW/qZ23Wid6J1IAnqWEJ3V13dT6TaFtn5LTc=.ed25519","following":true}"#.to_vec()).unwrap()
    }

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn signed_message_verifies_and_parses_back() {
        let author = PrivateIdentity::generate().unwrap();
        let msg = Message::sign(None, 1, &author, timestamp(), content(), None).unwrap();

        assert!(msg.verify(None).is_ok());

        let parsed = Message::parse(msg.raw()).unwrap();
        assert_eq!(parsed, msg);
        assert_eq!(parsed.id(), msg.id());
        assert_eq!(parsed.content(), &content());
        assert_eq!(parsed.feed(), IdentityRef::from_public(author.public()).main_feed());
    }

    #[test]
    fn raw_message_embeds_content_verbatim() {
        let author = PrivateIdentity::generate().unwrap();
        let msg = Message::sign(None, 1, &author, timestamp(), content(), None).unwrap();
        let raw = std::str::from_utf8(msg.raw()).unwrap();
        assert!(raw.contains(std::str::from_utf8(content().as_bytes()).unwrap()));
        assert!(raw.contains(r#""hash":"sha256""#));
        assert!(raw.contains(".sig.ed25519\""));
    }

    #[test]
    fn hmac_keys_separate_networks() {
        let author = PrivateIdentity::generate().unwrap();
        let key = MessageHmac::from_bytes(&[9u8; MESSAGE_HMAC_SIZE]).unwrap();
        let other = MessageHmac::from_bytes(&[8u8; MESSAGE_HMAC_SIZE]).unwrap();

        let msg = Message::sign(None, 1, &author, timestamp(), content(), Some(&key)).unwrap();
        assert!(msg.verify(Some(&key)).is_ok());
        assert!(matches!(msg.verify(None), Err(ProtoError::InvalidSignature)));
        assert!(matches!(msg.verify(Some(&other)), Err(ProtoError::InvalidSignature)));
    }

    #[test]
    fn tampered_message_fails_verification() {
        let author = PrivateIdentity::generate().unwrap();
        let msg = Message::sign(None, 1, &author, timestamp(), content(), None).unwrap();
        let tampered = std::str::from_utf8(msg.raw())
            .unwrap()
            .replace(r#""sequence":1"#, r#""sequence":2"#);
        let parsed = Message::parse(tampered.as_bytes()).unwrap();
        assert_ne!(parsed.id(), msg.id());
        assert!(parsed.verify(None).is_err());
    }

    #[test]
    fn hmac_rejects_wrong_length() {
        assert!(matches!(
            MessageHmac::from_bytes(&[0u8; 16]),
            Err(ProtoError::InvalidHmac { expected: 32, actual: 16 })
        ));
    }

    #[test]
    fn raw_content_must_not_be_empty() {
        assert!(RawContent::new(Vec::new()).is_err());
    }
}
