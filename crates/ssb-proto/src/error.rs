//! Error types for the feed and identity primitives.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtoError`].
pub type Result<T, E = ProtoError> = std::result::Result<T, E>;

/// Errors produced while building or parsing identities, references,
/// content and messages.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtoError {
    /// Seed or key bytes were rejected by the signature backend.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The system random number generator failed.
    #[error("random number generator failure: {0}")]
    Rng(String),

    /// A reference string did not have the expected shape.
    #[error("invalid {kind} ref: {value}")]
    InvalidRef {
        /// Which kind of reference was being parsed.
        kind: &'static str,
        /// The offending input.
        value: String,
    },

    /// Base64 payload could not be decoded.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A value that must not be zero was zero.
    #[error("zero value of {0}")]
    ZeroValue(&'static str),

    /// Contact actions were empty or contradicted each other.
    #[error("invalid contact actions: {0}")]
    InvalidContactActions(&'static str),

    /// Content had a type or shape this crate does not know about.
    #[error("unknown content")]
    UnknownContent,

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The HMAC key had the wrong length.
    #[error("message hmac must be {expected} bytes, got {actual}")]
    InvalidHmac {
        /// Required length.
        expected: usize,
        /// Length that was provided.
        actual: usize,
    },

    /// A message was signed by someone other than the feed owner.
    #[error("feed {feed} can not be written by {author}")]
    FeedAuthorMismatch {
        /// The feed being appended to.
        feed: String,
        /// The identity that attempted the append.
        author: String,
    },

    /// Message sequence numbers overflowed.
    #[error("feed sequence overflow")]
    SequenceOverflow,

    /// Signature verification failed.
    #[error("invalid message signature")]
    InvalidSignature,

    /// A stored or received message could not be parsed.
    #[error("malformed message: {0}")]
    MalformedMessage(String),
}
