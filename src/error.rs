//! Unified error handling for ssb-pubd.
//!
//! Command input problems are [`ValidationError`]s, domain rule violations
//! are [`ConflictError`]s, storage failures are
//! [`StorageError`](crate::db::StorageError). The crate-level [`Error`] ties
//! them together and classifies them with [`Error::kind`].

use crate::db::StorageError;
use ssb_proto::ProtoError;
use thiserror::Error;

// ============================================================================
// Validation Errors (malformed input, detected before any I/O)
// ============================================================================

/// Errors from constructing invites and commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("zero value of seed")]
    ZeroSeed,

    #[error("invalid seed size")]
    InvalidSeedSize,

    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    #[error("number of uses must be positive if set")]
    NonPositiveUses,

    #[error("valid until is zero")]
    ZeroValidUntil,

    #[error("zero value of identity")]
    ZeroIdentity,

    #[error("zero value of feed to follow")]
    ZeroFeed,
}

impl ValidationError {
    /// Get a static error code string for log fields.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroSeed => "zero_seed",
            Self::InvalidSeedSize => "invalid_seed_size",
            Self::InvalidSeed(_) => "invalid_seed",
            Self::NonPositiveUses => "non_positive_uses",
            Self::ZeroValidUntil => "zero_valid_until",
            Self::ZeroIdentity => "zero_identity",
            Self::ZeroFeed => "zero_feed",
        }
    }
}

// ============================================================================
// Conflict Errors (domain rules)
// ============================================================================

/// Errors from invite state and social graph rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("this invite was already saved")]
    InviteExists,

    #[error("invite has no remaining uses")]
    NoRemainingUses,

    #[error("current time is after valid until")]
    Expired,

    #[error("given identity doesn't match this invite")]
    IdentityMismatch,

    #[error("already following this user")]
    AlreadyFollowing,
}

impl ConflictError {
    /// Get a static error code string for log fields.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InviteExists => "invite_exists",
            Self::NoRemainingUses => "no_remaining_uses",
            Self::Expired => "invite_expired",
            Self::IdentityMismatch => "identity_mismatch",
            Self::AlreadyFollowing => "already_following",
        }
    }
}

// ============================================================================
// Crate Error
// ============================================================================

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Conflict,
    NotFound,
    Storage,
    Marshal,
    Internal,
}

/// Errors returned by command handlers and the adapters behind them.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("invite not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to marshal content: {0}")]
    Marshal(#[source] ProtoError),

    #[error("failed to update feed: {0}")]
    Feed(#[source] ProtoError),

    #[error("failed to generate key: {0}")]
    Keygen(#[source] ProtoError),

    #[error("transaction failed: {0}")]
    Transaction(#[source] Box<Error>),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap an error returned from a transaction body.
    pub fn transaction(err: Error) -> Self {
        Self::Transaction(Box::new(err))
    }

    /// The innermost error, looking through transaction wrappers.
    pub fn root(&self) -> &Error {
        let mut err = self;
        while let Self::Transaction(inner) = err {
            err = inner;
        }
        err
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Self::Validation(_) => ErrorKind::InvalidArgument,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Marshal(_) => ErrorKind::Marshal,
            Self::Feed(_) | Self::Keygen(_) | Self::Internal(_) | Self::Transaction(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// The domain conflict behind this error, if any.
    pub fn as_conflict(&self) -> Option<ConflictError> {
        match self.root() {
            Self::Conflict(c) => Some(*c),
            _ => None,
        }
    }

    /// Get a static error code string for log fields.
    pub fn error_code(&self) -> &'static str {
        match self.root() {
            Self::Validation(e) => e.error_code(),
            Self::Conflict(e) => e.error_code(),
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage_error",
            Self::Marshal(_) => "marshal_error",
            Self::Feed(_) => "feed_error",
            Self::Keygen(_) => "keygen_error",
            Self::Transaction(_) | Self::Internal(_) => "internal_error",
        }
    }
}
