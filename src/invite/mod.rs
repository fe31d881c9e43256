//! The invite aggregate.
//!
//! An invite is keyed by the public identity derived from its seed. It can be
//! limited in the number of uses and in time; each successful redemption
//! consumes exactly one use.

mod seed;

pub use seed::SecretKeySeed;

use crate::error::{ConflictError, ValidationError};
use chrono::{DateTime, Utc};
use ssb_proto::{PrivateIdentity, PublicIdentity};
use std::fmt;

/// Invite state.
#[derive(Clone, PartialEq, Eq)]
pub struct Invite {
    seed: SecretKeySeed,
    identity: PrivateIdentity,
    remaining_uses: Option<u32>,
    valid_until: Option<DateTime<Utc>>,
}

impl Invite {
    /// Create a new invite.
    ///
    /// `number_of_uses` of `None` means unlimited; `Some(0)` is rejected.
    /// `valid_until` of `None` means the invite never expires.
    pub fn new(
        seed: SecretKeySeed,
        number_of_uses: Option<u32>,
        valid_until: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        if number_of_uses == Some(0) {
            return Err(ValidationError::NonPositiveUses);
        }
        Self::build(seed, number_of_uses, valid_until)
    }

    /// Rebuild an invite loaded from storage. Unlike [`Invite::new`] this
    /// accepts an exhausted invite with zero remaining uses.
    pub fn from_history(
        seed: SecretKeySeed,
        remaining_uses: Option<u32>,
        valid_until: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        Self::build(seed, remaining_uses, valid_until)
    }

    fn build(
        seed: SecretKeySeed,
        remaining_uses: Option<u32>,
        valid_until: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        if seed.is_zero() {
            return Err(ValidationError::ZeroSeed);
        }
        if valid_until.is_some_and(is_zero_time) {
            return Err(ValidationError::ZeroValidUntil);
        }
        let identity = seed
            .identity()
            .map_err(|e| ValidationError::InvalidSeed(e.to_string()))?;
        Ok(Self {
            seed,
            identity,
            remaining_uses,
            valid_until,
        })
    }

    /// Consume one use on behalf of `presented`.
    ///
    /// Fails without touching the invite if it is exhausted, expired
    /// (`now` strictly after `valid_until`), or if `presented` is not the
    /// identity derived from this invite's seed.
    pub fn redeem(
        &mut self,
        presented: &PublicIdentity,
        now: DateTime<Utc>,
    ) -> Result<(), ConflictError> {
        if self.remaining_uses == Some(0) {
            return Err(ConflictError::NoRemainingUses);
        }
        if let Some(valid_until) = self.valid_until
            && valid_until < now
        {
            return Err(ConflictError::Expired);
        }
        if *presented != self.identity.public() {
            return Err(ConflictError::IdentityMismatch);
        }
        if let Some(uses) = self.remaining_uses.as_mut() {
            *uses -= 1;
        }
        Ok(())
    }

    pub fn seed(&self) -> &SecretKeySeed {
        &self.seed
    }

    /// The keypair derived from the seed.
    pub fn identity(&self) -> &PrivateIdentity {
        &self.identity
    }

    /// Shorthand for the public half of [`Invite::identity`].
    pub fn public_identity(&self) -> PublicIdentity {
        self.identity.public()
    }

    /// Uses left, `None` if unlimited.
    pub fn remaining_uses(&self) -> Option<u32> {
        self.remaining_uses
    }

    /// Expiry, `None` if the invite never expires.
    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.valid_until
    }
}

impl fmt::Debug for Invite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invite")
            .field("identity", &self.identity.public())
            .field("remaining_uses", &self.remaining_uses)
            .field("valid_until", &self.valid_until)
            .finish_non_exhaustive()
    }
}

/// The zero timestamp is the Unix epoch.
fn is_zero_time(t: DateTime<Utc>) -> bool {
    t == DateTime::<Utc>::UNIX_EPOCH
}
