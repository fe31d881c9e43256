//! Invite issuance.

use super::TransactionProvider;
use crate::error::Error;
use crate::invite::{Invite, SecretKeySeed};
use crate::telemetry::spans;
use chrono::{DateTime, Utc};
use ssb_proto::IdentityRef;
use tracing::{info, warn};

/// Issue a new invite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateInvite {
    /// `None` for an unlimited invite.
    pub number_of_uses: Option<u32>,
    /// `None` for an invite that never expires.
    pub valid_until: Option<DateTime<Utc>>,
}

impl CreateInvite {
    pub fn new(number_of_uses: Option<u32>, valid_until: Option<DateTime<Utc>>) -> Self {
        Self {
            number_of_uses,
            valid_until,
        }
    }
}

/// Creates invites and records them.
#[derive(Clone)]
pub struct CreateInviteHandler<T> {
    transaction: T,
}

impl<T: TransactionProvider> CreateInviteHandler<T> {
    pub fn new(transaction: T) -> Self {
        Self { transaction }
    }

    /// Create an invite and return its seed, which is the invite code.
    ///
    /// The seed is the only copy of the invite secret handed out; callers
    /// show it once and must not log it.
    pub fn handle(&self, cmd: &CreateInvite) -> Result<SecretKeySeed, Error> {
        let seed = SecretKeySeed::generate()?;
        let invite = Invite::new(seed.clone(), cmd.number_of_uses, cmd.valid_until)?;
        let identity = IdentityRef::from_public(invite.public_identity());
        let _span = spans::command("create_invite", &identity.to_string()).entered();

        match self
            .transaction
            .transact(|adapters| adapters.invites.put(&invite))
        {
            Ok(()) => {
                info!(
                    identity = %identity,
                    remaining_uses = ?invite.remaining_uses(),
                    valid_until = ?invite.valid_until(),
                    "Invite created"
                );
                Ok(seed)
            }
            Err(e) => {
                let err = Error::transaction(e);
                warn!(identity = %identity, code = err.error_code(), error = %err, "Invite not created");
                Err(err)
            }
        }
    }
}
