//! Invite records.

use super::StorageError;
use crate::error::{ConflictError, Error};
use crate::handlers::InviteRepository;
use crate::invite::{Invite, SecretKeySeed};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use redb::{ReadableTable, TableDefinition, WriteTransaction};
use serde::{Deserialize, Serialize};
use ssb_proto::PublicIdentity;
use tracing::debug;

/// Redb table for invites.
pub(super) const INVITES: TableDefinition<&str, &[u8]> = TableDefinition::new("invites");

/// Serialized invite.
#[derive(Serialize, Deserialize)]
struct StoredInvite {
    seed: SecretKeySeed,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remaining_uses: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    valid_until: Option<DateTime<Utc>>,
}

pub(super) fn invite_key(identity: &PublicIdentity) -> String {
    STANDARD.encode(identity.as_bytes())
}

fn encode(invite: &Invite) -> Result<Vec<u8>, StorageError> {
    let stored = StoredInvite {
        seed: invite.seed().clone(),
        remaining_uses: invite.remaining_uses(),
        valid_until: invite.valid_until(),
    };
    serde_json::to_vec(&stored).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode(key: &str, bytes: &[u8]) -> Result<Invite, StorageError> {
    let stored: StoredInvite =
        serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))?;
    let invite = Invite::from_history(stored.seed.clone(), stored.remaining_uses, stored.valid_until)
        .map_err(|e| StorageError::Corrupted(format!("invite {}: {}", key, e)))?;
    if invite_key(&invite.public_identity()) != key {
        return Err(StorageError::Corrupted(format!(
            "invite {}: seed does not match key",
            key
        )));
    }
    Ok(invite)
}

pub(super) fn read_invite<T>(table: &T, key: &str) -> Result<Option<Invite>, StorageError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    match table.get(key)? {
        Some(value) => decode(key, value.value()).map(Some),
        None => Ok(None),
    }
}

/// Invite repository bound to a write transaction.
pub struct RedbInviteRepository<'t> {
    txn: &'t WriteTransaction,
}

impl<'t> RedbInviteRepository<'t> {
    pub fn new(txn: &'t WriteTransaction) -> Self {
        Self { txn }
    }

    fn load(&self, key: &str) -> Result<Option<Invite>, StorageError> {
        let table = self.txn.open_table(INVITES)?;
        read_invite(&table, key)
    }

    fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let table = self.txn.open_table(INVITES)?;
        Ok(table.get(key)?.is_some())
    }

    fn store(&self, key: &str, invite: &Invite) -> Result<(), StorageError> {
        let value = encode(invite)?;
        let mut table = self.txn.open_table(INVITES)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }
}

impl InviteRepository for RedbInviteRepository<'_> {
    fn put(&mut self, invite: &Invite) -> Result<(), Error> {
        let key = invite_key(&invite.public_identity());
        if self.exists(&key)? {
            return Err(ConflictError::InviteExists.into());
        }
        self.store(&key, invite)?;
        debug!(identity = %key, "Saved invite");
        Ok(())
    }

    fn update(
        &mut self,
        identity: &PublicIdentity,
        f: &mut dyn FnMut(&mut Invite) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let key = invite_key(identity);
        let mut invite = self
            .load(&key)?
            .ok_or_else(|| Error::NotFound(key.clone()))?;
        f(&mut invite)?;
        self.store(&key, &invite)?;
        debug!(identity = %key, remaining_uses = ?invite.remaining_uses(), "Updated invite");
        Ok(())
    }
}
