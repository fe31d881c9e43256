//! Contact index and social graph.

use super::StorageError;
use crate::error::Error;
use crate::handlers::SocialGraphRepository;
use redb::{ReadableTable, TableDefinition, WriteTransaction};
use serde::{Deserialize, Serialize};
use ssb_proto::{ContactAction, ContactActions, Hops, IdentityRef, SocialGraph};
use std::collections::HashMap;

/// Redb table for the latest contact state between two identities.
/// Key: "author_ref\0contact_ref"
pub(super) const CONTACTS: TableDefinition<&str, &[u8]> = TableDefinition::new("contacts");

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
struct ContactState {
    following: bool,
    blocking: bool,
}

impl ContactState {
    fn apply(&mut self, actions: &ContactActions) {
        for action in actions.list() {
            match action {
                ContactAction::Follow => self.following = true,
                ContactAction::Unfollow => self.following = false,
                ContactAction::Block => self.blocking = true,
                ContactAction::Unblock => self.blocking = false,
            }
        }
    }
}

fn contact_key(author: &IdentityRef, contact: &IdentityRef) -> String {
    format!("{}\0{}", author, contact)
}

fn decode_state(key: &str, bytes: &[u8]) -> Result<ContactState, StorageError> {
    serde_json::from_slice(bytes)
        .map_err(|e| StorageError::Corrupted(format!("contact {:?}: {}", key, e)))
}

/// Record that `author` published `actions` about `contact`.
pub(super) fn apply_contact(
    txn: &WriteTransaction,
    author: &IdentityRef,
    contact: &IdentityRef,
    actions: &ContactActions,
) -> Result<(), StorageError> {
    let key = contact_key(author, contact);
    let mut table = txn.open_table(CONTACTS)?;
    let mut state = match table.get(key.as_str())? {
        Some(value) => decode_state(&key, value.value())?,
        None => ContactState::default(),
    };
    state.apply(actions);

    let value = serde_json::to_vec(&state).map_err(|e| StorageError::Serialization(e.to_string()))?;
    table.insert(key.as_str(), value.as_slice())?;
    Ok(())
}

/// Identities `author` follows and does not block.
fn followed_by<T>(table: &T, author: &IdentityRef) -> Result<Vec<IdentityRef>, StorageError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let start = format!("{}\0", author);
    let end = format!("{}\u{1}", author);
    let mut followed = Vec::new();
    for item in table.range(start.as_str()..end.as_str())? {
        let (key, value) = item?;
        let key = key.value();
        let state = decode_state(key, value.value())?;
        if !state.following || state.blocking {
            continue;
        }
        let contact: IdentityRef = key[start.len()..]
            .parse()
            .map_err(|e| StorageError::Corrupted(format!("contact {:?}: {}", key, e)))?;
        followed.push(contact);
    }
    Ok(followed)
}

/// Breadth-first expansion from `local` up to `max_hops`. Every identity
/// gets the smallest distance it is reachable at.
pub(super) fn build_social_graph<T>(
    table: &T,
    local: IdentityRef,
    max_hops: Hops,
) -> Result<SocialGraph, StorageError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let mut hops = HashMap::from([(local, Hops::new(0))]);
    let mut frontier = vec![local];

    for depth in 1..=max_hops.get() {
        let mut next = Vec::new();
        for author in &frontier {
            for contact in followed_by(table, author)? {
                if !hops.contains_key(&contact) {
                    hops.insert(contact, Hops::new(depth));
                    next.push(contact);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    Ok(SocialGraph::new(hops))
}

/// Social graph repository bound to a write transaction.
pub struct RedbSocialGraphRepository<'t> {
    txn: &'t WriteTransaction,
    local: IdentityRef,
    hops: Hops,
}

impl<'t> RedbSocialGraphRepository<'t> {
    pub fn new(txn: &'t WriteTransaction, local: IdentityRef, hops: Hops) -> Self {
        Self { txn, local, hops }
    }
}

impl SocialGraphRepository for RedbSocialGraphRepository<'_> {
    fn get_social_graph(&self) -> Result<SocialGraph, Error> {
        let table = self.txn.open_table(CONTACTS).map_err(StorageError::from)?;
        Ok(build_social_graph(&table, self.local, self.hops)?)
    }
}
