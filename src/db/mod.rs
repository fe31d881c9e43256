//! Redb-backed persistence.
//!
//! Every command body runs inside a single redb write transaction. Redb
//! admits one writer at a time, so concurrent command bodies are serialized,
//! and a failed body aborts the transaction which discards all of its writes.
//!
//! # Schema
//!
//! ```text
//! INVITES:       base64(public key) -> StoredInvite (serde_json)
//! FEED_MESSAGES: "feed_ref\0{sequence:020}" -> raw signed message
//! CONTACTS:      "author_ref\0contact_ref" -> ContactState (serde_json)
//! ```

mod feeds;
mod graph;
mod invites;

pub use feeds::RedbFeedRepository;
pub use graph::RedbSocialGraphRepository;
pub use invites::RedbInviteRepository;

use crate::error::Error;
use crate::handlers::{Adapters, TransactionProvider};
use crate::invite::Invite;
use redb::backends::InMemoryBackend;
use redb::{ReadableDatabase, WriteTransaction};
use ssb_proto::{FeedRef, Hops, IdentityRef, Message, MessageHmac, PublicIdentity, SocialGraph};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors from the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupted record: {0}")]
    Corrupted(String),
}

/// Handle to the pub database.
#[derive(Clone)]
pub struct Database {
    db: Arc<redb::Database>,
}

impl Database {
    /// Open or create the database file, creating parent directories as needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let db = Self::init(redb::Database::create(path)?)?;
        info!(path = %path.display(), "Database opened");
        Ok(db)
    }

    /// A database that lives only as long as this handle.
    pub fn in_memory() -> Result<Self, StorageError> {
        let db = redb::Database::builder().create_with_backend(InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: redb::Database) -> Result<Self, StorageError> {
        // Ensure tables exist
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(invites::INVITES)?;
            let _ = write_txn.open_table(feeds::FEED_MESSAGES)?;
            let _ = write_txn.open_table(graph::CONTACTS)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Build the transaction provider used by the command handlers.
    ///
    /// `local` is the pub identity the social graph is computed from, `hops`
    /// bounds how far it is expanded.
    pub fn transaction_provider(
        &self,
        local: IdentityRef,
        hops: Hops,
        hmac: Option<MessageHmac>,
    ) -> RedbTransactionProvider {
        RedbTransactionProvider {
            db: Arc::clone(&self.db),
            local,
            hops,
            hmac,
        }
    }

    /// Load a single invite.
    pub fn get_invite(&self, identity: &PublicIdentity) -> Result<Option<Invite>, StorageError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(invites::INVITES)?;
        invites::read_invite(&table, &invites::invite_key(identity))
    }

    /// All stored messages of a feed, oldest first.
    pub fn feed_messages(&self, feed: &FeedRef) -> Result<Vec<Message>, StorageError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(feeds::FEED_MESSAGES)?;
        feeds::read_messages(&table, feed)
    }

    /// The social graph as seen from `local`.
    pub fn social_graph(&self, local: IdentityRef, hops: Hops) -> Result<SocialGraph, StorageError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(graph::CONTACTS)?;
        graph::build_social_graph(&table, local, hops)
    }
}

/// Runs command bodies in a redb write transaction.
#[derive(Clone)]
pub struct RedbTransactionProvider {
    db: Arc<redb::Database>,
    local: IdentityRef,
    hops: Hops,
    hmac: Option<MessageHmac>,
}

impl RedbTransactionProvider {
    fn finish<R>(txn: WriteTransaction, result: Result<R, Error>) -> Result<R, Error> {
        match result {
            Ok(value) => {
                txn.commit().map_err(StorageError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(abort_err) = txn.abort() {
                    warn!(error = %abort_err, "Failed to abort transaction");
                }
                Err(err)
            }
        }
    }
}

impl TransactionProvider for RedbTransactionProvider {
    fn transact<R, F>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut Adapters<'_>) -> Result<R, Error>,
    {
        let txn = self.db.begin_write().map_err(StorageError::from)?;
        let result = {
            let mut invites = RedbInviteRepository::new(&txn);
            let social_graph = RedbSocialGraphRepository::new(&txn, self.local, self.hops);
            let mut feeds = RedbFeedRepository::new(&txn, self.hmac.clone());
            let mut adapters = Adapters {
                invites: &mut invites,
                social_graph: &social_graph,
                feeds: &mut feeds,
            };
            f(&mut adapters)
        };
        Self::finish(txn, result)
    }
}
