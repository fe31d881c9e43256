//! Feed message log.

use super::StorageError;
use super::graph;
use crate::error::Error;
use crate::handlers::FeedRepository;
use redb::{ReadableTable, TableDefinition, WriteTransaction};
use ssb_proto::{Feed, FeedHead, FeedRef, KnownContent, Message, MessageHmac};
use tracing::debug;

/// Redb table for feed messages.
/// Key: "feed_ref\0{sequence:020}"
/// Value: raw signed message
pub(super) const FEED_MESSAGES: TableDefinition<&str, &[u8]> = TableDefinition::new("feed_messages");

fn message_key(feed: &FeedRef, sequence: u64) -> String {
    // Fixed-width sequence keeps keys in feed order
    format!("{}\0{:020}", feed, sequence)
}

fn feed_bounds(feed: &FeedRef) -> (String, String) {
    (format!("{}\0", feed), format!("{}\u{1}", feed))
}

fn parse(raw: &[u8]) -> Result<Message, StorageError> {
    Message::parse(raw).map_err(|e| StorageError::Corrupted(format!("feed message: {}", e)))
}

pub(super) fn read_head<T>(table: &T, feed: &FeedRef) -> Result<Option<FeedHead>, StorageError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let (start, end) = feed_bounds(feed);
    let mut range = table.range(start.as_str()..end.as_str())?;
    match range.next_back() {
        Some(item) => {
            let (_key, value) = item?;
            let msg = parse(value.value())?;
            Ok(Some(FeedHead {
                sequence: msg.sequence(),
                id: msg.id(),
            }))
        }
        None => Ok(None),
    }
}

pub(super) fn read_messages<T>(table: &T, feed: &FeedRef) -> Result<Vec<Message>, StorageError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let (start, end) = feed_bounds(feed);
    let mut messages = Vec::new();
    for item in table.range(start.as_str()..end.as_str())? {
        let (_key, value) = item?;
        messages.push(parse(value.value())?);
    }
    Ok(messages)
}

/// Feed repository bound to a write transaction.
///
/// Appended contact messages are also applied to the contact index, so the
/// social graph seen later in the same transaction already reflects them.
pub struct RedbFeedRepository<'t> {
    txn: &'t WriteTransaction,
    hmac: Option<MessageHmac>,
}

impl<'t> RedbFeedRepository<'t> {
    pub fn new(txn: &'t WriteTransaction, hmac: Option<MessageHmac>) -> Self {
        Self { txn, hmac }
    }

    fn load(&self, feed_ref: &FeedRef) -> Result<Feed, StorageError> {
        let table = self.txn.open_table(FEED_MESSAGES)?;
        Ok(match read_head(&table, feed_ref)? {
            Some(head) => Feed::from_head(*feed_ref, head, self.hmac.clone()),
            None => Feed::new(*feed_ref, self.hmac.clone()),
        })
    }

    fn persist(&self, messages: &[Message]) -> Result<(), StorageError> {
        {
            let mut table = self.txn.open_table(FEED_MESSAGES)?;
            for msg in messages {
                let key = message_key(&msg.feed(), msg.sequence());
                table.insert(key.as_str(), msg.raw())?;
            }
        }

        for msg in messages {
            if let Ok(content) = KnownContent::unmarshal(msg.content()) {
                let (contact, actions) = content.contact_update();
                graph::apply_contact(self.txn, &msg.author(), &contact, &actions)?;
            }
            debug!(
                feed = %msg.feed(),
                sequence = msg.sequence(),
                id = %msg.id(),
                "Appended message"
            );
        }
        Ok(())
    }
}

impl FeedRepository for RedbFeedRepository<'_> {
    fn update_feed(
        &mut self,
        feed_ref: &FeedRef,
        f: &mut dyn FnMut(&mut Feed) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let mut feed = self.load(feed_ref)?;
        f(&mut feed)?;
        self.persist(&feed.pop_for_persisting())?;
        Ok(())
    }
}
