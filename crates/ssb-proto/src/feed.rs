//! The feed aggregate.
//!
//! A [`Feed`] is loaded from its head, appended to in memory, and then
//! drained with [`Feed::pop_for_persisting`] by whoever stores it.

use crate::error::{ProtoError, Result};
use crate::identity::PrivateIdentity;
use crate::message::{Message, MessageHmac, RawContent};
use crate::refs::{FeedRef, IdentityRef, MessageRef};
use chrono::{DateTime, Utc};

/// Sequence and id of the last message in a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedHead {
    /// Sequence of the last message.
    pub sequence: u64,
    /// Id of the last message.
    pub id: MessageRef,
}

/// An append-only feed owned by a single identity.
#[derive(Debug)]
pub struct Feed {
    feed_ref: FeedRef,
    head: Option<FeedHead>,
    hmac: Option<MessageHmac>,
    pending: Vec<Message>,
}

impl Feed {
    /// A feed with no messages yet.
    pub fn new(feed_ref: FeedRef, hmac: Option<MessageHmac>) -> Self {
        Self {
            feed_ref,
            head: None,
            hmac,
            pending: Vec::new(),
        }
    }

    /// A feed whose last stored message is `head`.
    pub fn from_head(feed_ref: FeedRef, head: FeedHead, hmac: Option<MessageHmac>) -> Self {
        Self {
            feed_ref,
            head: Some(head),
            hmac,
            pending: Vec::new(),
        }
    }

    /// The feed being written.
    pub fn feed_ref(&self) -> FeedRef {
        self.feed_ref
    }

    /// The current head, including messages not yet persisted.
    pub fn head(&self) -> Option<FeedHead> {
        self.head
    }

    /// Append a new message signed by `author`, who must own this feed.
    pub fn create_message(
        &mut self,
        content: RawContent,
        timestamp: DateTime<Utc>,
        author: &PrivateIdentity,
    ) -> Result<MessageRef> {
        let author_ref = IdentityRef::from_public(author.public());
        if author_ref.main_feed() != self.feed_ref {
            return Err(ProtoError::FeedAuthorMismatch {
                feed: self.feed_ref.to_string(),
                author: author_ref.to_string(),
            });
        }

        let (previous, sequence) = match self.head {
            Some(head) => (
                Some(head.id),
                head.sequence
                    .checked_add(1)
                    .ok_or(ProtoError::SequenceOverflow)?,
            ),
            None => (None, 1),
        };

        let msg = Message::sign(
            previous,
            sequence,
            author,
            timestamp,
            content,
            self.hmac.as_ref(),
        )?;
        let id = msg.id();
        self.head = Some(FeedHead { sequence, id });
        self.pending.push(msg);
        Ok(id)
    }

    /// Take every message created since the feed was loaded.
    pub fn pop_for_persisting(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.pending)
    }
}
