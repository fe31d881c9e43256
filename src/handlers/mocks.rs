//! In-memory collaborators for handler tests.
//!
//! [`MockTransactionProvider`] runs each body against a copy of its state and
//! keeps the copy only if the body succeeds, which is enough to observe
//! rollback behaviour without a database.

use super::{
    Adapters, CurrentTimeProvider, FeedRepository, InviteRepository, Marshaler,
    SocialGraphRepository, TransactionProvider,
};
use crate::error::{ConflictError, Error};
use crate::invite::Invite;
use chrono::{DateTime, Utc};
use ssb_proto::{
    Feed, FeedHead, FeedRef, IdentityRef, KnownContent, Message, ProtoError, PublicIdentity,
    RawContent, SocialGraph,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Clone, Default)]
pub(crate) struct MockInviteRepository {
    invites: HashMap<PublicIdentity, Invite>,
    fail_puts: Option<ConflictError>,
}

impl InviteRepository for MockInviteRepository {
    fn put(&mut self, invite: &Invite) -> Result<(), Error> {
        if let Some(err) = self.fail_puts {
            return Err(err.into());
        }
        let key = invite.public_identity();
        if self.invites.contains_key(&key) {
            return Err(ConflictError::InviteExists.into());
        }
        self.invites.insert(key, invite.clone());
        Ok(())
    }

    fn update(
        &mut self,
        identity: &PublicIdentity,
        f: &mut dyn FnMut(&mut Invite) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let mut invite = self
            .invites
            .get(identity)
            .cloned()
            .ok_or_else(|| Error::NotFound(IdentityRef::from_public(*identity).to_string()))?;
        f(&mut invite)?;
        self.invites.insert(*identity, invite);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub(crate) struct MockSocialGraphRepository {
    graph: SocialGraph,
}

impl SocialGraphRepository for MockSocialGraphRepository {
    fn get_social_graph(&self) -> Result<SocialGraph, Error> {
        Ok(self.graph.clone())
    }
}

#[derive(Clone, Default)]
pub(crate) struct MockFeedRepository {
    heads: HashMap<FeedRef, FeedHead>,
    messages: Vec<Message>,
}

impl FeedRepository for MockFeedRepository {
    fn update_feed(
        &mut self,
        feed_ref: &FeedRef,
        f: &mut dyn FnMut(&mut Feed) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let mut feed = match self.heads.get(feed_ref) {
            Some(head) => Feed::from_head(*feed_ref, *head, None),
            None => Feed::new(*feed_ref, None),
        };
        f(&mut feed)?;
        if let Some(head) = feed.head() {
            self.heads.insert(*feed_ref, head);
        }
        self.messages.extend(feed.pop_for_persisting());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MockState {
    invites: MockInviteRepository,
    social_graph: MockSocialGraphRepository,
    feeds: MockFeedRepository,
}

#[derive(Default)]
pub(crate) struct MockTransactionProvider {
    state: Mutex<MockState>,
    transactions: AtomicUsize,
}

impl MockTransactionProvider {
    pub fn with_invite(invite: Invite) -> Self {
        let provider = Self::default();
        provider
            .state
            .lock()
            .unwrap()
            .invites
            .invites
            .insert(invite.public_identity(), invite);
        provider
    }

    pub fn set_social_graph(&self, graph: SocialGraph) {
        self.state.lock().unwrap().social_graph.graph = graph;
    }

    pub fn fail_puts_with(&self, err: ConflictError) {
        self.state.lock().unwrap().invites.fail_puts = Some(err);
    }

    pub fn invite(&self, identity: &PublicIdentity) -> Option<Invite> {
        self.state.lock().unwrap().invites.invites.get(identity).cloned()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().unwrap().feeds.messages.clone()
    }

    pub fn transactions(&self) -> usize {
        self.transactions.load(Ordering::SeqCst)
    }
}

impl TransactionProvider for MockTransactionProvider {
    fn transact<R, F>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut Adapters<'_>) -> Result<R, Error>,
    {
        self.transactions.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let mut working = state.clone();
        let result = f(&mut Adapters {
            invites: &mut working.invites,
            social_graph: &working.social_graph,
            feeds: &mut working.feeds,
        });
        if result.is_ok() {
            *state = working;
        }
        result
    }
}

/// Clock stuck at a fixed instant.
pub(crate) struct FixedClock(pub DateTime<Utc>);

impl CurrentTimeProvider for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Marshaler that always fails.
pub(crate) struct FailingMarshaler;

impl Marshaler for FailingMarshaler {
    fn marshal(&self, _content: &KnownContent) -> Result<RawContent, Error> {
        Err(Error::Marshal(ProtoError::UnknownContent))
    }
}
