//! Command handlers.
//!
//! Handlers are synchronous: each command runs its storage work as a single
//! unit through a [`TransactionProvider`], which hands the body an
//! [`Adapters`] bundle of repositories that all share the same transaction.

mod create_invite;
mod redeem_invite;

#[cfg(test)]
pub(crate) mod mocks;

pub use create_invite::{CreateInvite, CreateInviteHandler};
pub use redeem_invite::{RedeemInvite, RedeemInviteHandler};

use crate::error::Error;
use crate::formats::JsonMarshaler;
use crate::invite::Invite;
use chrono::{DateTime, Utc};
use ssb_proto::{Feed, FeedRef, KnownContent, PrivateIdentity, PublicIdentity, RawContent, SocialGraph};
use std::sync::Arc;

/// Invite storage.
pub trait InviteRepository {
    /// Save a new invite. Fails with a conflict if an invite with the same
    /// identity already exists.
    fn put(&mut self, invite: &Invite) -> Result<(), Error>;

    /// Load the invite stored under `identity`, pass it to `f` and save it
    /// if `f` succeeds. Fails with not found if there is no such invite.
    fn update(
        &mut self,
        identity: &PublicIdentity,
        f: &mut dyn FnMut(&mut Invite) -> Result<(), Error>,
    ) -> Result<(), Error>;
}

/// Read access to the social graph of the local identity.
pub trait SocialGraphRepository {
    fn get_social_graph(&self) -> Result<SocialGraph, Error>;
}

/// Feed storage.
pub trait FeedRepository {
    /// Load `feed`, pass it to `f` and persist the messages `f` created.
    fn update_feed(
        &mut self,
        feed: &FeedRef,
        f: &mut dyn FnMut(&mut Feed) -> Result<(), Error>,
    ) -> Result<(), Error>;
}

/// Repositories available inside a transaction.
pub struct Adapters<'a> {
    pub invites: &'a mut dyn InviteRepository,
    pub social_graph: &'a dyn SocialGraphRepository,
    pub feeds: &'a mut dyn FeedRepository,
}

/// Runs a unit of work atomically.
pub trait TransactionProvider {
    /// Call `f` exactly once. If it fails, every write it made is discarded
    /// and its error is returned unchanged.
    fn transact<R, F>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut Adapters<'_>) -> Result<R, Error>;
}

impl<P: TransactionProvider> TransactionProvider for &P {
    fn transact<R, F>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut Adapters<'_>) -> Result<R, Error>,
    {
        (**self).transact(f)
    }
}

/// Encodes message content.
pub trait Marshaler: Send + Sync {
    fn marshal(&self, content: &KnownContent) -> Result<RawContent, Error>;
}

/// Source of the current time.
pub trait CurrentTimeProvider: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl CurrentTimeProvider for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// All command handlers, wired to production collaborators.
#[derive(Clone)]
pub struct Application<T> {
    pub create_invite: CreateInviteHandler<T>,
    pub redeem_invite: RedeemInviteHandler<T>,
}

impl<T: TransactionProvider + Clone> Application<T> {
    /// Build the handlers. `local` is the pub identity that publishes
    /// follow messages.
    pub fn new(transaction: T, local: PrivateIdentity) -> Self {
        Self {
            create_invite: CreateInviteHandler::new(transaction.clone()),
            redeem_invite: RedeemInviteHandler::new(
                transaction,
                Arc::new(JsonMarshaler),
                Arc::new(SystemClock),
                local,
            ),
        }
    }
}
