//! Integration test common infrastructure.
//!
//! Provides a pub backed by an on-disk redb database in a temporary directory.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use ssb_proto::{FeedRef, Hops, IdentityRef, Message, PrivateIdentity};
use ssb_pubd::db::{Database, RedbTransactionProvider};
use ssb_pubd::formats::JsonMarshaler;
use ssb_pubd::handlers::{
    CreateInvite, CreateInviteHandler, CurrentTimeProvider, RedeemInvite, RedeemInviteHandler,
};
use ssb_pubd::{Error, Invite, SecretKeySeed};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Clock the tests can move.
#[derive(Debug)]
pub struct TestClock(Mutex<DateTime<Utc>>);

impl TestClock {
    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }
}

impl CurrentTimeProvider for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// A pub instance for testing.
pub struct TestPub {
    pub db: Database,
    pub local: PrivateIdentity,
    pub clock: Arc<TestClock>,
    pub create: CreateInviteHandler<RedbTransactionProvider>,
    pub redeem: RedeemInviteHandler<RedbTransactionProvider>,
    _dir: TempDir,
}

impl TestPub {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::create(dir.path().join("pubd.redb")).unwrap();
        let local = PrivateIdentity::generate().unwrap();
        let provider = db.transaction_provider(Self::iref(&local), Hops::new(1), None);
        let clock = Arc::new(TestClock(Mutex::new(Utc::now())));

        Self {
            create: CreateInviteHandler::new(provider.clone()),
            redeem: RedeemInviteHandler::new(
                provider,
                Arc::new(JsonMarshaler),
                Arc::clone(&clock) as Arc<dyn CurrentTimeProvider>,
                local.clone(),
            ),
            db,
            local,
            clock,
            _dir: dir,
        }
    }

    fn iref(identity: &PrivateIdentity) -> IdentityRef {
        IdentityRef::from_public(identity.public())
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn create_invite(
        &self,
        uses: Option<u32>,
        valid_until: Option<DateTime<Utc>>,
    ) -> SecretKeySeed {
        self.create
            .handle(&CreateInvite::new(uses, valid_until))
            .expect("create invite")
    }

    pub fn redeem(&self, seed: &SecretKeySeed, feed: FeedRef) -> Result<(), Error> {
        let cmd = RedeemInvite::new(seed.identity().unwrap().public(), feed).unwrap();
        self.redeem.handle(&cmd).map(|_| ())
    }

    pub fn invite(&self, seed: &SecretKeySeed) -> Invite {
        self.db
            .get_invite(&seed.identity().unwrap().public())
            .unwrap()
            .expect("invite stored")
    }

    pub fn local_messages(&self) -> Vec<Message> {
        self.db
            .feed_messages(&Self::iref(&self.local).main_feed())
            .unwrap()
    }
}

/// A feed owned by a fresh random identity.
pub fn random_feed() -> FeedRef {
    IdentityRef::from_public(PrivateIdentity::generate().unwrap().public()).main_feed()
}
