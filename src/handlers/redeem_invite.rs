//! Invite redemption.
//!
//! Redeeming an invite consumes one use and makes the pub publish a follow
//! for the redeemer's feed. Both happen in one transaction; if the invite is
//! exhausted, expired or presented by the wrong identity, or if the pub
//! already follows the feed, nothing is written.

use super::{CurrentTimeProvider, Marshaler, TransactionProvider};
use crate::error::{ConflictError, Error, ValidationError};
use crate::invite::Invite;
use crate::telemetry::spans;
use ssb_proto::{
    Feed, FeedRef, Hops, IdentityRef, KnownContent, MessageRef, PrivateIdentity, PubFollow,
    PublicIdentity,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Redeem an invite on behalf of a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemInvite {
    identity: PublicIdentity,
    feed_to_follow: FeedRef,
}

impl RedeemInvite {
    /// `identity` is the invite identity presented by the peer, `feed_to_follow`
    /// the peer's own feed.
    pub fn new(identity: PublicIdentity, feed_to_follow: FeedRef) -> Result<Self, ValidationError> {
        if identity.is_zero() {
            return Err(ValidationError::ZeroIdentity);
        }
        if feed_to_follow.is_zero() {
            return Err(ValidationError::ZeroFeed);
        }
        Ok(Self {
            identity,
            feed_to_follow,
        })
    }

    pub fn identity(&self) -> PublicIdentity {
        self.identity
    }

    pub fn feed_to_follow(&self) -> FeedRef {
        self.feed_to_follow
    }
}

/// Consumes invites and publishes follows.
#[derive(Clone)]
pub struct RedeemInviteHandler<T> {
    transaction: T,
    marshaler: Arc<dyn Marshaler>,
    clock: Arc<dyn CurrentTimeProvider>,
    local: PrivateIdentity,
}

impl<T: TransactionProvider> RedeemInviteHandler<T> {
    pub fn new(
        transaction: T,
        marshaler: Arc<dyn Marshaler>,
        clock: Arc<dyn CurrentTimeProvider>,
        local: PrivateIdentity,
    ) -> Self {
        Self {
            transaction,
            marshaler,
            clock,
            local,
        }
    }

    /// Redeem the invite and return the id of the published follow message.
    pub fn handle(&self, cmd: &RedeemInvite) -> Result<MessageRef, Error> {
        let identity = cmd.identity();
        let invite_ref = IdentityRef::from_public(identity);
        let local_feed = IdentityRef::from_public(self.local.public()).main_feed();
        let target = cmd.feed_to_follow().identity();
        let _span = spans::command("redeem_invite", &invite_ref.to_string()).entered();

        let follow = PubFollow::new(target).map_err(Error::Marshal)?;
        let content = self.marshaler.marshal(&KnownContent::PubFollow(follow))?;
        let now = self.clock.now();

        let result = self.transaction.transact(|adapters| {
            adapters
                .invites
                .update(&identity, &mut |invite: &mut Invite| {
                    Ok(invite.redeem(&identity, now)?)
                })?;

            let graph = adapters.social_graph.get_social_graph()?;
            if graph.hops_of(&target) == Some(Hops::new(1)) {
                return Err(ConflictError::AlreadyFollowing.into());
            }

            let mut published = None;
            adapters.feeds.update_feed(&local_feed, &mut |feed: &mut Feed| {
                let id = feed
                    .create_message(content.clone(), now, &self.local)
                    .map_err(Error::Feed)?;
                published = Some(id);
                Ok(())
            })?;

            published.ok_or_else(|| Error::Internal("feed update created no message".into()))
        });

        match result {
            Ok(id) => {
                info!(invite = %invite_ref, follow = %target, message = %id, "Invite redeemed");
                Ok(id)
            }
            Err(e) => {
                let err = Error::transaction(e);
                warn!(
                    invite = %invite_ref,
                    follow = %target,
                    code = err.error_code(),
                    error = %err,
                    "Invite redemption rejected"
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::formats::JsonMarshaler;
    use crate::handlers::mocks::{FailingMarshaler, FixedClock, MockTransactionProvider};
    use crate::invite::SecretKeySeed;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use ssb_proto::SocialGraph;
    use std::collections::HashMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn new_ref() -> IdentityRef {
        IdentityRef::from_public(PrivateIdentity::generate().unwrap().public())
    }

    fn invite(uses: Option<u32>, valid_until: Option<DateTime<Utc>>) -> Invite {
        Invite::new(SecretKeySeed::generate().unwrap(), uses, valid_until).unwrap()
    }

    struct Fixture {
        provider: MockTransactionProvider,
        local: PrivateIdentity,
        identity: PublicIdentity,
    }

    impl Fixture {
        fn new(invite: Invite) -> Self {
            let identity = invite.public_identity();
            Self {
                provider: MockTransactionProvider::with_invite(invite),
                local: PrivateIdentity::generate().unwrap(),
                identity,
            }
        }

        fn handler(&self) -> RedeemInviteHandler<&MockTransactionProvider> {
            RedeemInviteHandler::new(
                &self.provider,
                Arc::new(JsonMarshaler),
                Arc::new(FixedClock(now())),
                self.local.clone(),
            )
        }

        fn redeem(&self, target: IdentityRef) -> Result<MessageRef, Error> {
            self.handler()
                .handle(&RedeemInvite::new(self.identity, target.main_feed()).unwrap())
        }
    }

    #[test]
    fn command_rejects_zero_values() {
        let zero = PublicIdentity::from_bytes(&[0u8; 32]).unwrap();
        let feed = new_ref().main_feed();
        assert_eq!(
            RedeemInvite::new(zero, feed).unwrap_err(),
            ValidationError::ZeroIdentity
        );
        let identity = new_ref().public();
        assert_eq!(
            RedeemInvite::new(identity, IdentityRef::from_public(zero).main_feed()).unwrap_err(),
            ValidationError::ZeroFeed
        );
    }

    #[test]
    fn redeeming_publishes_a_pub_follow() {
        let fixture = Fixture::new(invite(Some(2), None));
        let target = new_ref();

        let id = fixture.redeem(target).unwrap();

        let messages = fixture.provider.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id(), id);
        assert_eq!(
            messages[0].author(),
            IdentityRef::from_public(fixture.local.public())
        );
        assert_eq!(messages[0].timestamp(), now());
        assert_eq!(
            KnownContent::unmarshal(messages[0].content()).unwrap(),
            KnownContent::PubFollow(PubFollow::new(target).unwrap())
        );
        assert_eq!(
            fixture.provider.invite(&fixture.identity).unwrap().remaining_uses(),
            Some(1)
        );
    }

    #[test]
    fn already_followed_feeds_roll_back_the_invite() {
        let fixture = Fixture::new(invite(Some(2), None));
        let target = new_ref();
        fixture
            .provider
            .set_social_graph(SocialGraph::new(HashMap::from([(target, Hops::new(1))])));

        let err = fixture.redeem(target).unwrap_err();

        assert_eq!(err.to_string(), "transaction failed: already following this user");
        assert_eq!(err.as_conflict(), Some(ConflictError::AlreadyFollowing));
        assert_eq!(
            fixture.provider.invite(&fixture.identity).unwrap().remaining_uses(),
            Some(2)
        );
        assert!(fixture.provider.messages().is_empty());
    }

    #[test]
    fn feeds_further_away_can_be_followed() {
        let fixture = Fixture::new(invite(Some(1), None));
        let target = new_ref();
        fixture
            .provider
            .set_social_graph(SocialGraph::new(HashMap::from([(target, Hops::new(2))])));

        assert!(fixture.redeem(target).is_ok());
    }

    #[test]
    fn exhausted_invites_are_rejected() {
        let fixture = Fixture::new(invite(Some(1), None));
        fixture.redeem(new_ref()).unwrap();

        let err = fixture.redeem(new_ref()).unwrap_err();
        assert_eq!(err.as_conflict(), Some(ConflictError::NoRemainingUses));
        assert_eq!(fixture.provider.messages().len(), 1);
    }

    #[test]
    fn expiry_is_checked_against_the_clock() {
        let fixture = Fixture::new(invite(None, Some(now())));
        assert!(fixture.redeem(new_ref()).is_ok());

        let expired = Fixture::new(invite(None, Some(now() - Duration::seconds(1))));
        let err = expired.redeem(new_ref()).unwrap_err();
        assert_eq!(err.as_conflict(), Some(ConflictError::Expired));
        assert!(expired.provider.messages().is_empty());
    }

    #[test]
    fn unknown_invites_are_not_found() {
        let fixture = Fixture::new(invite(None, None));
        let stranger = SecretKeySeed::generate().unwrap().identity().unwrap().public();

        let err = fixture
            .handler()
            .handle(&RedeemInvite::new(stranger, new_ref().main_feed()).unwrap())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(fixture.provider.messages().is_empty());
    }

    #[test]
    fn marshal_failures_happen_before_the_transaction() {
        let fixture = Fixture::new(invite(Some(1), None));
        let handler = RedeemInviteHandler::new(
            &fixture.provider,
            Arc::new(FailingMarshaler),
            Arc::new(FixedClock(now())),
            fixture.local.clone(),
        );

        let err = handler
            .handle(&RedeemInvite::new(fixture.identity, new_ref().main_feed()).unwrap())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Marshal);
        assert_eq!(fixture.provider.transactions(), 0);
        assert_eq!(
            fixture.provider.invite(&fixture.identity).unwrap().remaining_uses(),
            Some(1)
        );
    }

    #[test]
    fn consecutive_follows_chain_in_the_local_feed() {
        let fixture = Fixture::new(invite(None, None));
        let first = fixture.redeem(new_ref()).unwrap();
        fixture.redeem(new_ref()).unwrap();

        let messages = fixture.provider.messages();
        assert_eq!(messages[1].sequence(), 2);
        assert_eq!(messages[1].previous(), Some(first));
    }
}
