//! Known message content and its JSON mapping.
//!
//! Only contact messages are understood. A contact message published by a
//! pub with `"pub": true` and a single follow action is read back as a
//! [`PubFollow`]; every other valid contact message is a [`Contact`].

use crate::error::{ProtoError, Result};
use crate::message::RawContent;
use crate::refs::IdentityRef;
use serde::{Deserialize, Serialize};

const CONTACT_TYPE: &str = "contact";

/// A single change to the relationship with a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactAction {
    /// Start following.
    Follow,
    /// Stop following.
    Unfollow,
    /// Start blocking.
    Block,
    /// Stop blocking.
    Unblock,
}

/// A non-empty, non-contradictory set of contact actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactActions(Vec<ContactAction>);

impl ContactActions {
    /// Validate a list of actions.
    ///
    /// Rejects empty lists, duplicates, and the pairs follow/unfollow,
    /// block/unblock and follow/block.
    pub fn new(actions: Vec<ContactAction>) -> Result<Self> {
        if actions.is_empty() {
            return Err(ProtoError::InvalidContactActions("no actions"));
        }
        for (i, action) in actions.iter().enumerate() {
            if actions[i + 1..].contains(action) {
                return Err(ProtoError::InvalidContactActions("duplicate action"));
            }
        }
        let has = |a: ContactAction| actions.contains(&a);
        if has(ContactAction::Follow) && has(ContactAction::Unfollow) {
            return Err(ProtoError::InvalidContactActions("both follow and unfollow"));
        }
        if has(ContactAction::Block) && has(ContactAction::Unblock) {
            return Err(ProtoError::InvalidContactActions("both block and unblock"));
        }
        if has(ContactAction::Follow) && has(ContactAction::Block) {
            return Err(ProtoError::InvalidContactActions("both follow and block"));
        }
        Ok(Self(actions))
    }

    /// The actions, in the order they were given.
    pub fn list(&self) -> &[ContactAction] {
        &self.0
    }

    /// True if the set contains `action`.
    pub fn contains(&self, action: ContactAction) -> bool {
        self.0.contains(&action)
    }

    fn following(&self) -> Option<bool> {
        if self.contains(ContactAction::Follow) {
            Some(true)
        } else if self.contains(ContactAction::Unfollow) {
            Some(false)
        } else {
            None
        }
    }

    fn blocking(&self) -> Option<bool> {
        if self.contains(ContactAction::Block) {
            Some(true)
        } else if self.contains(ContactAction::Unblock) {
            Some(false)
        } else {
            None
        }
    }
}

/// A regular contact message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    contact: IdentityRef,
    actions: ContactActions,
}

impl Contact {
    /// Build a contact message.
    pub fn new(contact: IdentityRef, actions: ContactActions) -> Result<Self> {
        if contact.is_zero() {
            return Err(ProtoError::ZeroValue("contact"));
        }
        Ok(Self { contact, actions })
    }

    /// The identity this message is about.
    pub fn contact(&self) -> IdentityRef {
        self.contact
    }

    /// What happens to the relationship.
    pub fn actions(&self) -> &ContactActions {
        &self.actions
    }
}

/// A follow published by a pub as the result of an invite redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubFollow {
    contact: IdentityRef,
}

impl PubFollow {
    /// Build a pub follow message.
    pub fn new(contact: IdentityRef) -> Result<Self> {
        if contact.is_zero() {
            return Err(ProtoError::ZeroValue("contact"));
        }
        Ok(Self { contact })
    }

    /// The followed identity.
    pub fn contact(&self) -> IdentityRef {
        self.contact
    }

    /// A pub follow is always exactly a follow.
    pub fn actions(&self) -> ContactActions {
        ContactActions(vec![ContactAction::Follow])
    }
}

/// Content this crate can marshal and unmarshal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnownContent {
    /// A contact message.
    Contact(Contact),
    /// A pub follow.
    PubFollow(PubFollow),
}

impl KnownContent {
    /// The `type` field written for this content.
    pub fn content_type(&self) -> &'static str {
        CONTACT_TYPE
    }

    /// The identity and actions, for content that changes the social graph.
    pub fn contact_update(&self) -> (IdentityRef, ContactActions) {
        match self {
            Self::Contact(c) => (c.contact(), c.actions().clone()),
            Self::PubFollow(p) => (p.contact(), p.actions()),
        }
    }

    /// Encode as JSON content.
    pub fn marshal(&self) -> Result<RawContent> {
        let transport = match self {
            Self::Contact(c) => TransportContact {
                content_type: CONTACT_TYPE.to_string(),
                contact: c.contact(),
                following: c.actions().following(),
                blocking: c.actions().blocking(),
                is_pub: false,
            },
            Self::PubFollow(p) => TransportContact {
                content_type: CONTACT_TYPE.to_string(),
                contact: p.contact(),
                following: Some(true),
                blocking: None,
                is_pub: true,
            },
        };
        RawContent::new(serde_json::to_vec(&transport)?)
    }

    /// Decode JSON content. Anything that is not a valid contact message is
    /// [`ProtoError::UnknownContent`].
    pub fn unmarshal(raw: &RawContent) -> Result<Self> {
        let typed: TypedContent = serde_json::from_slice(raw.as_bytes())?;
        if typed.content_type.as_deref() != Some(CONTACT_TYPE) {
            return Err(ProtoError::UnknownContent);
        }

        let t: TransportContact = serde_json::from_slice(raw.as_bytes())?;

        let mut actions = Vec::with_capacity(2);
        match t.following {
            Some(true) => actions.push(ContactAction::Follow),
            Some(false) => actions.push(ContactAction::Unfollow),
            None => {}
        }
        match t.blocking {
            Some(true) => actions.push(ContactAction::Block),
            Some(false) => actions.push(ContactAction::Unblock),
            None => {}
        }
        let actions = ContactActions::new(actions).map_err(|_| ProtoError::UnknownContent)?;

        if t.is_pub && actions.list() == [ContactAction::Follow] {
            return Ok(Self::PubFollow(PubFollow::new(t.contact)?));
        }
        Ok(Self::Contact(Contact::new(t.contact, actions)?))
    }
}

#[derive(Deserialize)]
struct TypedContent {
    #[serde(rename = "type")]
    content_type: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct TransportContact {
    #[serde(rename = "type")]
    content_type: String,
    contact: IdentityRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    following: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    blocking: Option<bool>,
    #[serde(rename = "pub", default, skip_serializing_if = "is_false")]
    is_pub: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}
