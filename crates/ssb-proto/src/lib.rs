//! # ssb-proto
//!
//! Primitives shared by the pub daemon and anything else that needs to speak
//! about feeds: ed25519 identities, the `@`/`%` reference formats, contact
//! message content and its JSON mapping, signed feed messages and the
//! social graph built from them.
//!
//! ## Quick Start
//!
//! ```rust
//! use ssb_proto::{IdentityRef, PrivateIdentity};
//!
//! let identity = PrivateIdentity::generate().expect("system rng");
//! let iref = IdentityRef::from_public(identity.public());
//! assert!(iref.to_string().ends_with(".ed25519"));
//!
//! let parsed: IdentityRef = iref.to_string().parse().unwrap();
//! assert_eq!(parsed, iref);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod content;
pub mod error;
pub mod feed;
pub mod graph;
pub mod identity;
pub mod message;
pub mod refs;

pub use content::{Contact, ContactAction, ContactActions, KnownContent, PubFollow};
pub use error::{ProtoError, Result};
pub use feed::{Feed, FeedHead};
pub use graph::{Hops, SocialGraph};
pub use identity::{PrivateIdentity, PublicIdentity, SEED_SIZE};
pub use message::{Message, MessageHmac, RawContent};
pub use refs::{FeedRef, IdentityRef, MessageRef};
