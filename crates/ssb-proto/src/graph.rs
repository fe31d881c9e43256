//! Social graph snapshot.

use crate::refs::IdentityRef;
use std::collections::HashMap;

/// Distance from the local identity. The local identity is at 0, identities
/// it follows directly are at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hops(u32);

impl Hops {
    /// Wrap a hop count.
    pub const fn new(hops: u32) -> Self {
        Self(hops)
    }

    /// The hop count.
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Identities reachable from the local identity, with their distance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialGraph {
    hops: HashMap<IdentityRef, Hops>,
}

impl SocialGraph {
    /// Build a graph from known distances.
    pub fn new(hops: HashMap<IdentityRef, Hops>) -> Self {
        Self { hops }
    }

    /// Distance to `identity`, if it is in the graph.
    pub fn hops_of(&self, identity: &IdentityRef) -> Option<Hops> {
        self.hops.get(identity).copied()
    }

    /// True if `identity` is in the graph at any distance.
    pub fn has_contact(&self, identity: &IdentityRef) -> bool {
        self.hops.contains_key(identity)
    }

    /// Number of identities in the graph.
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    /// True if the graph holds no identities.
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Iterate over identities and their distances.
    pub fn iter(&self) -> impl Iterator<Item = (&IdentityRef, Hops)> {
        self.hops.iter().map(|(k, v)| (k, *v))
    }
}
