//! ssb-pubd - invite issuance and redemption for a Scuttlebutt pub.
//!
//! A pub hands out invites. Each invite is a random seed; the identity
//! derived from it is the storage key and the credential a redeemer presents.
//! Redeeming an invite consumes one use and makes the pub publish a follow
//! for the redeemer's feed, atomically.

pub mod config;
pub mod db;
pub mod error;
pub mod formats;
pub mod handlers;
pub mod invite;
pub mod telemetry;

pub use error::{ConflictError, Error, ErrorKind, ValidationError};
pub use invite::{Invite, SecretKeySeed};
