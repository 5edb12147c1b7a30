//! Data models for lodebot.

mod identity_link;

pub use identity_link::{CharacterProfile, IdentityLink};
