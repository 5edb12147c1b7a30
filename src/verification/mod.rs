//! Proof that a Discord user controls a Lodestone character.

mod error;
mod protocol;
mod token;

pub use error::{VerificationError, VerificationResult};
pub use protocol::{VerificationState, Verifier, BIO_SELECTOR, PROFILE_SELECTOR};
pub use token::{cache_key, constant_time_eq, VerificationToken, TOKEN_TTL};
