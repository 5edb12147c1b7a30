//! lodebot - Lodestone scraping engine and character verification.
//!
//! Scrapes the Final Fantasy XIV Lodestone through a JSON selector catalog
//! and links Discord users to their characters with a token placed in the
//! character profile.

pub mod cache;
pub mod cli;
pub mod config;
pub mod http_client;
pub mod lodestone;
pub mod models;
pub mod repository;
pub mod schema;
pub mod verification;

pub use config::Settings;
pub use lodestone::{LodestoneScraper, ScrapeError, SelectorStore};
pub use verification::{VerificationError, Verifier};
