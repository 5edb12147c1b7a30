//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM through diesel-async. SQLite by
//! default, PostgreSQL behind the `postgres` feature.

pub mod diesel_context;
pub mod identity_link;
pub mod models;
pub mod pool;
pub mod util;

pub use diesel_context::DieselDbContext;
pub use identity_link::IdentityLinkRepository;
pub use pool::{DbError, DbPool};
