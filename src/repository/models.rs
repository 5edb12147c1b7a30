//! Diesel ORM models.
//!
//! Ids are stored as signed 64-bit integers; timestamps as RFC 3339 text.

use diesel::prelude::*;

use crate::schema;

/// Identity link record from the database.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = schema::identity_links)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct IdentityLinkRecord {
    pub lodestone_id: i64,
    pub discord_id: i64,
    pub forename: String,
    pub surname: String,
    pub server_name: String,
    pub data_center_name: String,
    pub linked_at: String,
}
