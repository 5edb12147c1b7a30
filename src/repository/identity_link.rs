//! Identity link repository.

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use super::models::IdentityLinkRecord;
use super::pool::{DbError, DbPool};
use super::util::to_diesel_error;
use crate::models::{CharacterProfile, IdentityLink};
use crate::schema::identity_links;
use crate::with_conn;

fn to_db_id(id: u64) -> Result<i64, DbError> {
    i64::try_from(id).map_err(|_| to_diesel_error(format!("id {} out of range", id)))
}

fn deserialization_error(message: String) -> DbError {
    DbError::DeserializationError(message.into())
}

impl TryFrom<&IdentityLink> for IdentityLinkRecord {
    type Error = DbError;

    fn try_from(link: &IdentityLink) -> Result<Self, Self::Error> {
        Ok(IdentityLinkRecord {
            lodestone_id: to_db_id(link.lodestone_id)?,
            discord_id: to_db_id(link.discord_id)?,
            forename: link.profile.forename.clone(),
            surname: link.profile.surname.clone(),
            server_name: link.profile.server_name.clone(),
            data_center_name: link.profile.data_center_name.clone(),
            // Fixed width so text ordering matches time ordering.
            linked_at: link.linked_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        })
    }
}

/// Convert a database record to a domain model.
impl TryFrom<IdentityLinkRecord> for IdentityLink {
    type Error = DbError;

    fn try_from(record: IdentityLinkRecord) -> Result<Self, Self::Error> {
        let id = |value: i64| {
            u64::try_from(value)
                .map_err(|_| deserialization_error(format!("negative id {} in identity_links", value)))
        };
        let linked_at = DateTime::parse_from_rfc3339(&record.linked_at)
            .map_err(|e| deserialization_error(format!("bad linked_at '{}': {}", record.linked_at, e)))?
            .with_timezone(&Utc);

        Ok(IdentityLink {
            lodestone_id: id(record.lodestone_id)?,
            discord_id: id(record.discord_id)?,
            profile: CharacterProfile {
                forename: record.forename,
                surname: record.surname,
                server_name: record.server_name,
                data_center_name: record.data_center_name,
            },
            linked_at,
        })
    }
}

/// Persistent identity links, unique per Lodestone character.
#[derive(Clone)]
pub struct IdentityLinkRepository {
    pool: DbPool,
}

impl IdentityLinkRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a link, or re-point an existing character at a new Discord user.
    ///
    /// On conflict the Discord id, display fields and link time are replaced.
    /// Other links held by the previous Discord user are left untouched.
    pub async fn upsert(&self, link: &IdentityLink) -> Result<(), DbError> {
        let record = IdentityLinkRecord::try_from(link)?;

        with_conn!(self.pool, conn => {
            diesel::insert_into(identity_links::table)
                .values(&record)
                .on_conflict(identity_links::lodestone_id)
                .do_update()
                .set((
                    identity_links::discord_id.eq(excluded(identity_links::discord_id)),
                    identity_links::forename.eq(excluded(identity_links::forename)),
                    identity_links::surname.eq(excluded(identity_links::surname)),
                    identity_links::server_name.eq(excluded(identity_links::server_name)),
                    identity_links::data_center_name.eq(excluded(identity_links::data_center_name)),
                    identity_links::linked_at.eq(excluded(identity_links::linked_at)),
                ))
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }

    /// Get the link for a Lodestone character.
    pub async fn get(&self, lodestone_id: u64) -> Result<Option<IdentityLink>, DbError> {
        let lodestone_id = to_db_id(lodestone_id)?;
        with_conn!(self.pool, conn => {
            identity_links::table
                .find(lodestone_id)
                .first::<IdentityLinkRecord>(&mut conn)
                .await
                .optional()
                .and_then(|opt| opt.map(IdentityLink::try_from).transpose())
        })
    }

    /// Most recently linked character of a Discord user.
    pub async fn latest_for_discord(&self, discord_id: u64) -> Result<Option<IdentityLink>, DbError> {
        let discord_id = to_db_id(discord_id)?;
        with_conn!(self.pool, conn => {
            identity_links::table
                .filter(identity_links::discord_id.eq(discord_id))
                .order(identity_links::linked_at.desc())
                .first::<IdentityLinkRecord>(&mut conn)
                .await
                .optional()
                .and_then(|opt| opt.map(IdentityLink::try_from).transpose())
        })
    }

    /// Every character linked to a Discord user, newest first.
    pub async fn for_discord(&self, discord_id: u64) -> Result<Vec<IdentityLink>, DbError> {
        let discord_id = to_db_id(discord_id)?;
        with_conn!(self.pool, conn => {
            identity_links::table
                .filter(identity_links::discord_id.eq(discord_id))
                .order(identity_links::linked_at.desc())
                .load::<IdentityLinkRecord>(&mut conn)
                .await
                .and_then(|records| records.into_iter().map(IdentityLink::try_from).collect())
        })
    }

    /// Number of stored links.
    pub async fn count(&self) -> Result<u64, DbError> {
        use diesel::dsl::count_star;
        with_conn!(self.pool, conn => {
            let count: i64 = identity_links::table
                .select(count_star())
                .first(&mut conn)
                .await?;
            Ok(count.max(0) as u64)
        })
    }
}
