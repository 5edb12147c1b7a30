//! Identity links between Lodestone characters and Discord users.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Basic character info read from a Lodestone profile page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub forename: String,
    pub surname: String,
    pub server_name: String,
    pub data_center_name: String,
}

impl CharacterProfile {
    /// Build from a scraped `profile.character` mapping.
    ///
    /// `NAME` is split on its first space. `SERVER` must carry the `World`
    /// and `DC` capture groups. Returns the name of the first missing field.
    pub fn from_scraped(profile: &Value) -> Result<Self, &'static str> {
        let name = profile
            .get("NAME")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or("NAME")?;
        let (forename, surname) = name.split_once(' ').unwrap_or((name, ""));

        let server = profile.get("SERVER").ok_or("SERVER")?;
        let group = |key: &'static str| {
            server
                .get(key)
                .and_then(Value::as_str)
                .map(String::from)
                .ok_or(key)
        };

        Ok(Self {
            forename: forename.to_string(),
            surname: surname.trim().to_string(),
            server_name: group("World")?,
            data_center_name: group("DC")?,
        })
    }

    pub fn full_name(&self) -> String {
        if self.surname.is_empty() {
            self.forename.clone()
        } else {
            format!("{} {}", self.forename, self.surname)
        }
    }
}

/// A confirmed association of a Lodestone character with a Discord user.
///
/// Unique per character; a Discord user may hold several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityLink {
    pub lodestone_id: u64,
    pub discord_id: u64,
    pub profile: CharacterProfile,
    pub linked_at: DateTime<Utc>,
}

impl IdentityLink {
    pub fn new(lodestone_id: u64, discord_id: u64, profile: CharacterProfile) -> Self {
        Self {
            lodestone_id,
            discord_id,
            profile,
            // Stored with microsecond precision.
            linked_at: Utc::now().trunc_subsecs(6),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_from_scraped() {
        let scraped = json!({
            "NAME": "Alys Windrunner",
            "TITLE": null,
            "SERVER": { "World": "Cerberus", "DC": "Chaos" }
        });
        let profile = CharacterProfile::from_scraped(&scraped).unwrap();
        assert_eq!(profile.forename, "Alys");
        assert_eq!(profile.surname, "Windrunner");
        assert_eq!(profile.server_name, "Cerberus");
        assert_eq!(profile.data_center_name, "Chaos");
        assert_eq!(profile.full_name(), "Alys Windrunner");
    }

    #[test]
    fn test_profile_single_word_name() {
        let scraped = json!({ "NAME": "Mononym", "SERVER": { "World": "Ragnarok", "DC": "Chaos" } });
        let profile = CharacterProfile::from_scraped(&scraped).unwrap();
        assert_eq!(profile.forename, "Mononym");
        assert_eq!(profile.surname, "");
        assert_eq!(profile.full_name(), "Mononym");
    }

    #[test]
    fn test_profile_missing_fields() {
        assert_eq!(
            CharacterProfile::from_scraped(&json!({ "NAME": null })),
            Err("NAME")
        );
        assert_eq!(
            CharacterProfile::from_scraped(&json!({ "NAME": "A B", "SERVER": null })),
            Err("World")
        );
        assert_eq!(
            CharacterProfile::from_scraped(&json!({ "NAME": "A B" })),
            Err("SERVER")
        );
    }
}
