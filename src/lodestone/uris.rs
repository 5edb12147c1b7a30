//! Lodestone page locations for each selector file.
//!
//! Templates use `%s` slots filled positionally: region first, then the
//! entity id, then any extra ids. The table mirrors the site's current URL
//! scheme and must stay byte-identical to it.

use std::collections::HashMap;

use super::error::{ScrapeError, ScrapeResult};

/// Slot marker in location templates.
const SLOT: &str = "%s";

/// Location templates keyed by `<category>/<file>.json`.
pub const APPLICABLE_URIS: &[(&str, &str)] = &[
    ("freecompany/focus.json", "https://%s.finalfantasyxiv.com/lodestone/freecompany/%s/"),
    ("freecompany/freecompany.json", "https://%s.finalfantasyxiv.com/lodestone/freecompany/%s/"),
    ("freecompany/members.json", "https://%s.finalfantasyxiv.com/lodestone/freecompany/%s/member/"),
    ("freecompany/reputation.json", "https://%s.finalfantasyxiv.com/lodestone/freecompany/%s/"),
    ("freecompany/seeking.json", "https://%s.finalfantasyxiv.com/lodestone/freecompany/%s/"),

    ("profile/achievements.json", "https://%s.finalfantasyxiv.com/lodestone/character/%s/achievement/"),
    ("profile/attributes.json", "https://%s.finalfantasyxiv.com/lodestone/character/%s/"),
    ("profile/character.json", "https://%s.finalfantasyxiv.com/lodestone/character/%s/"),
    ("profile/classjob.json", "https://%s.finalfantasyxiv.com/lodestone/character/%s/class_job/"),
    ("profile/gearset.json", "https://%s.finalfantasyxiv.com/lodestone/character/%s/"),
    ("profile/minion.json", "https://%s.finalfantasyxiv.com/lodestone/character/%s/"),
    ("profile/mount.json", "https://%s.finalfantasyxiv.com/lodestone/character/%s/"),

    ("pvpteam/members.json", "https://%s.finalfantasyxiv.com/lodestone/pvpteam/%s/"),
    ("pvpteam/pvpteam.json", "https://%s.finalfantasyxiv.com/lodestone/pvpteam/%s/"),

    ("search/character.json", "https://%s.finalfantasyxiv.com/lodestone/character/"),
    ("search/freecompany.json", "https://%s.finalfantasyxiv.com/lodestone/freecompany/"),
    ("search/pvpteam.json", "https://%s.finalfantasyxiv.com/lodestone/pvpteam/"),
];

/// A page location with a fixed number of positional slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationTemplate {
    pattern: String,
    slots: usize,
}

impl LocationTemplate {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let slots = pattern.matches(SLOT).count();
        Self { pattern, slots }
    }

    /// Number of values the template expects.
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Fill every slot in order. `key` only labels the error.
    pub fn render(&self, key: &str, values: &[&str]) -> ScrapeResult<String> {
        if values.len() != self.slots {
            return Err(ScrapeError::TemplateMismatch {
                key: key.to_string(),
                expected: self.slots,
                provided: values.len(),
            });
        }

        let mut out = String::with_capacity(self.pattern.len() + values.iter().map(|v| v.len()).sum::<usize>());
        let mut pieces = self.pattern.split(SLOT);
        if let Some(first) = pieces.next() {
            out.push_str(first);
        }
        for (piece, value) in pieces.zip(values) {
            out.push_str(value);
            out.push_str(piece);
        }
        Ok(out)
    }
}

/// Maps catalog files to their page locations.
#[derive(Debug, Clone, Default)]
pub struct UriResolver {
    templates: HashMap<String, LocationTemplate>,
}

impl UriResolver {
    /// Resolver over the Lodestone table.
    pub fn lodestone() -> Self {
        let templates = APPLICABLE_URIS
            .iter()
            .map(|(key, pattern)| (key.to_string(), LocationTemplate::new(*pattern)))
            .collect();
        Self { templates }
    }

    /// Add or replace a template.
    pub fn with_template(mut self, key: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.templates
            .insert(key.into(), LocationTemplate::new(pattern));
        self
    }

    pub fn template(&self, key: &str) -> Option<&LocationTemplate> {
        self.templates.get(key)
    }

    /// Build the page location for a catalog file.
    pub fn resolve(
        &self,
        category: &str,
        file: &str,
        region: &str,
        entity_id: &str,
        extra_ids: &[&str],
    ) -> ScrapeResult<String> {
        let key = format!("{}/{}.json", category, file);
        let template = self
            .template(&key)
            .ok_or_else(|| ScrapeError::NoTemplate { key: key.clone() })?;

        let mut values = Vec::with_capacity(2 + extra_ids.len());
        values.push(region);
        values.push(entity_id);
        values.extend_from_slice(extra_ids);

        template.render(&key, &values)
    }
}
