//! The `whoami` verification flow.
//!
//! A Discord user asks for a token, pastes it into the self-introduction of
//! their Lodestone character, then asks for confirmation with the character
//! id. Confirmation reads the biography back, and on a match stores the link
//! and consumes the token.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::error::{VerificationError, VerificationResult};
use super::token::{cache_key, VerificationToken, TOKEN_TTL};
use crate::cache::VerificationCache;
use crate::lodestone::LodestoneScraper;
use crate::models::{CharacterProfile, IdentityLink};
use crate::repository::IdentityLinkRepository;

/// Selector for the free-text biography a token is placed in.
pub const BIO_SELECTOR: &str = "profile.character.BIO";

/// Selector for the basic character info stored with a link.
pub const PROFILE_SELECTOR: &str = "profile.character";

/// Where a Discord user stands in the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationState {
    NoToken,
    Pending { expires_at: DateTime<Utc> },
}

/// Runs the verification flow over a cache, a link store and a scraper.
#[derive(Clone)]
pub struct Verifier {
    cache: Arc<dyn VerificationCache>,
    links: IdentityLinkRepository,
    scraper: LodestoneScraper,
    token_ttl: Duration,
}

impl Verifier {
    pub fn new(
        cache: Arc<dyn VerificationCache>,
        links: IdentityLinkRepository,
        scraper: LodestoneScraper,
    ) -> Self {
        Self {
            cache,
            links,
            scraper,
            token_ttl: TOKEN_TTL,
        }
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Issue a new token for `owner`, replacing any pending one.
    pub async fn start(&self, owner: u64) -> VerificationResult<VerificationToken> {
        let token = VerificationToken::generate(owner, self.token_ttl);
        let encoded = serde_json::to_string(&token)
            .map_err(|e| VerificationError::Persistence(format!("token encoding: {}", e)))?;

        self.cache
            .set(&cache_key(owner), &encoded, self.token_ttl)
            .await
            .map_err(|e| {
                warn!("Failed to store verification token for {}: {}", owner, e);
                VerificationError::from(e)
            })?;

        info!("Issued verification token for {}", owner);
        Ok(token)
    }

    /// The decoded pending token together with its cached form.
    async fn pending(&self, owner: u64) -> VerificationResult<Option<(VerificationToken, String)>> {
        let Some(raw) = self.cache.get(&cache_key(owner)).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<VerificationToken>(&raw) {
            Ok(token) if token.owner == owner => Ok(Some((token, raw))),
            Ok(token) => {
                warn!(
                    "Token under {} belongs to {}, ignoring",
                    cache_key(owner),
                    token.owner
                );
                Ok(None)
            }
            Err(e) => {
                warn!("Undecodable token under {}: {}", cache_key(owner), e);
                Ok(None)
            }
        }
    }

    /// Current state of `owner`'s verification.
    pub async fn state(&self, owner: u64) -> VerificationResult<VerificationState> {
        Ok(match self.pending(owner).await? {
            Some((token, _)) => VerificationState::Pending {
                expires_at: token.expires_at,
            },
            None => VerificationState::NoToken,
        })
    }

    /// Confirm ownership of a Lodestone character.
    ///
    /// `supplied` is checked against the pending secret when given; `None`
    /// uses the pending secret as is. On success the link is stored and the
    /// token consumed; of several concurrent confirmations on one token at
    /// most one succeeds. On any other failure the token stays in place.
    pub async fn confirm(
        &self,
        owner: u64,
        supplied: Option<&str>,
        lodestone_id: &str,
    ) -> VerificationResult<IdentityLink> {
        let result = self.try_confirm(owner, supplied, lodestone_id).await;
        if let Err(e) = &result {
            warn!(
                "Verification of {} for character {} failed: {}: {}",
                owner,
                lodestone_id,
                e.category(),
                e
            );
        }
        result
    }

    async fn try_confirm(
        &self,
        owner: u64,
        supplied: Option<&str>,
        lodestone_id: &str,
    ) -> VerificationResult<IdentityLink> {
        let (token, raw) = self
            .pending(owner)
            .await?
            .ok_or(VerificationError::TokenMissingOrExpired)?;
        if let Some(supplied) = supplied {
            if !token.matches(supplied) {
                return Err(VerificationError::TokenMissingOrExpired);
            }
        }

        let character_id = parse_character_id(lodestone_id)?;
        let entity = character_id.to_string();

        let bio = self.scraper.scrape(BIO_SELECTOR, &entity, &[]).await?;
        let bio = bio.as_str().unwrap_or_default();
        debug!("Biography of {} is {} chars", character_id, bio.len());
        if !bio.contains(&token.secret) {
            return Err(VerificationError::TokenNotFound);
        }

        let scraped = self.scraper.scrape(PROFILE_SELECTOR, &entity, &[]).await?;
        let profile = CharacterProfile::from_scraped(&scraped)
            .map_err(|field| VerificationError::IncompleteProfile { field })?;

        let link = IdentityLink::new(character_id, owner, profile);

        // Only one confirmation can claim a given token.
        let key = cache_key(owner);
        if !self.cache.take_if(&key, &raw).await? {
            return Err(VerificationError::TokenMissingOrExpired);
        }

        if let Err(e) = self.links.upsert(&link).await {
            self.restore(&key, &raw, &token).await;
            return Err(e.into());
        }

        info!(
            "Linked {} to {} ({} @ {})",
            owner,
            character_id,
            link.profile.full_name(),
            link.profile.server_name
        );
        Ok(link)
    }

    /// Put a claimed token back for whatever time it had left.
    async fn restore(&self, key: &str, raw: &str, token: &VerificationToken) {
        let Some(remaining) = (token.expires_at - Utc::now())
            .to_std()
            .ok()
            .filter(|d| !d.is_zero())
        else {
            return;
        };

        // A token issued in the meantime wins.
        match self.cache.get(key).await {
            Ok(None) => {}
            Ok(Some(_)) => return,
            Err(e) => {
                warn!("Could not restore verification token under {}: {}", key, e);
                return;
            }
        }
        if let Err(e) = self.cache.set(key, raw, remaining).await {
            warn!("Could not restore verification token under {}: {}", key, e);
        }
    }

    /// The character most recently linked to `owner`.
    pub async fn view(&self, owner: u64) -> VerificationResult<Option<IdentityLink>> {
        Ok(self.links.latest_for_discord(owner).await?)
    }
}

/// Lodestone character ids are positive integers.
fn parse_character_id(raw: &str) -> VerificationResult<u64> {
    match raw.trim().parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(VerificationError::InvalidEntityId(raw.to_string())),
    }
}
