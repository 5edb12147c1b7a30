//! Selector-driven Lodestone scraper.

use std::sync::Arc;
use std::time::Duration;

use scraper::Html;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::error::{FetchFailure, ScrapeError, ScrapeResult};
use super::extract::extract;
use super::selectors::{CatalogAddress, SelectorSpec, SelectorStore};
use super::uris::UriResolver;
use crate::config::Settings;
use crate::http_client::{HttpClient, PageFetcher, DEFAULT_TIMEOUT};

/// Default Lodestone region subdomain.
pub const DEFAULT_REGION: &str = "eu";

/// Scrapes Lodestone pages by selector address.
///
/// One fetch per call, no retries and no caching of pages. When no session is
/// supplied a fresh client is built for each call and dropped afterwards.
#[derive(Clone)]
pub struct LodestoneScraper {
    region: String,
    timeout: Duration,
    user_agent: Option<String>,
    session: Option<Arc<dyn PageFetcher>>,
    store: Arc<SelectorStore>,
    uris: Arc<UriResolver>,
}

impl LodestoneScraper {
    /// Create a scraper for a region over a selector catalog.
    pub fn new(region: impl Into<String>, store: Arc<SelectorStore>) -> Self {
        Self {
            region: region.into(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            session: None,
            store,
            uris: Arc::new(UriResolver::lodestone()),
        }
    }

    /// Create a scraper from application settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.region.clone(),
            Arc::new(SelectorStore::new(settings.selector_root.clone())),
        )
        .with_timeout(Duration::from_secs(settings.request_timeout))
        .with_user_agent(settings.user_agent.clone())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Reuse a caller-owned session for every fetch.
    pub fn with_session(mut self, session: Arc<dyn PageFetcher>) -> Self {
        self.session = Some(session);
        self
    }

    /// Scrape `selector` (`category[.file[.key...]]`) for an entity.
    ///
    /// - empty key path: every top-level field of the file, as an object
    /// - path ending on a leaf: that leaf's value
    /// - path ending on a composite: `{ last_key: extracted }`
    ///
    /// The key path is checked against the catalog before the location
    /// template is resolved, so an address with both an unknown key and no
    /// template fails with `SelectorNotFound` rather than `NoTemplate`. No
    /// request is made in either case.
    pub async fn scrape(
        &self,
        selector: &str,
        entity_id: &str,
        extra_ids: &[&str],
    ) -> ScrapeResult<Value> {
        let address = self.store.resolve_address(selector)?;
        let spec = self.store.load(&address.category, &address.file)?;
        let target = navigate(&spec, &address)?;

        let url = self.uris.resolve(
            &address.category,
            &address.file,
            &self.region,
            entity_id,
            extra_ids,
        )?;

        debug!("Scraping {} for {} from {}", address, entity_id, url);

        let body = self.fetch(&url).await.map_err(|failure| {
            warn!(
                "Fetch failed for {} (entity {}): {}",
                address, entity_id, failure
            );
            ScrapeError::FetchFailed {
                url: url.clone(),
                failure,
            }
        })?;

        let document = Html::parse_document(&body);

        Ok(match address.path.last() {
            Some(last) if !target.is_leaf() => {
                let mut wrapped = Map::with_capacity(1);
                wrapped.insert(last.clone(), extract(&document, target));
                Value::Object(wrapped)
            }
            _ => extract(&document, target),
        })
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchFailure> {
        match &self.session {
            Some(session) => session.fetch(url).await,
            None => {
                let client = HttpClient::with_user_agent(self.timeout, self.user_agent.as_deref())?;
                client.fetch(url).await
            }
        }
    }
}

/// Walk the key path of an address down the selector tree.
fn navigate<'a>(spec: &'a SelectorSpec, address: &CatalogAddress) -> ScrapeResult<&'a SelectorSpec> {
    let mut target = spec;
    for key in &address.path {
        target = target
            .child(key)
            .ok_or_else(|| ScrapeError::SelectorNotFound {
                key: key.clone(),
                address: address.to_string(),
            })?;
    }
    Ok(target)
}
