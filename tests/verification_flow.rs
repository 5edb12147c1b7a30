//! End-to-end verification flow against the bundled selector catalog.
//!
//! Pages come from a stub fetcher; tokens live in the in-memory cache and
//! links in a throwaway SQLite database.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::{tempdir, TempDir};

use lodebot::cache::InMemoryCache;
use lodebot::http_client::PageFetcher;
use lodebot::lodestone::FetchFailure;
use lodebot::repository::DieselDbContext;
use lodebot::verification::VerificationState;
use lodebot::{LodestoneScraper, SelectorStore, VerificationError, Verifier};

enum Page {
    Character { world: &'static str, bio: String },
    Down(u16),
}

struct Lodestone {
    page: Mutex<Page>,
    urls: Mutex<Vec<String>>,
}

impl Lodestone {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            page: Mutex::new(Page::Character {
                world: "Cerberus [Chaos]",
                bio: String::new(),
            }),
            urls: Mutex::new(Vec::new()),
        })
    }

    fn serve(&self, page: Page) {
        *self.page.lock().unwrap() = page;
    }

    fn bio(&self, bio: &str) {
        self.serve(Page::Character {
            world: "Cerberus [Chaos]",
            bio: bio.to_string(),
        });
    }

    fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for Lodestone {
    async fn fetch(&self, url: &str) -> Result<String, FetchFailure> {
        self.urls.lock().unwrap().push(url.to_string());
        match &*self.page.lock().unwrap() {
            Page::Character { world, bio } => Ok(format!(
                r#"<html><body>
                     <div class="frame__chara__box">
                       <p class="frame__chara__name">Alys Windrunner</p>
                       <p class="frame__chara__world">{}</p>
                     </div>
                     <div class="character__selfintroduction">{}</div>
                   </body></html>"#,
                world, bio
            )),
            Page::Down(status) => Err(FetchFailure::Status(*status)),
        }
    }
}

struct Setup {
    _dir: TempDir,
    lodestone: Arc<Lodestone>,
    cache: Arc<InMemoryCache>,
    verifier: Verifier,
}

async fn setup() -> Setup {
    let dir = tempdir().unwrap();
    let ctx = DieselDbContext::new(&dir.path().join("lodebot.db"));
    ctx.init_schema().await.unwrap();

    let lodestone = Lodestone::new();
    let scraper = LodestoneScraper::new("eu", Arc::new(SelectorStore::bundled()))
        .with_session(lodestone.clone());
    let cache = Arc::new(InMemoryCache::new());
    let verifier = Verifier::new(cache.clone(), ctx.identity_links(), scraper);

    Setup {
        _dir: dir,
        lodestone,
        cache,
        verifier,
    }
}

#[tokio::test]
async fn test_full_flow_fetches_character_page() {
    let s = setup().await;
    let token = s.verifier.start(4242).await.unwrap();
    s.lodestone
        .bio(&format!("Hi!<br>Verification: {}<br>See you", token.secret));

    let link = s.verifier.confirm(4242, None, "9876543").await.unwrap();
    assert_eq!(link.profile.full_name(), "Alys Windrunner");
    assert_eq!(link.profile.server_name, "Cerberus");

    let urls = s.lodestone.urls();
    assert!(!urls.is_empty());
    assert!(urls
        .iter()
        .all(|u| u == "https://eu.finalfantasyxiv.com/lodestone/character/9876543/"));
}

#[tokio::test]
async fn test_restart_replaces_previous_token() {
    let s = setup().await;
    let first = s.verifier.start(1).await.unwrap();
    let second = s.verifier.start(1).await.unwrap();
    assert_ne!(first.secret, second.secret);
    assert_eq!(s.cache.len().await, 1);

    // The old secret is no longer accepted, whether supplied or found on the page.
    s.lodestone.bio(&first.secret);
    assert!(matches!(
        s.verifier.confirm(1, Some(&first.secret), "100").await,
        Err(VerificationError::TokenMissingOrExpired)
    ));
    assert!(matches!(
        s.verifier.confirm(1, None, "100").await,
        Err(VerificationError::TokenNotFound)
    ));

    s.lodestone.bio(&second.secret);
    let link = s.verifier.confirm(1, Some(&second.secret), "100").await.unwrap();
    assert_eq!(link.lodestone_id, 100);
}

#[tokio::test]
async fn test_token_is_single_use() {
    let s = setup().await;
    let token = s.verifier.start(7).await.unwrap();
    s.lodestone.bio(&token.secret);

    s.verifier.confirm(7, None, "555").await.unwrap();
    assert_eq!(s.verifier.state(7).await.unwrap(), VerificationState::NoToken);

    let err = s.verifier.confirm(7, Some(&token.secret), "555").await.unwrap_err();
    assert_eq!(err.category(), "TokenMissingOrExpired");
}

#[tokio::test]
async fn test_concurrent_confirms_consume_token_once() {
    let s = setup().await;
    let token = s.verifier.start(5).await.unwrap();
    s.lodestone.bio(&token.secret);

    let (a, b) = tokio::join!(
        s.verifier.confirm(5, Some(&token.secret), "111"),
        s.verifier.confirm(5, Some(&token.secret), "222"),
    );
    let (winner, loser) = match (a, b) {
        (Ok(link), Err(e)) | (Err(e), Ok(link)) => (link, e),
        (a, b) => panic!("expected exactly one success, got {:?} and {:?}", a, b),
    };
    assert_eq!(loser.category(), "TokenMissingOrExpired");
    assert!(s.cache.is_empty().await);

    let linked = s.verifier.view(5).await.unwrap().unwrap();
    assert_eq!(linked.lodestone_id, winner.lodestone_id);
}

#[tokio::test]
async fn test_fetch_failure_keeps_token() {
    let s = setup().await;
    let token = s.verifier.start(8).await.unwrap();
    s.lodestone.serve(Page::Down(503));

    let err = s.verifier.confirm(8, None, "555").await.unwrap_err();
    assert_eq!(err.category(), "FetchFailed");
    assert_eq!(s.cache.len().await, 1);

    // Retry once the Lodestone is back.
    s.lodestone.bio(&token.secret);
    s.verifier.confirm(8, None, "555").await.unwrap();
    assert!(s.cache.is_empty().await);
}

#[tokio::test]
async fn test_incomplete_profile_is_not_linked() {
    let s = setup().await;
    let token = s.verifier.start(9).await.unwrap();
    s.lodestone.serve(Page::Character {
        world: "",
        bio: token.secret.clone(),
    });

    let err = s.verifier.confirm(9, None, "555").await.unwrap_err();
    assert_eq!(err.category(), "IncompleteProfile");
    assert!(s.verifier.view(9).await.unwrap().is_none());
    assert_eq!(s.cache.len().await, 1);
}

#[tokio::test]
async fn test_character_moves_to_latest_owner() {
    let s = setup().await;

    let token = s.verifier.start(1).await.unwrap();
    s.lodestone.bio(&token.secret);
    s.verifier.confirm(1, None, "777").await.unwrap();

    let token = s.verifier.start(2).await.unwrap();
    s.lodestone.bio(&token.secret);
    s.verifier.confirm(2, None, "777").await.unwrap();

    assert!(s.verifier.view(1).await.unwrap().is_none());
    let link = s.verifier.view(2).await.unwrap().unwrap();
    assert_eq!(link.lodestone_id, 777);
    assert_eq!(link.discord_id, 2);
}

#[tokio::test]
async fn test_invalid_id_does_not_fetch() {
    let s = setup().await;
    s.verifier.start(3).await.unwrap();

    let err = s.verifier.confirm(3, None, "lodestone").await.unwrap_err();
    assert_eq!(err.category(), "InvalidEntityId");
    assert!(s.lodestone.urls().is_empty());
}
