//! Lodestone scraping engine.
//!
//! A declarative pipeline: a selector address names a catalog file (and
//! optionally a field inside it), the catalog file describes how to pull each
//! field out of the page, and the URI table says which page to fetch.

pub mod error;
pub mod extract;
pub mod scraper;
pub mod selectors;
pub mod uris;

pub use error::{FetchFailure, ScrapeError, ScrapeResult};
pub use extract::extract;
pub use scraper::{LodestoneScraper, DEFAULT_REGION};
pub use selectors::{CatalogAddress, SelectorSpec, SelectorStore};
pub use uris::{LocationTemplate, UriResolver};
