//! Selector catalog: loading and indexing extraction specifications.
//!
//! The catalog is a directory tree of JSON files laid out as
//! `<root>/<category>/<file>.json`. Each file describes, field by field, how
//! to pull data out of one kind of Lodestone page. Files are decoded once into
//! [`SelectorSpec`] trees and cached for the lifetime of the store.
//!
//! A node in a selector file takes one of three shapes:
//!
//! ```json
//! { "selector": "p.frame__chara__world", "regex": "(?P<World>\\w+)\\s+\\[(?P<DC>\\w+)\\]" }
//! { "_field_ops_header": "Bozjan Southern Front", "_data_index": 1 }
//! { "NAME": { "selector": "..." }, "ID": { "selector": "...", "attribute": "href" } }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use regex::Regex;
use scraper::Selector;
use serde_json::{Map, Value};
use tracing::debug;

use super::error::{ScrapeError, ScrapeResult};

/// Separator between segments of a selector address.
pub const ADDRESS_SEPARATOR: char = '.';

/// Heading query used by non-static detail nodes unless overridden.
pub const DEFAULT_HEADING_QUERY: &str = "h3.heading-md";

/// Data block query used by non-static detail nodes unless overridden.
pub const DEFAULT_BLOCK_QUERY: &str = "div.character__job__list";

/// Catalog file used when an address names only a category.
pub fn default_file(category: &str) -> &str {
    match category {
        "profile" => "character",
        "freecompany" => "freecompany",
        "pvpteam" => "pvpteam",
        "search" => "character",
        other => other,
    }
}

/// A leaf that selects elements by CSS query.
#[derive(Debug, Clone)]
pub struct LeafSelector {
    /// CSS query as written in the catalog.
    pub query: String,
    /// Attribute to read instead of element text.
    pub attribute: Option<String>,
    /// Collect every match instead of the first one.
    pub multiple: bool,
    /// Post-extraction pattern; named groups become the result.
    pub pattern: Option<Regex>,
    pub(crate) compiled: Selector,
}

/// A leaf addressed by section heading and position rather than a stable query.
///
/// Used for game data laid out as label/value blocks under a heading, where
/// the block order depends on what the character has unlocked.
#[derive(Debug, Clone)]
pub struct NonStaticDetail {
    /// Label matched case-insensitively against heading text.
    pub header: String,
    /// Position within the data block following the heading.
    pub index: usize,
    pub(crate) heading: Selector,
    pub(crate) block: Selector,
}

/// A decoded selector specification node.
#[derive(Debug, Clone)]
pub enum SelectorSpec {
    Leaf(LeafSelector),
    NonStatic(NonStaticDetail),
    /// Named children in catalog order.
    Composite(Vec<(String, SelectorSpec)>),
}

impl SelectorSpec {
    /// Decode a JSON node (and its children) into a specification tree.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        decode_node(value, "")
    }

    /// Look up a direct child of a composite node.
    pub fn child(&self, key: &str) -> Option<&SelectorSpec> {
        match self {
            SelectorSpec::Composite(children) => children
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, spec)| spec),
            _ => None,
        }
    }

    /// Field names of a composite node, in catalog order.
    pub fn field_names(&self) -> Vec<&str> {
        match self {
            SelectorSpec::Composite(children) => {
                children.iter().map(|(name, _)| name.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// True for both leaf shapes.
    pub fn is_leaf(&self) -> bool {
        !matches!(self, SelectorSpec::Composite(_))
    }
}

fn child_location(at: &str, key: &str) -> String {
    if at.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", at, key)
    }
}

fn node_label(at: &str) -> &str {
    if at.is_empty() {
        "<root>"
    } else {
        at
    }
}

fn decode_node(value: &Value, at: &str) -> Result<SelectorSpec, String> {
    let obj = value
        .as_object()
        .ok_or_else(|| format!("{}: expected an object", node_label(at)))?;

    match (obj.contains_key("selector"), obj.contains_key("_field_ops_header")) {
        (true, true) => Err(format!(
            "{}: node has both 'selector' and '_field_ops_header'",
            node_label(at)
        )),
        (true, false) => decode_leaf(obj, at).map(SelectorSpec::Leaf),
        (false, true) => decode_non_static(obj, at).map(SelectorSpec::NonStatic),
        (false, false) => {
            let mut children = Vec::with_capacity(obj.len());
            for (key, child) in obj {
                children.push((key.clone(), decode_node(child, &child_location(at, key))?));
            }
            Ok(SelectorSpec::Composite(children))
        }
    }
}

fn string_field(obj: &Map<String, Value>, key: &str, at: &str) -> Result<Option<String>, String> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(format!("{}: '{}' must be a string", node_label(at), key)),
    }
}

fn parse_query(query: &str, at: &str) -> Result<Selector, String> {
    Selector::parse(query)
        .map_err(|e| format!("{}: invalid selector '{}': {}", node_label(at), query, e))
}

fn decode_leaf(obj: &Map<String, Value>, at: &str) -> Result<LeafSelector, String> {
    let query = string_field(obj, "selector", at)?
        .ok_or_else(|| format!("{}: 'selector' must not be null", node_label(at)))?;
    let compiled = parse_query(&query, at)?;

    let attribute = string_field(obj, "attribute", at)?;

    let multiple = match obj.get("multiple") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(format!("{}: 'multiple' must be a boolean", node_label(at))),
    };

    let pattern = string_field(obj, "regex", at)?
        .map(|p| {
            Regex::new(&p).map_err(|e| format!("{}: invalid regex '{}': {}", node_label(at), p, e))
        })
        .transpose()?;

    Ok(LeafSelector {
        query,
        attribute,
        multiple,
        pattern,
        compiled,
    })
}

fn decode_non_static(obj: &Map<String, Value>, at: &str) -> Result<NonStaticDetail, String> {
    let header = string_field(obj, "_field_ops_header", at)?
        .ok_or_else(|| format!("{}: '_field_ops_header' must not be null", node_label(at)))?;

    let index = match obj.get("_data_index") {
        None | Some(Value::Null) => 0,
        Some(v) => v
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| format!("{}: '_data_index' must be a non-negative integer", node_label(at)))?,
    };

    let heading_query = string_field(obj, "_heading_selector", at)?;
    let block_query = string_field(obj, "_block_selector", at)?;

    Ok(NonStaticDetail {
        header,
        index,
        heading: parse_query(heading_query.as_deref().unwrap_or(DEFAULT_HEADING_QUERY), at)?,
        block: parse_query(block_query.as_deref().unwrap_or(DEFAULT_BLOCK_QUERY), at)?,
    })
}

/// A parsed selector address: `category[.file[.key...]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogAddress {
    pub category: String,
    pub file: String,
    pub path: Vec<String>,
}

impl CatalogAddress {
    /// Parse a dotted selector address.
    ///
    /// - `profile` → the category's default file, empty path
    /// - `profile.attributes` → that file, empty path
    /// - `profile.character.NAME` → that file, path `["NAME"]`
    pub fn parse(selector: &str) -> ScrapeResult<Self> {
        let parts: Vec<&str> = selector.split(ADDRESS_SEPARATOR).collect();

        if let Some(empty) = parts.iter().position(|p| p.trim().is_empty()) {
            return Err(ScrapeError::SelectorNotFound {
                key: format!("<empty segment {}>", empty),
                address: selector.to_string(),
            });
        }

        let (category, file, path) = match parts.as_slice() {
            [category] => (
                category.to_string(),
                default_file(category).to_string(),
                Vec::new(),
            ),
            [category, file, keys @ ..] => (
                category.to_string(),
                file.to_string(),
                keys.iter().map(|k| k.to_string()).collect(),
            ),
            [] => {
                return Err(ScrapeError::SelectorNotFound {
                    key: String::new(),
                    address: selector.to_string(),
                })
            }
        };

        Ok(Self {
            category,
            file,
            path,
        })
    }

    /// Key of the location template for this address.
    pub fn uri_key(&self) -> String {
        format!("{}/{}.json", self.category, self.file)
    }
}

impl fmt::Display for CatalogAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.category, self.file)?;
        for key in &self.path {
            write!(f, ".{}", key)?;
        }
        Ok(())
    }
}

/// Read-only access to a selector catalog on disk.
pub struct SelectorStore {
    root: PathBuf,
    loaded: RwLock<HashMap<(String, String), Arc<SelectorSpec>>>,
}

impl SelectorStore {
    /// Create a store rooted at a catalog directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            loaded: RwLock::new(HashMap::new()),
        }
    }

    /// Catalog shipped with the crate.
    pub fn bundled() -> Self {
        Self::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("selectors"))
    }

    /// Parse a selector address.
    pub fn resolve_address(&self, selector: &str) -> ScrapeResult<CatalogAddress> {
        CatalogAddress::parse(selector)
    }

    fn file_path(&self, category: &str, file: &str) -> ScrapeResult<PathBuf> {
        let path = self.root.join(category).join(format!("{}.json", file));
        let traverses = |s: &str| s.contains(['/', '\\']) || s == "..";
        if traverses(category) || traverses(file) {
            return Err(ScrapeError::NotFound { path });
        }
        Ok(path)
    }

    /// Load the selector tree of a catalog file.
    pub fn load(&self, category: &str, file: &str) -> ScrapeResult<Arc<SelectorSpec>> {
        let key = (category.to_string(), file.to_string());
        if let Some(spec) = self
            .loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(spec));
        }

        let path = self.file_path(category, file)?;
        if !path.is_file() {
            return Err(ScrapeError::NotFound { path });
        }

        let content = fs::read_to_string(&path).map_err(|e| ScrapeError::MalformedCatalog {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let json: Value =
            serde_json::from_str(&content).map_err(|e| ScrapeError::MalformedCatalog {
                path: path.clone(),
                reason: format!("not valid JSON: {}", e),
            })?;
        let spec = SelectorSpec::from_json(&json)
            .map_err(|reason| ScrapeError::MalformedCatalog {
                path: path.clone(),
                reason,
            })?;

        debug!("Loaded selector file {}", path.display());

        let spec = Arc::new(spec);
        let mut loaded = self.loaded.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(loaded.entry(key).or_insert(spec)))
    }

    /// Category folders in the catalog.
    pub fn list_categories(&self) -> ScrapeResult<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|_| ScrapeError::NotFound {
            path: self.root.clone(),
        })?;

        let mut categories: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .collect();
        categories.sort();
        Ok(categories)
    }

    /// Selector files in one category.
    pub fn list_files(&self, category: &str) -> ScrapeResult<Vec<String>> {
        let folder = self.root.join(category);
        let entries = fs::read_dir(&folder).map_err(|_| ScrapeError::NotFound {
            path: folder.clone(),
        })?;

        let mut files: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Top-level keys of one selector file, in catalog order.
    pub fn list_keys(&self, category: &str, file: &str) -> ScrapeResult<Vec<String>> {
        let spec = self.load(category, file)?;
        Ok(spec.field_names().into_iter().map(String::from).collect())
    }

    /// Every `category.file.key` address in the catalog.
    pub fn list_available(&self) -> ScrapeResult<Vec<String>> {
        let mut addresses = Vec::new();
        for category in self.list_categories()? {
            for file in self.list_files(&category)? {
                for key in self.list_keys(&category, &file)? {
                    addresses.push(format!("{}.{}.{}", category, file, key));
                }
            }
        }
        Ok(addresses)
    }
}
