//! Extraction interpreter: walks a selector specification over a parsed page.
//!
//! Results are plain JSON values: `Null` for missing data, strings for
//! scalars, arrays for `multiple` leaves and objects for composites and
//! capture patterns. Extraction never touches the network or the catalog.

use regex::Regex;
use scraper::{ElementRef, Html};
use serde_json::{Map, Value};

use super::selectors::{LeafSelector, NonStaticDetail, SelectorSpec};

/// Extract the data described by `spec` from `document`.
pub fn extract(document: &Html, spec: &SelectorSpec) -> Value {
    match spec {
        SelectorSpec::NonStatic(detail) => extract_non_static(document, detail),
        SelectorSpec::Leaf(leaf) => extract_leaf(document, leaf),
        SelectorSpec::Composite(children) => {
            let mut result = Map::with_capacity(children.len());
            for (name, child) in children {
                result.insert(name.clone(), extract(document, child));
            }
            Value::Object(result)
        }
    }
}

fn extract_leaf(document: &Html, leaf: &LeafSelector) -> Value {
    let mut elements = document.select(&leaf.compiled);

    if leaf.multiple {
        Value::Array(elements.map(|el| extract_from_element(el, leaf)).collect())
    } else {
        elements
            .next()
            .map(|el| extract_from_element(el, leaf))
            .unwrap_or(Value::Null)
    }
}

/// Attribute or text of one element, passed through the leaf's pattern.
fn extract_from_element(element: ElementRef<'_>, leaf: &LeafSelector) -> Value {
    let raw = match &leaf.attribute {
        Some(name) => element.value().attr(name).map(str::to_string),
        None => Some(normalized_text(element)),
    };

    match (raw, &leaf.pattern) {
        (None, _) => Value::Null,
        (Some(value), None) => Value::String(value),
        (Some(value), Some(pattern)) => apply_pattern(pattern, &value),
    }
}

/// Named capture groups of the first match, or `Null` when nothing matches.
///
/// Groups that did not take part in the match map to `Null`.
pub fn apply_pattern(pattern: &Regex, value: &str) -> Value {
    let Some(captures) = pattern.captures(value) else {
        return Value::Null;
    };

    let groups = pattern
        .capture_names()
        .flatten()
        .map(|name| {
            let group = captures
                .name(name)
                .map(|m| Value::String(m.as_str().to_string()))
                .unwrap_or(Value::Null);
            (name.to_string(), group)
        })
        .collect();
    Value::Object(groups)
}

/// Text of an element with tags stripped: each text node trimmed, empty
/// nodes dropped, the rest concatenated.
pub fn normalized_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn extract_non_static(document: &Html, detail: &NonStaticDetail) -> Value {
    let needle = detail.header.to_lowercase();

    for heading in document.select(&detail.heading) {
        if !normalized_text(heading).to_lowercase().contains(&needle) {
            continue;
        }

        let block = heading
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| detail.block.matches(el));

        if let Some(block) = block {
            return block
                .children()
                .filter_map(ElementRef::wrap)
                .map(normalized_text)
                .nth(detail.index)
                .map(Value::String)
                .unwrap_or(Value::Null);
        }
    }

    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAGE: &str = r#"
        <html><body>
          <div class="frame__chara">
            <p class="frame__chara__name">Alys   Windrunner</p>
            <p class="frame__chara__world"><i class="icon"></i> Cerberus [Chaos]</p>
            <div class="frame__chara__face"><img src="https://img.example/face.jpg"></div>
          </div>
          <ul class="character__job">
            <li><span>90</span> <span>Paladin</span></li>
            <li><span>-</span> <span>Warrior</span></li>
            <li><span>80</span> <span>Dark Knight</span></li>
          </ul>
          <h3 class="heading-md">Example Section</h3>
          <div class="character__job__list">
            <div>A</div>
            <div> B </div>
            <div>C</div>
          </div>
        </body></html>
    "#;

    fn spec(value: Value) -> SelectorSpec {
        SelectorSpec::from_json(&value).unwrap()
    }

    #[test]
    fn test_single_leaf_text_and_attribute() {
        let document = Html::parse_document(PAGE);
        let name = spec(json!({ "selector": "p.frame__chara__name" }));
        assert_eq!(extract(&document, &name), json!("Alys   Windrunner"));

        let avatar = spec(json!({ "selector": "div.frame__chara__face > img", "attribute": "src" }));
        assert_eq!(extract(&document, &avatar), json!("https://img.example/face.jpg"));

        let missing_attr = spec(json!({ "selector": "div.frame__chara__face > img", "attribute": "alt" }));
        assert_eq!(extract(&document, &missing_attr), Value::Null);
    }

    #[test]
    fn test_text_is_trimmed_and_tag_stripped() {
        let document = Html::parse_document(PAGE);
        let job = spec(json!({ "selector": "ul.character__job > li" }));
        assert_eq!(extract(&document, &job), json!("90Paladin"));
    }

    #[test]
    fn test_zero_matches() {
        let document = Html::parse_document(PAGE);
        let single = spec(json!({ "selector": "p.nowhere" }));
        assert_eq!(extract(&document, &single), Value::Null);

        let multiple = spec(json!({ "selector": "p.nowhere", "multiple": true }));
        assert_eq!(extract(&document, &multiple), json!([]));
    }

    #[test]
    fn test_pattern_groups() {
        let document = Html::parse_document(PAGE);
        let server = spec(json!({
            "selector": "p.frame__chara__world",
            "regex": r"(?P<World>\w+)\s+\[(?P<DC>\w+)\]"
        }));
        assert_eq!(
            extract(&document, &server),
            json!({ "World": "Cerberus", "DC": "Chaos" })
        );

        let no_match = spec(json!({ "selector": "p.frame__chara__name", "regex": r"(?P<Level>\d+)" }));
        assert_eq!(extract(&document, &no_match), Value::Null);
    }

    #[test]
    fn test_pattern_skipped_for_missing_value() {
        let document = Html::parse_document(PAGE);
        let leaf = spec(json!({
            "selector": "div.frame__chara__face > img",
            "attribute": "data-missing",
            "regex": "(?P<anything>.*)"
        }));
        assert_eq!(extract(&document, &leaf), Value::Null);
    }

    #[test]
    fn test_optional_group_is_null() {
        let pattern = Regex::new(r"(?P<Level>\d+)?(?P<Name>[A-Za-z ]+)").unwrap();
        assert_eq!(
            apply_pattern(&pattern, "Warrior"),
            json!({ "Level": null, "Name": "Warrior" })
        );
    }

    #[test]
    fn test_multiple_applies_pattern_per_element() {
        let document = Html::parse_document(PAGE);
        let jobs = spec(json!({
            "selector": "ul.character__job > li",
            "multiple": true,
            "regex": r"^(?P<Level>\d+)(?P<Name>.+)$"
        }));
        assert_eq!(
            extract(&document, &jobs),
            json!([
                { "Level": "90", "Name": "Paladin" },
                null,
                { "Level": "80", "Name": "Dark Knight" }
            ])
        );
    }

    #[test]
    fn test_composite_preserves_spec_order() {
        let document = Html::parse_document(PAGE);
        let composite = spec(json!({
            "SERVER": { "selector": "p.frame__chara__world" },
            "NAME": { "selector": "p.frame__chara__name" },
            "AVATAR": { "selector": "div.frame__chara__face > img", "attribute": "src" },
            "NESTED": { "ZULU": { "selector": "li" }, "ALPHA": { "selector": "h3" } }
        }));

        let result = extract(&document, &composite);
        let keys: Vec<&String> = result.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["SERVER", "NAME", "AVATAR", "NESTED"]);

        let nested: Vec<&String> = result["NESTED"].as_object().unwrap().keys().collect();
        assert_eq!(nested, vec!["ZULU", "ALPHA"]);

        let serialized = serde_json::to_string(&result).unwrap();
        assert!(serialized.find("SERVER").unwrap() < serialized.find("NAME").unwrap());
    }

    #[test]
    fn test_extract_is_deterministic() {
        let document = Html::parse_document(PAGE);
        let composite = spec(json!({
            "NAME": { "selector": "p.frame__chara__name" },
            "JOBS": { "selector": "ul.character__job > li", "multiple": true },
            "DETAIL": { "_field_ops_header": "example", "_data_index": 0 }
        }));
        assert_eq!(extract(&document, &composite), extract(&document, &composite));
    }

    #[test]
    fn test_non_static_detail() {
        let document = Html::parse_document(PAGE);
        let second = spec(json!({ "_field_ops_header": "example", "_data_index": 1 }));
        assert_eq!(extract(&document, &second), json!("B"));

        let out_of_range = spec(json!({ "_field_ops_header": "example", "_data_index": 5 }));
        assert_eq!(extract(&document, &out_of_range), Value::Null);

        let absent = spec(json!({ "_field_ops_header": "Occult Crescent" }));
        assert_eq!(extract(&document, &absent), Value::Null);
    }

    #[test]
    fn test_non_static_first_heading_with_block_wins() {
        let page = r#"
            <div>
              <h3 class="heading-md">The Forbidden Land, Eureka</h3>
              <p>no data yet</p>
              <h3 class="heading-md">Eureka Orthos</h3>
              <div class="character__job__list"><div>60</div><div>1,200</div></div>
              <h3 class="heading-md">Bozjan Southern Front</h3>
              <div class="character__job__list"><div>25</div><div>5,000</div></div>
            </div>
        "#;
        let document = Html::parse_document(page);

        // The first "Eureka" heading has no following data block until the
        // second heading's, so the substring match lands on that block.
        let eureka = spec(json!({ "_field_ops_header": "eureka", "_data_index": 0 }));
        assert_eq!(extract(&document, &eureka), json!("60"));

        let bozja = spec(json!({ "_field_ops_header": "BOZJAN", "_data_index": 1 }));
        assert_eq!(extract(&document, &bozja), json!("5,000"));
    }
}
