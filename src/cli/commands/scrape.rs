//! Scrape command.

use crate::config::Settings;
use crate::lodestone::LodestoneScraper;

use super::helpers::exit_with_failure;

/// Scrape one selector address and print the result as JSON.
pub async fn cmd_scrape(
    settings: &Settings,
    selector: &str,
    entity_id: &str,
    extra_ids: &[String],
    compact: bool,
) -> anyhow::Result<()> {
    let scraper = LodestoneScraper::from_settings(settings);
    let extra: Vec<&str> = extra_ids.iter().map(String::as_str).collect();

    let value = match scraper.scrape(selector, entity_id, &extra).await {
        Ok(value) => value,
        Err(e) => exit_with_failure(e.category(), &e),
    };

    let rendered = if compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    println!("{}", rendered);

    Ok(())
}
