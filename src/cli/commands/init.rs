//! Initialize command.

use console::style;

use crate::config::Settings;
use crate::lodestone::SelectorStore;
use crate::repository::util::redact_url_password;

use super::helpers::open_db;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    let ctx = open_db(settings).await?;
    let tables = ctx.list_tables().await?;

    println!(
        "{} Initialized database {} ({} tables)",
        style("✓").green(),
        redact_url_password(&settings.database_url()),
        tables.len()
    );

    let store = SelectorStore::new(settings.selector_root.clone());
    match store.list_categories() {
        Ok(categories) => println!(
            "{} Selector catalog {} ({})",
            style("✓").green(),
            settings.selector_root.display(),
            categories.join(", ")
        ),
        Err(e) => println!("{} {}", style("!").yellow(), e),
    }

    Ok(())
}
