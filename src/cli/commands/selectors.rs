//! Selector catalog listing.

use console::style;

use crate::config::Settings;
use crate::lodestone::selectors::default_file;
use crate::lodestone::SelectorStore;

/// List categories, files of a category, or keys of a file.
pub fn cmd_selectors(
    settings: &Settings,
    category: Option<&str>,
    file: Option<&str>,
    all: bool,
) -> anyhow::Result<()> {
    let store = SelectorStore::new(settings.selector_root.clone());

    if all {
        for address in store.list_available()? {
            println!("{}", address);
        }
        return Ok(());
    }

    match (category, file) {
        (None, _) => {
            println!("\n{}", style("Categories").bold());
            for category in store.list_categories()? {
                println!(
                    "  {:<14} {}",
                    category,
                    style(format!("(default: {})", default_file(&category))).dim()
                );
            }
        }
        (Some(category), None) => {
            println!("\n{}", style(format!("Files in {}", category)).bold());
            for file in store.list_files(category)? {
                println!("  {}", file);
            }
        }
        (Some(category), Some(file)) => {
            println!("\n{}", style(format!("Keys in {}.{}", category, file)).bold());
            for key in store.list_keys(category, file)? {
                println!("  {}", key);
            }
        }
    }

    Ok(())
}
