//! Shared helper functions for CLI commands.

use std::fmt;

use console::style;

use crate::cache;
use crate::config::Settings;
use crate::lodestone::LodestoneScraper;
use crate::models::IdentityLink;
use crate::repository::DieselDbContext;
use crate::verification::Verifier;

/// Open the database, creating tables on first use.
pub async fn open_db(settings: &Settings) -> anyhow::Result<DieselDbContext> {
    settings.ensure_directories()?;
    let ctx = DieselDbContext::from_url(&settings.database_url())?;
    ctx.init_schema().await?;
    Ok(ctx)
}

/// Build a verifier from settings.
///
/// Each command runs in its own process, so pending tokens must live in Redis.
pub async fn build_verifier(settings: &Settings) -> anyhow::Result<Verifier> {
    let Some(redis_url) = settings.redis_url.as_deref() else {
        anyhow::bail!(
            "verification needs a shared token cache; set REDIS_URL or `redis` in the config file"
        );
    };
    let cache = cache::connect(Some(redis_url)).await?;
    let ctx = open_db(settings).await?;
    let scraper = LodestoneScraper::from_settings(settings);
    Ok(Verifier::new(cache, ctx.identity_links(), scraper))
}

/// An error the way users see it: `✗ Category: message`.
pub fn failure_line(category: &str, message: impl fmt::Display) -> String {
    format!("{} {}: {}", style("✗").red(), style(category).bold(), message)
}

/// Report a categorized failure and exit non-zero.
pub fn exit_with_failure(category: &str, message: impl fmt::Display) -> ! {
    eprintln!("{}", failure_line(category, message));
    std::process::exit(1);
}

/// Print one identity link.
pub fn print_link(link: &IdentityLink) {
    println!(
        "  {:<12} {}",
        style("Character").dim(),
        style(link.profile.full_name()).bold()
    );
    println!("  {:<12} {}", style("Lodestone").dim(), link.lodestone_id);
    println!(
        "  {:<12} {} [{}]",
        style("Server").dim(),
        link.profile.server_name,
        link.profile.data_center_name
    );
    println!(
        "  {:<12} {}",
        style("Linked").dim(),
        link.linked_at.format("%Y-%m-%d %H:%M UTC")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_line_shows_category_once() {
        let line = failure_line("TokenNotFound", "token not in profile");
        let plain = console::strip_ansi_codes(&line);
        assert_eq!(plain, "✗ TokenNotFound: token not in profile");
    }

    #[tokio::test]
    async fn test_verifier_requires_redis() {
        let settings = Settings {
            redis_url: None,
            ..Settings::default()
        };
        let err = build_verifier(&settings).await.err().unwrap();
        assert!(err.to_string().contains("REDIS_URL"));
    }
}
