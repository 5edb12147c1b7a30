//! `whoami` commands: link a Discord user to a Lodestone character.

use chrono::Utc;
use console::style;

use crate::config::Settings;
use crate::verification::{VerificationState, TOKEN_TTL};

use super::helpers::{build_verifier, exit_with_failure, open_db, print_link};

/// Issue a token and explain where to put it.
pub async fn cmd_create(settings: &Settings, discord_id: u64) -> anyhow::Result<()> {
    let verifier = build_verifier(settings).await?;
    let token = match verifier.start(discord_id).await {
        Ok(token) => token,
        Err(e) => exit_with_failure(e.category(), &e),
    };

    println!("{} Verification token for {}:", style("✓").green(), discord_id);
    println!("\n    {}\n", style(&token.secret).cyan().bold());
    println!(
        "Paste it anywhere in your character's self-introduction on the Lodestone, then run"
    );
    println!(
        "    lodebot whoami verify {} <lodestone character id>",
        discord_id
    );
    println!(
        "within {} minutes. Starting again replaces this token.",
        TOKEN_TTL.as_secs() / 60
    );

    Ok(())
}

/// Confirm a character for a Discord user.
pub async fn cmd_verify(
    settings: &Settings,
    discord_id: u64,
    lodestone_id: &str,
    token: Option<&str>,
) -> anyhow::Result<()> {
    let verifier = build_verifier(settings).await?;
    match verifier.confirm(discord_id, token, lodestone_id).await {
        Ok(link) => {
            println!(
                "{} Linked {} to {}",
                style("✓").green(),
                discord_id,
                style(link.profile.full_name()).bold()
            );
            print_link(&link);
            Ok(())
        }
        Err(e) => exit_with_failure(e.category(), &e),
    }
}

/// Show linked characters.
pub async fn cmd_view(settings: &Settings, discord_id: u64, all: bool) -> anyhow::Result<()> {
    let links = open_db(settings).await?.identity_links();

    let found = if all {
        links.for_discord(discord_id).await?
    } else {
        links.latest_for_discord(discord_id).await?.into_iter().collect()
    };

    if found.is_empty() {
        println!(
            "{} No character linked to {}. Run 'lodebot whoami create {}' first.",
            style("!").yellow(),
            discord_id,
            discord_id
        );
        return Ok(());
    }

    for link in &found {
        println!();
        print_link(link);
    }
    Ok(())
}

/// Show whether a token is pending.
pub async fn cmd_status(settings: &Settings, discord_id: u64) -> anyhow::Result<()> {
    let verifier = build_verifier(settings).await?;
    match verifier.state(discord_id).await {
        Ok(VerificationState::NoToken) => {
            println!("{} No pending verification for {}", style("-").dim(), discord_id);
        }
        Ok(VerificationState::Pending { expires_at }) => {
            let left = (expires_at - Utc::now()).num_seconds().max(0);
            println!(
                "{} Verification pending for {} ({}m {:02}s left)",
                style("…").cyan(),
                discord_id,
                left / 60,
                left % 60
            );
        }
        Err(e) => exit_with_failure(e.category(), &e),
    }
    Ok(())
}
