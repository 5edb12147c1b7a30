//! User agent handling for Lodestone requests.

/// Identifying client header sent with every page fetch.
pub const USER_AGENT: &str = "LodestoneScraper/1.0";

/// Resolve user agent from config value.
/// - None or blank => default scraper user agent
/// - other => custom user agent string
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config.map(str::trim) {
        None | Some("") => USER_AGENT.to_string(),
        Some(custom) => custom.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_user_agent_default() {
        assert_eq!(resolve_user_agent(None), "LodestoneScraper/1.0");
        assert_eq!(resolve_user_agent(Some("  ")), "LodestoneScraper/1.0");
    }

    #[test]
    fn test_resolve_user_agent_custom() {
        assert_eq!(resolve_user_agent(Some("Moogle/2.0")), "Moogle/2.0");
    }
}
