//! `count` command.

use crate::cli::icons;
use crate::config::Settings;
use crate::rate_limit::RateLimiter;
use crate::search::SearchClient;

/// Print the number of notices matching `query`.
pub async fn cmd_count(settings: &Settings, query: &str) -> anyhow::Result<()> {
    let client = SearchClient::from_settings(settings, RateLimiter::new(settings.min_interval()))
        .map_err(anyhow::Error::msg)?;

    println!("{} Query: {}", icons::info(), query);
    match client.count(query).await? {
        Some(total) => println!("{} {} matching notices", icons::success(), total),
        None => println!("{} The API did not report a total", icons::warn()),
    }
    Ok(())
}
