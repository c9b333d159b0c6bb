pub mod feeds;
pub mod provider;
pub mod types;

use anyhow::Context;
use std::time::Duration;

pub const USER_AGENT: &str = "btc-bias/0.1";

/// Shared HTTP client: every request carries the project user agent and a bounded timeout.
pub fn http_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build http client")
}
