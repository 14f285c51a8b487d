pub mod config;
pub mod jql;
pub mod merge;
pub mod release;

use anyhow::Context;
use relsync_core::config::Config;
use relsync_core::jira::JiraClient;
use relsync_core::store::{DryRunStore, TicketStore};
use relsync_core::RelsyncError;

pub const TOKEN_ENV: &str = "JIRA_API_TOKEN";

/// Connect to the configured ticket store with the API token from the
/// environment. A missing token is fatal before any request is made.
pub fn open_store(config: &Config, dry_run: bool) -> anyhow::Result<Box<dyn TicketStore>> {
    let token = std::env::var(TOKEN_ENV)
        .ok()
        .filter(|t| !t.trim().is_empty())
        .ok_or(RelsyncError::MissingCredential(TOKEN_ENV))?;
    let client = JiraClient::new(&config.store, token).context("failed to create ticket store client")?;
    tracing::info!(base_url = %config.store.base_url, user = %config.store.user, dry_run, "ticket store ready");
    if dry_run {
        Ok(Box::new(DryRunStore::new(client)))
    } else {
        Ok(Box::new(client))
    }
}
