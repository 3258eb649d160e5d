//! Resolve the CLI process itself as a visitor

use colored::Colorize;

use crate::api::services::AppState;
use crate::config::get_config;
use crate::errors::Result;
use crate::interfaces::cli::CliError;
use crate::runtime::lifetime::startup::open_store;
use crate::visitor::{CookiePort, NoCampaign, OutgoingCookie, RequestContext};

/// 命令行没有 cookie：读不到，写入直接丢弃
struct NoCookies;

impl CookiePort for NoCookies {
    fn read(&self, _name: &str) -> Option<String> {
        None
    }

    fn write(&self, _cookie: OutgoingCookie) -> Result<()> {
        Ok(())
    }
}

pub async fn whoami() -> std::result::Result<(), CliError> {
    let config = get_config();
    let store = open_store(&config)
        .await
        .map_err(|e| CliError::StorageError(format!("{:#}", e)))?;
    let state = AppState::from_config(&config, store.clone())?;

    let session = state
        .resolver
        .session(RequestContext::cli(), &NoCookies, &NoCampaign);
    session.record_visit().await?;

    let visitor_id = session.resolve_visitor_id().await?;
    let token = session.token().await?;
    let first_visit = session.first_visit_at().await?;
    let record = session.record().await?;

    println!("{}", "Visitor".bold().green());
    println!("  {}:          {}", "Bot".cyan(), session.is_bot());
    println!(
        "  {}:   {}",
        "Visitor id".cyan(),
        visitor_id.map_or_else(|| "-".dimmed().to_string(), |id| id.to_string())
    );
    println!(
        "  {}:        {}",
        "Token".cyan(),
        token.unwrap_or_else(|| "-".dimmed().to_string())
    );
    println!("  {}:  {}", "First visit".cyan(), first_visit.to_rfc3339());
    println!("  {}:       {}", "Record".cyan(), record.is_some());

    if let Err(e) = store.close().await {
        tracing::warn!("Failed to close storage: {}", e);
    }
    Ok(())
}
