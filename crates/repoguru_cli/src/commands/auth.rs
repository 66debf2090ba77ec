use std::sync::Arc;
use std::time::Duration;

use console::Term;
use repoguru::http::reqwest_transport::ReqwestTransport;
use repoguru::oauth::{
    CallbackParams, MemoryStateStore, OAuthError, ProxyTokenExchanger, complete_authorization,
    start_authorization,
};

use crate::commands::shared::CommandResult;
use crate::config::Config;

fn report_saved(config_path: &std::path::Path) {
    if Term::stdout().is_term() {
        println!("GitHub token saved to: {}", config_path.display());
        println!();
        println!("You can now use repoguru commands like:");
        println!("  repoguru analyze <owner>/<repo>");
        println!("  repoguru org <org-name>");
    } else {
        tracing::info!(config_path = %config_path.display(), "GitHub token saved");
    }
}

pub(crate) fn handle_set_token(token: &str) -> CommandResult {
    let token = token.trim();
    if token.is_empty() {
        return Err("Token must not be empty".into());
    }
    let config_path = Config::save_github_token(token)?;
    report_saved(&config_path);
    Ok(())
}

/// Browser authorization through the configured token proxy.
///
/// The user opens the printed URL, approves access and pastes back the URL
/// GitHub redirected them to.
pub(crate) async fn handle_login(config: &Config) -> CommandResult {
    let proxy_url = config
        .oauth
        .proxy_url
        .as_deref()
        .ok_or(OAuthError::NotConfigured)?;

    let store = MemoryStateStore::default();
    let authorize_url = start_authorization(&config.oauth_config(), &store)?;

    let term = Term::stderr();
    term.write_line("Open this URL in your browser and approve access:")?;
    term.write_line("")?;
    term.write_line(&authorize_url)?;
    term.write_line("")?;
    term.write_line("Then paste the URL you were redirected to:")?;
    let callback_url = term.read_line()?;

    let params = CallbackParams::from_url(callback_url.trim())?;
    let transport = ReqwestTransport::with_timeout(Duration::from_secs(
        config.analysis.request_timeout_secs,
    ))?;
    let exchanger = ProxyTokenExchanger::new(proxy_url, Arc::new(transport));

    let Some(token) = complete_authorization(&params, &store, &exchanger).await? else {
        return Err("The pasted URL carries no authorization code".into());
    };
    let config_path = Config::save_github_token(&token.access_token)?;
    report_saved(&config_path);
    Ok(())
}
