//! GitHub web authorization through a token proxy.
//!
//! The browser is sent to GitHub's authorize page with a client id and a
//! fresh anti-CSRF state. GitHub redirects back with `code` and `state`; the
//! code is exchanged for a token by a proxy that holds the client secret.
//!
//! - [`start_authorization`] issues the state and builds the redirect URL
//! - [`complete_authorization`] validates the callback and exchanges the code
//!
//! The stored state is cleared whenever a callback is processed, whether the
//! flow then succeeds or fails.

mod error;
mod exchange;
mod state;

pub use error::OAuthError;
pub use exchange::{ProxyTokenExchanger, TOKEN_EXCHANGE_PATH, TokenExchanger, TokenResponse};
pub use state::{MemoryStateStore, StateStore};

use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

/// GitHub's authorization endpoint.
pub const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

/// Scopes requested by default.
pub const DEFAULT_SCOPE: &str = "repo read:org";

/// Client-side OAuth settings.
#[derive(Debug, Clone, Default)]
pub struct OAuthConfig {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub scope: Option<String>,
}

/// Query parameters received on the callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parse the query string of a callback URL.
    pub fn from_url(callback_url: &str) -> Result<Self, OAuthError> {
        let url = Url::parse(callback_url).map_err(|e| OAuthError::Parse(e.to_string()))?;
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "code" => params.code = value,
                "state" => params.state = value,
                "error" => params.error = value,
                "error_description" => params.error_description = value,
                _ => {}
            }
        }
        Ok(params)
    }
}

/// Issue a new state and return the URL to send the user to.
pub fn start_authorization(
    config: &OAuthConfig,
    store: &dyn StateStore,
) -> Result<String, OAuthError> {
    let client_id = config
        .client_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or(OAuthError::NotConfigured)?;

    let state = uuid::Uuid::new_v4().to_string();
    store.save(&state);

    let mut url = Url::parse(GITHUB_AUTHORIZE_URL).map_err(|e| OAuthError::Parse(e.to_string()))?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("client_id", client_id);
        query.append_pair("state", &state);
        query.append_pair("scope", config.scope.as_deref().unwrap_or(DEFAULT_SCOPE));
        if let Some(redirect_uri) = &config.redirect_uri {
            query.append_pair("redirect_uri", redirect_uri);
        }
    }
    debug!("Issued OAuth state");
    Ok(url.into())
}

/// Validate a callback and exchange its code for a token.
///
/// A URL carrying neither `code` nor `error` is not a callback: it yields
/// `Ok(None)` and leaves the stored state alone. Otherwise the stored state is
/// taken out of `store` before anything else, so a replayed or failed
/// callback can never be completed later.
pub async fn complete_authorization(
    params: &CallbackParams,
    store: &dyn StateStore,
    exchanger: &dyn TokenExchanger,
) -> Result<Option<TokenResponse>, OAuthError> {
    let code = params.code.as_deref().filter(|c| !c.is_empty());
    if code.is_none() && params.error.is_none() {
        debug!("No authorization code in callback");
        return Ok(None);
    }
    let expected = store.take();

    if let Some(error) = &params.error {
        let message = params
            .error_description
            .clone()
            .unwrap_or_else(|| error.clone());
        warn!(error = %error, "Authorization was not granted");
        return Err(OAuthError::provider(message));
    }

    let expected = expected.ok_or(OAuthError::MissingState)?;
    let returned = params.state.as_deref().ok_or(OAuthError::MissingState)?;
    if returned != expected {
        warn!("OAuth state mismatch");
        return Err(OAuthError::CsrfStateMismatch);
    }

    let code = code.ok_or_else(|| OAuthError::InvalidRequest("missing code".to_string()))?;
    exchanger.exchange(code).await.map(Some)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Exchanger that records codes and returns a fixed token.
    #[derive(Default)]
    struct FakeExchanger {
        codes: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TokenExchanger for FakeExchanger {
        async fn exchange(&self, code: &str) -> Result<TokenResponse, OAuthError> {
            self.codes.lock().unwrap().push(code.to_string());
            Ok(TokenResponse {
                access_token: "gho_token".into(),
                token_type: "bearer".into(),
            })
        }
    }

    fn config() -> OAuthConfig {
        OAuthConfig {
            client_id: Some("Iv1.abc".into()),
            redirect_uri: Some("https://app.example/callback".into()),
            scope: None,
        }
    }

    fn state_from(url: &str) -> String {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[test]
    fn authorize_url_carries_client_id_and_fresh_state() {
        let store = MemoryStateStore::default();
        let first = start_authorization(&config(), &store).unwrap();
        let second = start_authorization(&config(), &store).unwrap();

        assert!(first.starts_with(GITHUB_AUTHORIZE_URL));
        assert!(first.contains("client_id=Iv1.abc"));
        assert!(first.contains("redirect_uri=https%3A%2F%2Fapp.example%2Fcallback"));
        assert_ne!(state_from(&first), state_from(&second));
        assert_eq!(store.peek(), Some(state_from(&second)));
    }

    #[test]
    fn missing_client_id_is_not_configured() {
        let store = MemoryStateStore::default();
        let err = start_authorization(&OAuthConfig::default(), &store).unwrap_err();
        assert!(matches!(err, OAuthError::NotConfigured));
        assert_eq!(store.peek(), None);
    }

    #[tokio::test]
    async fn matching_state_exchanges_code_and_clears_state() {
        let store = MemoryStateStore::default();
        let url = start_authorization(&config(), &store).unwrap();
        let exchanger = FakeExchanger::default();
        let params = CallbackParams {
            code: Some("abc".into()),
            state: Some(state_from(&url)),
            ..CallbackParams::default()
        };

        let token = complete_authorization(&params, &store, &exchanger)
            .await
            .unwrap()
            .expect("a code was returned");
        assert_eq!(token.access_token, "gho_token");
        assert_eq!(*exchanger.codes.lock().unwrap(), vec!["abc".to_string()]);
        assert_eq!(store.peek(), None);
    }

    #[tokio::test]
    async fn mismatched_state_fails_and_still_clears() {
        let store = MemoryStateStore::default();
        start_authorization(&config(), &store).unwrap();
        let exchanger = FakeExchanger::default();
        let params = CallbackParams {
            code: Some("abc".into()),
            state: Some("forged".into()),
            ..CallbackParams::default()
        };

        let err = complete_authorization(&params, &store, &exchanger)
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::CsrfStateMismatch));
        assert!(exchanger.codes.lock().unwrap().is_empty());
        assert_eq!(store.peek(), None);

        // The real state is gone too, so a retry with it is rejected.
        let err = complete_authorization(&params, &store, &exchanger)
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::MissingState));
    }

    #[tokio::test]
    async fn provider_error_is_surfaced_and_clears_state() {
        let store = MemoryStateStore::default();
        start_authorization(&config(), &store).unwrap();
        let params = CallbackParams::from_url(
            "https://app.example/callback?error=access_denied&error_description=User+denied",
        )
        .unwrap();

        let err = complete_authorization(&params, &store, &FakeExchanger::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "GitHub error: User denied");
        assert_eq!(store.peek(), None);
    }

    #[tokio::test]
    async fn url_without_code_is_not_a_callback() {
        let store = MemoryStateStore::default();
        let url = start_authorization(&config(), &store).unwrap();
        let exchanger = FakeExchanger::default();
        let params = CallbackParams::from_url("https://app.example/callback").unwrap();

        let outcome = complete_authorization(&params, &store, &exchanger)
            .await
            .unwrap();
        assert!(outcome.is_none());
        assert!(exchanger.codes.lock().unwrap().is_empty());
        assert_eq!(store.peek(), Some(state_from(&url)));
    }

    #[test]
    fn callback_params_parse_from_url() {
        let params =
            CallbackParams::from_url("https://app.example/callback?code=c0de&state=s%2F1").unwrap();
        assert_eq!(params.code.as_deref(), Some("c0de"));
        assert_eq!(params.state.as_deref(), Some("s/1"));
        assert!(params.error.is_none());
    }
}
