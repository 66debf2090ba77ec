//! Code-for-token exchange through the proxy.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::OAuthError;
use crate::http::{HttpRequest, HttpTransport};

/// Path of the proxy's exchange endpoint.
pub const TOKEN_EXCHANGE_PATH: &str = "/api/oauth/token";

/// Token returned by a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Debug, Deserialize)]
struct ProxyErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Turns an authorization code into a token.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange(&self, code: &str) -> Result<TokenResponse, OAuthError>;
}

/// [`TokenExchanger`] that POSTs `{code}` to the proxy.
pub struct ProxyTokenExchanger {
    transport: Arc<dyn HttpTransport>,
    proxy_url: String,
}

impl ProxyTokenExchanger {
    pub fn new(proxy_url: &str, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            proxy_url: proxy_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}{TOKEN_EXCHANGE_PATH}", self.proxy_url)
    }
}

#[async_trait]
impl TokenExchanger for ProxyTokenExchanger {
    async fn exchange(&self, code: &str) -> Result<TokenResponse, OAuthError> {
        let body = serde_json::to_vec(&serde_json::json!({ "code": code }))
            .map_err(|e| OAuthError::Parse(e.to_string()))?;
        let request = HttpRequest::post_json(
            self.endpoint(),
            vec![("Accept".to_string(), "application/json".to_string())],
            body,
        );

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| OAuthError::Http(e.to_string()))?;
        debug!(status = response.status, "Token proxy responded");

        let proxy_message = || {
            serde_json::from_slice::<ProxyErrorBody>(&response.body)
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| format!("HTTP {}", response.status))
        };

        match response.status {
            200 => {
                let token: TokenResponse = serde_json::from_slice(&response.body)
                    .map_err(|e| OAuthError::Parse(e.to_string()))?;
                if token.access_token.is_empty() {
                    return Err(OAuthError::Parse("empty access_token".to_string()));
                }
                Ok(token)
            }
            400 => Err(OAuthError::InvalidRequest(proxy_message())),
            500 => Err(OAuthError::NotConfigured),
            502 => Err(OAuthError::ExchangeFailed { status: 502 }),
            status => Err(OAuthError::provider(format!(
                "unexpected token proxy status {status}: {}",
                proxy_message()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, HttpResponse, MockTransport};

    const PROXY: &str = "https://proxy.example";

    fn exchanger(status: u16, body: &str) -> (ProxyTokenExchanger, MockTransport) {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Post,
            format!("{PROXY}{TOKEN_EXCHANGE_PATH}"),
            HttpResponse {
                status,
                headers: Vec::new(),
                body: body.as_bytes().to_vec(),
            },
        );
        let exchanger = ProxyTokenExchanger::new("https://proxy.example/", Arc::new(transport.clone()));
        (exchanger, transport)
    }

    #[tokio::test]
    async fn successful_exchange_posts_code() {
        let (exchanger, transport) =
            exchanger(200, r#"{"access_token":"gho_x","token_type":"bearer"}"#);
        let token = exchanger.exchange("c0de").await.unwrap();
        assert_eq!(token.access_token, "gho_x");

        let request = &transport.requests()[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.header("content-type"), Some("application/json"));
        let sent: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(sent, serde_json::json!({"code": "c0de"}));
    }

    #[tokio::test]
    async fn proxy_statuses_are_classified() {
        let (e, _) = exchanger(400, r#"{"error":"Missing code"}"#);
        match e.exchange("x").await.unwrap_err() {
            OAuthError::InvalidRequest(message) => assert_eq!(message, "Missing code"),
            other => panic!("expected InvalidRequest, got {other:?}"),
        }

        let (e, _) = exchanger(500, "{}");
        assert!(matches!(e.exchange("x").await, Err(OAuthError::NotConfigured)));

        let (e, _) = exchanger(502, "{}");
        assert!(matches!(
            e.exchange("x").await,
            Err(OAuthError::ExchangeFailed { status: 502 })
        ));

        let (e, _) = exchanger(200, "not json");
        assert!(matches!(e.exchange("x").await, Err(OAuthError::Parse(_))));
    }
}
