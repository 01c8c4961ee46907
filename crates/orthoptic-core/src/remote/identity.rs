//! Identity-provider client: sign-up, sign-in, token refresh.
//!
//! Speaks the provider's REST surface directly. Base URLs are injected at
//! construction so tests can point the client at a local mock server.

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::{AuthError, CoreError, RemoteError};
use crate::storage::BackendConfig;

/// Token triple returned by sign-up and sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokens {
    #[serde(rename = "localId")]
    pub user_id: String,
    #[serde(rename = "idToken")]
    pub id_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Token triple returned by the refresh endpoint (snake_case wire names).
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshedTokens {
    pub id_token: String,
    pub refresh_token: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// HTTP client for the external identity provider.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: Client,
    accounts_url: Url,
    token_url: Url,
    api_key: String,
}

impl IdentityClient {
    pub fn new(backend: &BackendConfig) -> Result<Self, CoreError> {
        Self::with_urls(&backend.identity_url, &backend.token_url, &backend.api_key)
    }

    /// Construct against explicit base URLs (tests point these at mocks).
    pub fn with_urls(accounts_url: &str, token_url: &str, api_key: &str) -> Result<Self, CoreError> {
        Ok(Self {
            http: Client::new(),
            accounts_url: parse_base(accounts_url)?,
            token_url: parse_base(token_url)?,
            api_key: api_key.to_string(),
        })
    }

    /// Create a new account. The provider rejects duplicates with an
    /// `EMAIL_EXISTS` message, surfaced as `AuthError::Provider`.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthTokens, CoreError> {
        self.account_call("/v1/accounts:signUp", email, password).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthTokens, CoreError> {
        self.account_call("/v1/accounts:signInWithPassword", email, password)
            .await
    }

    async fn account_call(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthTokens, CoreError> {
        let url = self
            .accounts_url
            .join(path)
            .map_err(|e| RemoteError::UnexpectedResponse(e.to_string()))?;
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let resp = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(RemoteError::Network)?;

        if resp.status().is_success() {
            Ok(resp
                .json::<AuthTokens>()
                .await
                .map_err(RemoteError::Network)?)
        } else {
            Err(provider_error(resp).await)
        }
    }

    /// Exchange a refresh token for a fresh token pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, CoreError> {
        let url = self
            .token_url
            .join("/v1/token")
            .map_err(|e| RemoteError::UnexpectedResponse(e.to_string()))?;
        let resp = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(RemoteError::Network)?;

        if resp.status().is_success() {
            Ok(resp
                .json::<RefreshedTokens>()
                .await
                .map_err(RemoteError::Network)?)
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            Err(AuthError::RefreshFailed(format!("HTTP {status}: {text}")).into())
        }
    }
}

fn parse_base(raw: &str) -> Result<Url, CoreError> {
    Url::parse(raw).map_err(|e| RemoteError::UnexpectedResponse(format!("bad base URL '{raw}': {e}")).into())
}

async fn provider_error(resp: reqwest::Response) -> CoreError {
    let status = resp.status();
    match resp.json::<ProviderError>().await {
        Ok(err) => AuthError::Provider(err.error.message).into(),
        Err(_) => RemoteError::UnexpectedResponse(format!("HTTP {status}")).into(),
    }
}

/// Humanize a provider error code for display: `EMAIL_EXISTS` becomes
/// `EMAIL EXISTS`.
pub fn humanize_provider_message(message: &str) -> String {
    message.replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_in_parses_token_triple() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/accounts:signInWithPassword")
            .match_query(mockito::Matcher::UrlEncoded("key".into(), "k".into()))
            .with_status(200)
            .with_body(r#"{"localId":"u1","idToken":"id1","refreshToken":"r1","email":"a@b.c"}"#)
            .create_async()
            .await;

        let client = IdentityClient::with_urls(&server.url(), &server.url(), "k").unwrap();
        let tokens = client.sign_in("a@b.c", "pw").await.unwrap();
        assert_eq!(tokens.user_id, "u1");
        assert_eq!(tokens.id_token, "id1");
        assert_eq!(tokens.refresh_token, "r1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sign_up_surfaces_provider_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/accounts:signUp")
            .match_query(mockito::Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"EMAIL_EXISTS"}}"#)
            .create_async()
            .await;

        let client = IdentityClient::with_urls(&server.url(), &server.url(), "k").unwrap();
        let err = client.sign_up("a@b.c", "pw").await.unwrap_err();
        assert!(
            matches!(err, CoreError::Auth(AuthError::Provider(ref m)) if m == "EMAIL_EXISTS"),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn refresh_sends_form_grant() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/token")
            .match_query(mockito::Matcher::UrlEncoded("key".into(), "k".into()))
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                mockito::Matcher::UrlEncoded("refresh_token".into(), "r1".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"id_token":"id2","refresh_token":"r2","user_id":"u1"}"#)
            .create_async()
            .await;

        let client = IdentityClient::with_urls(&server.url(), &server.url(), "k").unwrap();
        let tokens = client.refresh("r1").await.unwrap();
        assert_eq!(tokens.id_token, "id2");
        assert_eq!(tokens.refresh_token, "r2");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn refresh_rejection_is_refresh_failed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/token")
            .match_query(mockito::Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":{"code":400,"message":"TOKEN_EXPIRED"}}"#)
            .create_async()
            .await;

        let client = IdentityClient::with_urls(&server.url(), &server.url(), "k").unwrap();
        let err = client.refresh("stale").await.unwrap_err();
        assert!(matches!(err, CoreError::Auth(AuthError::RefreshFailed(_))));
    }

    #[test]
    fn humanize_replaces_underscores() {
        assert_eq!(humanize_provider_message("EMAIL_EXISTS"), "EMAIL EXISTS");
    }
}
