//! Access-token acquisition for the Firestore REST API.
//!
//! The client only consumes the [`TokenProvider`] trait; the implementations
//! here cover the common OAuth2 flows: service-account JWT-bearer,
//! authorized-user refresh grants, the GCE metadata server, and fixed
//! tokens for tests and emulators.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::error::{unauthenticated, FirestoreResult};

mod authorized_user;
mod jwt;
mod metadata;
mod service_account;

pub use authorized_user::{AuthorizedUserCredentials, AuthorizedUserTokenProvider};
pub use jwt::JwtSigner;
pub use metadata::MetadataTokenProvider;
pub use service_account::{ServiceAccountCredentials, ServiceAccountTokenProvider};

#[async_trait]
pub trait TokenProvider: Send + Sync + 'static {
    /// Returns a bearer token, or `None` when requests go out unauthenticated
    /// (emulator traffic).
    async fn get_token(&self) -> FirestoreResult<Option<String>>;

    /// Drops any cached token so the next request fetches a fresh one.
    fn invalidate_token(&self);
}

pub type TokenProviderArc = Arc<dyn TokenProvider>;

/// Issues no token at all; the emulator accepts unauthenticated requests.
#[derive(Default, Clone)]
pub struct NoopTokenProvider;

#[async_trait]
impl TokenProvider for NoopTokenProvider {
    async fn get_token(&self) -> FirestoreResult<Option<String>> {
        Ok(None)
    }

    fn invalidate_token(&self) {}
}

/// Hands out one fixed token, useful in tests.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> FirestoreResult<Option<String>> {
        Ok(Some(self.token.clone()))
    }

    fn invalidate_token(&self) {}
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Clone, Debug)]
pub(crate) struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub(crate) fn from_response(response: TokenResponse) -> Self {
        let lifetime = Duration::seconds((response.expires_in - EXPIRY_MARGIN_SECS).max(0));
        Self {
            token: response.access_token,
            expires_at: Utc::now() + lifetime,
        }
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    pub(crate) fn is_fresh(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

pub(crate) async fn exchange_token(
    client: &reqwest::Client,
    endpoint: &str,
    params: &[(&str, &str)],
) -> FirestoreResult<TokenResponse> {
    let response = client
        .post(endpoint)
        .form(params)
        .send()
        .await
        .map_err(|err| unauthenticated(err.to_string()))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| unauthenticated(err.to_string()))?;
    if !status.is_success() {
        return Err(unauthenticated(format!(
            "Token endpoint returned {status}: {text}"
        )));
    }
    serde_json::from_str(&text)
        .map_err(|err| unauthenticated(format!("Invalid token response: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_token_expires() {
        let stale = CachedToken {
            token: "t".to_string(),
            expires_at: Utc::now() - Duration::seconds(1),
        };
        assert!(!stale.is_fresh());

        let fresh = CachedToken::from_response(TokenResponse {
            access_token: "t".to_string(),
            expires_in: 3600,
        });
        assert!(fresh.is_fresh());
    }

    #[tokio::test]
    async fn static_provider_returns_token() {
        let provider = StaticTokenProvider::new("owner");
        assert_eq!(provider.get_token().await.unwrap().as_deref(), Some("owner"));
    }

    #[tokio::test]
    async fn noop_provider_returns_none() {
        assert_eq!(NoopTokenProvider.get_token().await.unwrap(), None);
    }
}
