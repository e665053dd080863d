use async_lock::Mutex;
use async_trait::async_trait;
use serde::Deserialize;

use crate::constants::{OAUTH_TOKEN_ENDPOINT, REFRESH_TOKEN_GRANT_TYPE};
use crate::credentials::{exchange_token, CachedToken, TokenProvider};
use crate::error::{invalid_argument, FirestoreResult};

/// An authorized-user credential as written by
/// `gcloud auth application-default login`.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthorizedUserCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl AuthorizedUserCredentials {
    pub fn from_json(raw: &str) -> FirestoreResult<Self> {
        serde_json::from_str(raw)
            .map_err(|err| invalid_argument(format!("Invalid authorized user credential: {err}")))
    }

    /// Loads `application_default_credentials.json` from the gcloud
    /// configuration directory (`%APPDATA%` on Windows, `$HOME/.config`
    /// elsewhere).
    pub fn application_default() -> FirestoreResult<Self> {
        let prefix = if cfg!(windows) {
            std::env::var("APPDATA")
        } else {
            std::env::var("HOME").map(|home| format!("{home}/.config"))
        }
        .map_err(|_| invalid_argument("Could not locate the gcloud configuration directory"))?;

        let path = format!("{prefix}/gcloud/application_default_credentials.json");
        let raw = std::fs::read_to_string(&path)
            .map_err(|err| invalid_argument(format!("Could not read {path}: {err}")))?;
        Self::from_json(&raw)
    }
}

/// Redeems the refresh token for cached access tokens.
pub struct AuthorizedUserTokenProvider {
    credentials: AuthorizedUserCredentials,
    client: reqwest::Client,
    token_endpoint: String,
    cache: Mutex<Option<CachedToken>>,
}

impl AuthorizedUserTokenProvider {
    pub fn new(credentials: AuthorizedUserCredentials) -> Self {
        Self {
            credentials,
            client: reqwest::Client::new(),
            token_endpoint: OAUTH_TOKEN_ENDPOINT.to_string(),
            cache: Mutex::new(None),
        }
    }

    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl TokenProvider for AuthorizedUserTokenProvider {
    async fn get_token(&self) -> FirestoreResult<Option<String>> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh() {
                return Ok(Some(cached.token().to_string()));
            }
        }

        log::debug!("refreshing authorized-user access token");
        let response = exchange_token(
            &self.client,
            &self.token_endpoint,
            &[
                ("grant_type", REFRESH_TOKEN_GRANT_TYPE),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", self.credentials.refresh_token.as_str()),
            ],
        )
        .await?;

        let cached = CachedToken::from_response(response);
        let token = cached.token().to_string();
        *cache = Some(cached);
        Ok(Some(token))
    }

    fn invalidate_token(&self) {
        *self.cache.lock_blocking() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn redeems_refresh_token() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/token")
                .body_contains("grant_type=refresh_token")
                .body_contains("refresh_token=r1");
            then.status(200)
                .json_body(json!({ "access_token": "fresh", "expires_in": 3600 }));
        });

        let provider = AuthorizedUserTokenProvider::new(AuthorizedUserCredentials {
            client_id: "c".to_string(),
            client_secret: "s".to_string(),
            refresh_token: "r1".to_string(),
        })
        .with_token_endpoint(format!("{}/token", server.base_url()));

        assert_eq!(provider.get_token().await.unwrap().as_deref(), Some("fresh"));
        mock.assert();
    }
}
