use async_lock::Mutex;
use async_trait::async_trait;

use crate::constants::METADATA_TOKEN_URL;
use crate::credentials::{CachedToken, TokenProvider, TokenResponse};
use crate::error::{unauthenticated, FirestoreResult};

/// Fetches tokens from the GCE metadata server, available to workloads
/// running on Google infrastructure.
pub struct MetadataTokenProvider {
    client: reqwest::Client,
    token_url: String,
    cache: Mutex<Option<CachedToken>>,
}

impl MetadataTokenProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            token_url: METADATA_TOKEN_URL.to_string(),
            cache: Mutex::new(None),
        }
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }
}

impl Default for MetadataTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenProvider for MetadataTokenProvider {
    async fn get_token(&self) -> FirestoreResult<Option<String>> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh() {
                return Ok(Some(cached.token().to_string()));
            }
        }

        log::debug!("requesting access token from the metadata server");
        let response = self
            .client
            .get(&self.token_url)
            .header("Metadata-Flavor", "Google")
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
                "Metadata server returned {status}: {text}"
            )));
        }
        let parsed: TokenResponse = serde_json::from_str(&text)
            .map_err(|err| unauthenticated(format!("Invalid metadata token response: {err}")))?;

        let cached = CachedToken::from_response(parsed);
        let token = cached.token().to_string();
        *cache = Some(cached);
        Ok(Some(token))
    }

    fn invalidate_token(&self) {
        *self.cache.lock_blocking() = None;
    }
}
