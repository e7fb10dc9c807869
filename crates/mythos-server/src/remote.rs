//! Token verification against an external identity provider.
//!
//! The provider's user-info endpoint is called with the caller's bearer
//! token; a 2xx answer carrying a user id means the token is good. Successful
//! lookups are cached for a configurable time so each request does not cost
//! a round trip.

use std::time::Duration;

use async_trait::async_trait;
use moka::sync::Cache;
use mythos_api::auth::{AuthError, Identity, TokenVerifier};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const MAX_CACHED_TOKENS: u64 = 10_000;

/// The subset of a user-info response we read. OIDC providers answer with
/// `sub`; simpler services with `id`.
#[derive(Debug, Deserialize)]
struct UserInfo {
  #[serde(alias = "sub")]
  id: String,
}

pub struct RemoteVerifier {
  client:       Client,
  userinfo_url: String,
  cache:        Cache<String, Identity>,
}

impl RemoteVerifier {
  pub fn new(userinfo_url: impl Into<String>, ttl: Duration) -> reqwest::Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
    let cache = Cache::builder()
      .time_to_live(ttl.max(Duration::from_secs(1)))
      .max_capacity(MAX_CACHED_TOKENS)
      .build();
    Ok(Self { client, userinfo_url: userinfo_url.into(), cache })
  }
}

#[async_trait]
impl TokenVerifier for RemoteVerifier {
  async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
    if let Some(identity) = self.cache.get(token) {
      return Ok(identity);
    }

    let resp = self
      .client
      .get(&self.userinfo_url)
      .bearer_auth(token)
      .send()
      .await
      .map_err(|e| AuthError::Unavailable(e.to_string()))?;
    if !resp.status().is_success() {
      debug!(status = %resp.status(), "identity provider rejected token");
      return Err(AuthError::Invalid);
    }
    let info: UserInfo = resp
      .json()
      .await
      .map_err(|e| AuthError::Unavailable(format!("malformed user info: {e}")))?;

    let identity = Identity { user_id: info.id };
    self.cache.insert(token.to_owned(), identity.clone());
    Ok(identity)
  }
}
