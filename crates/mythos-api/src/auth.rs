//! Bearer-token authentication.
//!
//! Identity is delegated: a [`TokenVerifier`] turns the token into a user id
//! and the API never sees credentials. [`StaticTokens`] serves development
//! setups; the server binary provides a verifier backed by the identity
//! provider.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use mythos_core::store::WorldStore;
use thiserror::Error;

use crate::{AppState, error::ApiError};

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  pub user_id: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
  /// The token is unknown, expired or malformed.
  #[error("invalid token")]
  Invalid,

  /// The verifier could not reach a decision.
  #[error("identity provider unavailable: {0}")]
  Unavailable(String),
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
  async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

// ─── Static tokens ───────────────────────────────────────────────────────────

/// A fixed token → user id table, read from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
  tokens: HashMap<String, String>,
}

impl StaticTokens {
  pub fn new(tokens: impl IntoIterator<Item = (String, String)>) -> Self {
    Self { tokens: tokens.into_iter().collect() }
  }
}

#[async_trait]
impl TokenVerifier for StaticTokens {
  async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
    self
      .tokens
      .get(token)
      .map(|user_id| Identity { user_id: user_id.clone() })
      .ok_or(AuthError::Invalid)
  }
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The token from `Authorization: Bearer <token>`; the scheme is
/// case-insensitive.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let (scheme, token) = value.split_once(' ')?;
  let token = token.trim();
  (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Present in a handler means the request carried a valid bearer token.
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: WorldStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
    match state.auth.verify(token).await {
      Ok(identity) => Ok(CurrentUser(identity)),
      Err(AuthError::Invalid) => Err(ApiError::Unauthorized),
      Err(e @ AuthError::Unavailable(_)) => Err(ApiError::Internal(Box::new(e))),
    }
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn bearer_scheme_is_required() {
    assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
    assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
    assert_eq!(bearer_token(&headers("Basic abc")), None);
    assert_eq!(bearer_token(&headers("Bearer ")), None);
    assert_eq!(bearer_token(&HeaderMap::new()), None);
  }

  #[tokio::test]
  async fn static_tokens_resolve_users() {
    let tokens = StaticTokens::new([("t-1".to_string(), "user-1".to_string())]);
    assert_eq!(tokens.verify("t-1").await.unwrap().user_id, "user-1");
    assert!(matches!(tokens.verify("nope").await, Err(AuthError::Invalid)));
  }
}
