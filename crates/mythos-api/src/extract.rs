//! Request extractors.

use axum::{
  Json,
  extract::{FromRequest, Request},
};
use mythos_core::validate::Validate;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Like [`Json`], but also runs [`Validate`] on the body. Malformed JSON and
/// failed validation are both 400.
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
  T: DeserializeOwned + Validate,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let Json(value) = Json::<T>::from_request(req, state)
      .await
      .map_err(|e| ApiError::BadRequest(e.body_text()))?;
    value.validate()?;
    Ok(ValidJson(value))
  }
}
