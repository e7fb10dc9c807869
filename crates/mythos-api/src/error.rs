//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use mythos_core::{DomainError, Error as CoreError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  /// The caller is authenticated but does not own the project.
  #[error("forbidden")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("payload too large: {0}")]
  PayloadTooLarge(String),

  #[error("unsupported media type: {0}")]
  UnsupportedMediaType(String),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a store error onto a status using its domain cause, if any.
  pub fn from_store<E>(e: E) -> Self
  where
    E: std::error::Error + DomainError + Send + Sync + 'static,
  {
    match e.domain() {
      Some(CoreError::ProjectNotFound(_) | CoreError::NotFound { .. }) => {
        Self::NotFound(e.to_string())
      }
      Some(
        CoreError::DanglingReference { .. }
        | CoreError::Validation { .. }
        | CoreError::RichText(_),
      ) => Self::BadRequest(e.to_string()),
      Some(CoreError::AlreadyLinked { .. }) => Self::Conflict(e.to_string()),
      Some(CoreError::Serialization(_)) | None => Self::Internal(Box::new(e)),
    }
  }

  pub fn not_found(what: impl std::fmt::Display) -> Self {
    Self::NotFound(format!("{what} not found"))
  }
}

impl From<CoreError> for ApiError {
  fn from(e: CoreError) -> Self { Self::from_store(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => {
        let mut res =
          (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" }))).into_response();
        res
          .headers_mut()
          .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        return res;
      }
      ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_string()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::PayloadTooLarge(m) => (StatusCode::PAYLOAD_TOO_LARGE, m.clone()),
      ApiError::UnsupportedMediaType(m) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, m.clone()),
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use mythos_core::EntityKind;
  use uuid::Uuid;

  use super::*;

  fn status(e: CoreError) -> StatusCode { ApiError::from(e).into_response().status() }

  #[test]
  fn domain_errors_map_to_client_statuses() {
    let id = Uuid::new_v4();
    assert_eq!(status(CoreError::ProjectNotFound(id)), StatusCode::NOT_FOUND);
    assert_eq!(status(CoreError::not_found(EntityKind::Spell, id)), StatusCode::NOT_FOUND);
    assert_eq!(status(CoreError::invalid("name", "blank")), StatusCode::BAD_REQUEST);
    assert_eq!(
      status(CoreError::DanglingReference { kind: EntityKind::Spell, id, project_id: id }),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(status(CoreError::AlreadyLinked { left: id, right: id }), StatusCode::CONFLICT);
  }

  #[test]
  fn unauthorized_carries_a_challenge() {
    let res = ApiError::Unauthorized.into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
  }
}
