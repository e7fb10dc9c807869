//! Image uploads.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/uploads` | Multipart, field `image`; 201 `{url, name, media_type, size}` |
//! | `DELETE` | `/uploads/{name}` | Uploaders only; 204, 403 for someone else's file, 404 otherwise |
//!
//! An upload is checked before it reaches the [`ImageStore`]: the declared
//! content type must name a supported format *and* the leading bytes must
//! carry that format's signature.
//!
//! Files are content-addressed, so identical uploads share one file. A file
//! is only deleted once no user claims it and no record anywhere mentions it.

use std::{io, path::PathBuf};

use async_trait::async_trait;
use axum::{
  Json,
  extract::{Multipart, Path, State},
  http::StatusCode,
};
use bytes::Bytes;
use mythos_core::{Entity, activity::Action, project::Project, store::WorldStore};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::{
  AppState,
  activity::{self, Subject},
  auth::{CurrentUser, Identity},
  error::ApiError,
};

/// Largest accepted image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Request body limit for `POST /uploads`; leaves room for multipart framing.
pub const MAX_UPLOAD_BODY: usize = MAX_IMAGE_BYTES + 64 * 1024;

// ─── Formats ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
  Png,
  Jpeg,
  Gif,
  Webp,
}

impl ImageFormat {
  const ALL: [ImageFormat; 4] =
    [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Gif, ImageFormat::Webp];

  /// Parse a `Content-Type` value, ignoring parameters and case.
  pub fn from_media_type(value: &str) -> Option<Self> {
    let essence = value.split(';').next().unwrap_or_default().trim();
    Self::ALL.into_iter().find(|f| f.media_type().eq_ignore_ascii_case(essence))
  }

  pub fn media_type(self) -> &'static str {
    match self {
      Self::Png => "image/png",
      Self::Jpeg => "image/jpeg",
      Self::Gif => "image/gif",
      Self::Webp => "image/webp",
    }
  }

  pub fn extension(self) -> &'static str {
    match self {
      Self::Png => "png",
      Self::Jpeg => "jpg",
      Self::Gif => "gif",
      Self::Webp => "webp",
    }
  }

  /// Whether `bytes` starts with this format's magic number.
  pub fn matches(self, bytes: &[u8]) -> bool {
    match self {
      Self::Png => bytes.starts_with(b"\x89PNG\r\n\x1a\n"),
      Self::Jpeg => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
      Self::Gif => bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a"),
      Self::Webp => bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP",
    }
  }
}

/// Decide whether an upload is an acceptable image.
pub fn check(content_type: Option<&str>, bytes: &[u8]) -> Result<ImageFormat, ApiError> {
  if bytes.len() > MAX_IMAGE_BYTES {
    return Err(ApiError::PayloadTooLarge(format!(
      "images are limited to {MAX_IMAGE_BYTES} bytes"
    )));
  }
  let declared = content_type.unwrap_or("application/octet-stream");
  let format = ImageFormat::from_media_type(declared)
    .ok_or_else(|| ApiError::UnsupportedMediaType(format!("{declared} is not a supported image type")))?;
  if !format.matches(bytes) {
    return Err(ApiError::UnsupportedMediaType(format!(
      "content is not a valid {}",
      format.media_type()
    )));
  }
  Ok(format)
}

// ─── Storage ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredImage {
  pub url:        String,
  /// File name inside the store; what `DELETE /uploads/{name}` takes.
  pub name:       String,
  pub media_type: &'static str,
  pub size:       usize,
}

/// Where uploaded images live.
#[async_trait]
pub trait ImageStore: Send + Sync {
  async fn put(&self, format: ImageFormat, bytes: Bytes) -> io::Result<StoredImage>;

  /// Returns `false` if no such file exists.
  async fn remove(&self, name: &str) -> io::Result<bool>;

  /// The file name behind `url`, if the URL points into this store.
  fn owns(&self, url: &str) -> Option<String>;
}

/// Content-addressed files in one directory: `<sha256-hex>.<ext>`.
#[derive(Debug, Clone)]
pub struct DiskImageStore {
  dir:         PathBuf,
  public_base: String,
}

impl DiskImageStore {
  pub fn new(dir: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
    let public_base = public_base.into().trim_end_matches('/').to_owned();
    Self { dir: dir.into(), public_base }
  }

  fn url_prefix(&self) -> String { format!("{}/uploads/", self.public_base) }
}

/// Whether `name` has the shape of a stored file name. Rejects anything that
/// could escape the upload directory.
pub fn is_stored_name(name: &str) -> bool {
  let Some((digest, ext)) = name.split_once('.') else {
    return false;
  };
  digest.len() == 64
    && digest.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    && ImageFormat::ALL.iter().any(|f| f.extension() == ext)
}

#[async_trait]
impl ImageStore for DiskImageStore {
  async fn put(&self, format: ImageFormat, bytes: Bytes) -> io::Result<StoredImage> {
    let digest = hex::encode(Sha256::digest(&bytes));
    let name = format!("{digest}.{}", format.extension());
    tokio::fs::create_dir_all(&self.dir).await?;
    tokio::fs::write(self.dir.join(&name), &bytes).await?;
    debug!(file = %name, size = bytes.len(), "stored image");
    Ok(StoredImage {
      url:        format!("{}{name}", self.url_prefix()),
      name,
      media_type: format.media_type(),
      size:       bytes.len(),
    })
  }

  async fn remove(&self, name: &str) -> io::Result<bool> {
    if !is_stored_name(name) {
      return Ok(false);
    }
    match tokio::fs::remove_file(self.dir.join(name)).await {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
      Err(e) => Err(e),
    }
  }

  fn owns(&self, url: &str) -> Option<String> {
    let name = url.strip_prefix(&self.url_prefix())?;
    is_stored_name(name).then(|| name.to_owned())
  }
}

// ─── Cleanup ─────────────────────────────────────────────────────────────────

fn rich_text_images(raw: Option<&str>) -> Vec<String> {
  raw
    .and_then(|r| mythos_blocks::parse_field(r).ok())
    .map(|doc| mythos_blocks::image_urls(&doc).into_iter().map(str::to_owned).collect())
    .unwrap_or_default()
}

/// Every image URL a record refers to: its `image_url` and any image
/// blocks in its rich text.
pub fn referenced<E: Entity>(record: &E) -> Vec<String> {
  let mut urls = rich_text_images(record.rich_text());
  urls.extend(record.image_url().map(str::to_owned));
  urls
}

pub fn referenced_by_project(project: &Project) -> Vec<String> {
  let mut urls = rich_text_images(project.description.as_deref());
  urls.extend(project.image_url.clone());
  urls
}

/// URLs in `before` that `after` no longer mentions.
pub fn dropped(before: Vec<String>, after: &[String]) -> Vec<String> {
  before.into_iter().filter(|u| !after.contains(u)).collect()
}

/// Delete the file `name` unless a record mentions it or a user still
/// claims it. Returns whether the file went.
async fn remove_if_unused<S: WorldStore>(
  store: &S,
  images: &dyn ImageStore,
  name: &str,
) -> Result<bool, ApiError> {
  let in_use = store.image_referenced(name).await.map_err(ApiError::from_store)?
    || store.upload_claimed(name).await.map_err(ApiError::from_store)?;
  if in_use {
    debug!(file = %name, "image still in use, kept");
    return Ok(false);
  }
  images.remove(name).await.map_err(|e| ApiError::Internal(Box::new(e)))
}

/// Let go of the images behind `urls` after `user` stopped using them:
/// drop the user's claims and delete files nothing else needs. Call once
/// the change that dropped the references has been stored. Failures are
/// logged and otherwise ignored.
pub async fn discard<S: WorldStore>(
  store: &S,
  images: &dyn ImageStore,
  user: &Identity,
  urls: Vec<String>,
) {
  for url in urls {
    let Some(name) = images.owns(&url) else {
      continue;
    };
    if let Err(e) = store.release_upload(&user.user_id, &name).await {
      warn!(error = %e, file = %name, "failed to release upload claim");
      continue;
    }
    if let Err(e) = remove_if_unused(store, images, &name).await {
      warn!(error = %e, file = %name, "failed to remove image");
    }
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `POST /uploads`
pub async fn upload<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredImage>), ApiError>
where
  S: WorldStore + 'static,
{
  let field_error = |e: axum::extract::multipart::MultipartError| {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
      ApiError::PayloadTooLarge(e.body_text())
    } else {
      ApiError::BadRequest(e.body_text())
    }
  };

  while let Some(field) = multipart.next_field().await.map_err(field_error)? {
    if field.name() != Some("image") {
      continue;
    }
    let content_type = field.content_type().map(str::to_owned);
    let bytes = field.bytes().await.map_err(field_error)?;
    let format = check(content_type.as_deref(), &bytes)?;
    let stored = state
      .images
      .put(format, bytes)
      .await
      .map_err(|e| ApiError::Internal(Box::new(e)))?;
    state
      .store
      .claim_upload(user.user_id.clone(), stored.name.clone())
      .await
      .map_err(ApiError::from_store)?;

    activity::record(
      state.store.as_ref(),
      &user,
      Action::Uploaded,
      Subject { project_id: None, kind: None, id: None, summary: &stored.url },
    )
    .await;
    return Ok((StatusCode::CREATED, Json(stored)));
  }
  Err(ApiError::BadRequest("missing multipart field `image`".into()))
}

/// `DELETE /uploads/{name}`
///
/// Withdraws the caller's upload. The file itself stays while another user
/// claims it or any record mentions it.
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(name): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: WorldStore + 'static,
{
  if !is_stored_name(&name) {
    return Err(ApiError::not_found(format!("upload {name}")));
  }
  let store = state.store.as_ref();
  if !store.release_upload(&user.user_id, &name).await.map_err(ApiError::from_store)? {
    return Err(if store.upload_claimed(&name).await.map_err(ApiError::from_store)? {
      ApiError::Forbidden
    } else {
      ApiError::not_found(format!("upload {name}"))
    });
  }
  remove_if_unused(store, state.images.as_ref(), &name).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use super::*;

  const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

  #[test]
  fn declared_type_and_signature_must_agree() {
    assert_eq!(check(Some("image/png"), PNG).unwrap(), ImageFormat::Png);
    assert_eq!(check(Some("IMAGE/PNG; charset=binary"), PNG).unwrap(), ImageFormat::Png);
    assert!(matches!(
      check(Some("image/jpeg"), PNG),
      Err(ApiError::UnsupportedMediaType(_))
    ));
    assert!(matches!(
      check(Some("text/plain"), b"hello"),
      Err(ApiError::UnsupportedMediaType(_))
    ));
    assert!(matches!(check(None, PNG), Err(ApiError::UnsupportedMediaType(_))));
  }

  #[test]
  fn webp_needs_both_riff_and_webp_markers() {
    assert!(ImageFormat::Webp.matches(b"RIFF\x10\0\0\0WEBPVP8 "));
    assert!(!ImageFormat::Webp.matches(b"RIFF\x10\0\0\0WAVEfmt "));
    assert!(!ImageFormat::Webp.matches(b"RIFF"));
  }

  #[test]
  fn oversized_images_are_rejected() {
    let mut big = PNG.to_vec();
    big.resize(MAX_IMAGE_BYTES + 1, 0);
    assert!(matches!(check(Some("image/png"), &big), Err(ApiError::PayloadTooLarge(_))));
  }

  #[test]
  fn stored_names_cannot_traverse() {
    let digest = "a".repeat(64);
    assert!(is_stored_name(&format!("{digest}.png")));
    assert!(!is_stored_name(&format!("{digest}.exe")));
    assert!(!is_stored_name("../etc/passwd"));
    assert!(!is_stored_name(&format!("{}.png", "A".repeat(64))));
  }

  #[tokio::test]
  async fn disk_store_is_content_addressed() {
    let dir = tempfile::tempdir().unwrap();
    let store = DiskImageStore::new(dir.path(), "http://localhost:8080/");

    let a = store.put(ImageFormat::Png, Bytes::from_static(PNG)).await.unwrap();
    let b = store.put(ImageFormat::Png, Bytes::from_static(PNG)).await.unwrap();
    assert_eq!(a, b);
    assert!(a.url.starts_with("http://localhost:8080/uploads/"));
    assert!(a.url.ends_with(".png"));

    let name = store.owns(&a.url).unwrap();
    assert!(dir.path().join(&name).exists());
    assert_eq!(store.owns("https://elsewhere.example/uploads/x.png"), None);

    assert!(store.remove(&name).await.unwrap());
    assert!(!store.remove(&name).await.unwrap());
  }

  #[test]
  fn dropped_keeps_only_vanished_urls() {
    let before = vec!["a".to_string(), "b".to_string()];
    assert_eq!(dropped(before, &["b".to_string()]), vec!["a".to_string()]);
  }
}
