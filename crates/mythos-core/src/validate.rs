//! Request-body validation.
//!
//! Deserialisation already enforces field types; [`Validate`] adds the rules
//! serde cannot express (non-blank labels, numeric ranges, well-formed rich
//! text).

use crate::{Error, Result};

pub trait Validate {
  fn validate(&self) -> Result<()>;
}

/// Labels must contain something other than whitespace.
pub fn required(field: &'static str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::invalid(field, "must not be blank"));
  }
  Ok(())
}

/// Like [`required`], for a patch field that may be absent.
pub fn required_if_present(field: &'static str, value: Option<&String>) -> Result<()> {
  value.map_or(Ok(()), |v| required(field, v))
}

/// A rich-text field must be either plain text or a well-formed block
/// document.
pub fn rich_text(field: &'static str, value: Option<&str>) -> Result<()> {
  if let Some(v) = value {
    mythos_blocks::parse_field(v)
      .map_err(|e| Error::invalid(field, e.to_string()))?;
  }
  Ok(())
}

/// Patch form of [`rich_text`].
pub fn rich_text_patch(field: &'static str, value: Option<&Option<String>>) -> Result<()> {
  rich_text(field, value.and_then(|v| v.as_deref()))
}

pub fn in_range(field: &'static str, value: Option<i32>, min: i32, max: i32) -> Result<()> {
  match value {
    Some(v) if v < min || v > max => {
      Err(Error::invalid(field, format!("{v} is outside {min}..={max}")))
    }
    _ => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_labels_are_rejected() {
    assert!(required("name", "Aria").is_ok());
    assert!(matches!(
      required("name", "   "),
      Err(Error::Validation { field: "name", .. })
    ));
  }

  #[test]
  fn rich_text_accepts_plain_and_block_documents() {
    assert!(rich_text("description", Some("just words")).is_ok());
    assert!(rich_text("description", Some(r#"{"blocks":[]}"#)).is_ok());
    assert!(rich_text("description", None).is_ok());
    assert!(rich_text("description", Some(r#"{"blocks":[{"type":"header","data":{"level":0}}]}"#)).is_err());
    assert!(rich_text("description", Some("{not json")).is_err());
  }

  #[test]
  fn range_is_inclusive() {
    assert!(in_range("strength", Some(1), 1, 10).is_ok());
    assert!(in_range("strength", Some(10), 1, 10).is_ok());
    assert!(in_range("strength", None, 1, 10).is_ok());
    assert!(in_range("strength", Some(11), 1, 10).is_err());
  }
}
