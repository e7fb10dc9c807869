//! Project-wide text search.
//!
//! Matching and ranking happen here so every backend behaves identically.
//! Rich text is matched on its plain-text form, so block markup and JSON keys
//! never produce hits.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{entity::Entity, kind::EntityKind};

/// Default number of hits returned when a query sets no limit.
pub const DEFAULT_LIMIT: usize = 50;

const SNIPPET_BEFORE: usize = 40;
const SNIPPET_AFTER: usize = 80;

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
  pub text:  String,
  /// Restrict to these kinds; empty means every kind.
  pub kinds: Vec<EntityKind>,
  pub limit: Option<usize>,
}

impl SearchQuery {
  pub fn new(text: impl Into<String>) -> Self {
    Self { text: text.into(), kinds: Vec::new(), limit: None }
  }

  pub fn wants(&self, kind: EntityKind) -> bool {
    self.kinds.is_empty() || self.kinds.contains(&kind)
  }

  /// The lowercased, trimmed needle, or `None` for a blank query.
  pub fn needle(&self) -> Option<String> {
    let t = self.text.trim();
    (!t.is_empty()).then(|| t.to_lowercase())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
  pub kind:    EntityKind,
  pub id:      Uuid,
  pub label:   String,
  /// Text surrounding the first match in the record's content, if the match
  /// was there; otherwise a summary of the content.
  pub snippet: Option<String>,
  /// 3 exact label match, 2 label contains, 1 content contains.
  pub score:   u8,
}

/// Plain text of a record's rich-text field. Unparseable content is
/// matched as-is.
fn content_text<E: Entity>(record: &E) -> Option<String> {
  let raw = record.rich_text()?;
  Some(match mythos_blocks::parse_field(raw) {
    Ok(doc) => mythos_blocks::plain_text(&doc),
    Err(_) => raw.to_string(),
  })
}

/// Byte offset of the first case-insensitive occurrence of `needle`
/// (already lowercased) in `haystack`.
///
/// Lowercasing can change a character's byte length, so the lowered copy
/// keeps, per byte, the offset of the character it came from.
fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
  let mut lower = String::with_capacity(haystack.len());
  let mut origin = Vec::with_capacity(haystack.len());
  for (i, c) in haystack.char_indices() {
    for l in c.to_lowercase() {
      lower.push(l);
    }
    origin.resize(lower.len(), i);
  }
  lower.find(needle).and_then(|at| origin.get(at).copied())
}

fn snippet_around(text: &str, at: usize) -> String {
  let start = text[..at]
    .char_indices()
    .rev()
    .nth(SNIPPET_BEFORE.saturating_sub(1))
    .map_or(0, |(i, _)| i);
  let end = text[at..]
    .char_indices()
    .nth(SNIPPET_AFTER)
    .map_or(text.len(), |(i, _)| at + i);

  let mut out = String::new();
  if start > 0 {
    out.push('…');
  }
  out.push_str(&text[start..end].split_whitespace().collect::<Vec<_>>().join(" "));
  if end < text.len() {
    out.push('…');
  }
  out
}

/// Score `record` against a lowercased needle; `None` when it does not match.
pub fn score<E: Entity>(record: &E, needle: &str) -> Option<SearchHit> {
  let label = record.label();
  let label_lower = label.to_lowercase();
  let content = content_text(record);

  let (score, snippet) = if label_lower == needle {
    (3, None)
  } else if label_lower.contains(needle) {
    (2, None)
  } else {
    let text = content.as_deref()?;
    let at = find_ci(text, needle)?;
    (1, Some(snippet_around(text, at)))
  };

  let snippet = snippet.or_else(|| {
    record
      .rich_text()
      .and_then(|raw| mythos_blocks::parse_field(raw).ok())
      .map(|doc| mythos_blocks::summary(&doc, SNIPPET_AFTER))
      .filter(|s| !s.is_empty())
  });

  Some(SearchHit {
    kind: E::KIND,
    id: record.id(),
    label: label.to_string(),
    snippet,
    score,
  })
}

/// Score every record of one kind, skipping kinds the query excludes.
pub fn collect<E: Entity>(records: &[E], query: &SearchQuery, hits: &mut Vec<SearchHit>) {
  let Some(needle) = query.needle() else { return };
  if !query.wants(E::KIND) {
    return;
  }
  hits.extend(records.iter().filter_map(|r| score(r, &needle)));
}

/// Order hits best-first (score, then label) and apply the query's limit.
pub fn rank(mut hits: Vec<SearchHit>, query: &SearchQuery) -> Vec<SearchHit> {
  hits.sort_by(|a, b| {
    b.score
      .cmp(&a.score)
      .then_with(|| a.label.to_lowercase().cmp(&b.label.to_lowercase()))
  });
  hits.truncate(query.limit.unwrap_or(DEFAULT_LIMIT));
  hits
}
