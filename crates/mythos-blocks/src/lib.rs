//! Rich-text block documents for Mythos descriptive fields.
//!
//! Long-form fields (character descriptions, lore content, notes) are stored
//! as a JSON document of typed blocks:
//!
//! ```json
//! {"time": 1700000000000, "blocks": [{"type": "paragraph", "data": {"text": "..."}}], "version": "2.28.0"}
//! ```
//!
//! The `version` string is carried along untouched; there is no schema
//! versioning. Block types this crate does not know are preserved as
//! [`BlockContent::Unknown`] so a round-trip never loses content.

pub mod error;
mod inline;
mod parse;
mod render;

use serde::{Deserialize, Serialize};

pub use error::{Error, Result};
pub use inline::{escape, sanitize, strip_tags};
pub use parse::{parse, parse_field};
pub use render::{image_urls, plain_text, render_html, summary};

// ─── Document ────────────────────────────────────────────────────────────────

/// A parsed rich-text document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
  /// Editor save time in epoch milliseconds, if the editor supplied one.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub time:    Option<i64>,
  #[serde(default)]
  pub blocks:  Vec<Block>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
}

impl Document {
  pub fn is_empty(&self) -> bool { self.blocks.is_empty() }

  /// A document holding a single paragraph. Used for legacy plain-text
  /// fields that predate the block editor.
  pub fn from_paragraph(text: impl Into<String>) -> Self {
    Self {
      time:    None,
      blocks:  vec![Block::new(BlockContent::Paragraph { text: text.into() })],
      version: None,
    }
  }
}

// ─── Blocks ──────────────────────────────────────────────────────────────────

/// One block of a [`Document`]. The editor-assigned `id` is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "parse::RawBlock", into = "parse::RawBlock")]
pub struct Block {
  pub id:      Option<String>,
  pub content: BlockContent,
}

impl Block {
  pub fn new(content: BlockContent) -> Self { Self { id: None, content } }

  /// The `type` discriminant as written in the JSON document.
  pub fn kind(&self) -> &str { self.content.kind() }
}

/// The typed payload of a block. Text fields may carry inline HTML markup
/// produced by the editor; see [`sanitize`] and [`strip_tags`].
#[derive(Debug, Clone, PartialEq)]
pub enum BlockContent {
  Paragraph {
    text: String,
  },
  Header {
    text:  String,
    /// 1 through 6.
    level: u8,
  },
  List {
    ordered: bool,
    items:   Vec<ListItem>,
  },
  Checklist {
    items: Vec<CheckItem>,
  },
  Quote {
    text:    String,
    caption: Option<String>,
  },
  Code {
    code: String,
  },
  Delimiter,
  Image {
    url:     String,
    caption: Option<String>,
  },
  Table {
    with_headings: bool,
    rows:          Vec<Vec<String>>,
  },
  Embed {
    service: String,
    source:  String,
    caption: Option<String>,
  },
  /// A block type this crate does not interpret.
  Unknown {
    kind: String,
    data: serde_json::Value,
  },
}

impl BlockContent {
  pub fn kind(&self) -> &str {
    match self {
      Self::Paragraph { .. } => "paragraph",
      Self::Header { .. } => "header",
      Self::List { .. } => "list",
      Self::Checklist { .. } => "checklist",
      Self::Quote { .. } => "quote",
      Self::Code { .. } => "code",
      Self::Delimiter => "delimiter",
      Self::Image { .. } => "image",
      Self::Table { .. } => "table",
      Self::Embed { .. } => "embed",
      Self::Unknown { kind, .. } => kind,
    }
  }
}

/// A list entry: either a bare string or a nested item with children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListItem {
  Text(String),
  Nested {
    content: String,
    #[serde(default)]
    items:   Vec<ListItem>,
  },
}

impl ListItem {
  pub fn text(&self) -> &str {
    match self {
      Self::Text(t) => t,
      Self::Nested { content, .. } => content,
    }
  }

  pub fn children(&self) -> &[ListItem] {
    match self {
      Self::Text(_) => &[],
      Self::Nested { items, .. } => items,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckItem {
  pub text:    String,
  #[serde(default)]
  pub checked: bool,
}
