//! JSON <-> [`Block`] conversion and document parsing.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
  Block, BlockContent, CheckItem, Document, Error, ListItem, Result,
  inline::escape,
};

// ─── Wire shapes ─────────────────────────────────────────────────────────────

/// A block exactly as it appears in the stored JSON: `{id?, type, data}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBlock {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  id:   Option<String>,
  #[serde(rename = "type")]
  kind: String,
  #[serde(default)]
  data: Value,
}

#[derive(Deserialize)]
struct RawDocument {
  time:    Option<i64>,
  #[serde(default)]
  blocks:  Vec<RawBlock>,
  version: Option<String>,
}

#[derive(Deserialize)]
struct TextData {
  #[serde(default)]
  text: String,
}

#[derive(Deserialize)]
struct HeaderData {
  #[serde(default)]
  text:  String,
  #[serde(default = "default_level")]
  level: u8,
}

fn default_level() -> u8 { 2 }

#[derive(Deserialize)]
struct ListData {
  style: Option<String>,
  #[serde(default)]
  items: Vec<ListItem>,
}

#[derive(Deserialize)]
struct ChecklistData {
  #[serde(default)]
  items: Vec<CheckItem>,
}

#[derive(Deserialize)]
struct QuoteData {
  #[serde(default)]
  text:    String,
  caption: Option<String>,
}

#[derive(Deserialize)]
struct CodeData {
  #[serde(default)]
  code: String,
}

#[derive(Deserialize)]
struct FileRef {
  url: String,
}

/// Accepts both the uploader form (`file.url`) and the simple-image form
/// (`url`).
#[derive(Deserialize)]
struct ImageData {
  file:    Option<FileRef>,
  url:     Option<String>,
  caption: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableData {
  #[serde(default)]
  with_headings: bool,
  #[serde(default)]
  content:       Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct EmbedData {
  #[serde(default)]
  service: String,
  #[serde(default)]
  source:  String,
  caption: Option<String>,
}

fn non_empty(s: Option<String>) -> Option<String> {
  s.filter(|c| !c.trim().is_empty())
}

// ─── Decode ──────────────────────────────────────────────────────────────────

fn decode(kind: &str, data: Value) -> Result<BlockContent, String> {
  let data = if data.is_null() { json!({}) } else { data };
  let de = |e: serde_json::Error| e.to_string();

  let content = match kind {
    "paragraph" => {
      let d: TextData = serde_json::from_value(data).map_err(de)?;
      BlockContent::Paragraph { text: d.text }
    }
    "header" => {
      let d: HeaderData = serde_json::from_value(data).map_err(de)?;
      if !(1..=6).contains(&d.level) {
        return Err(format!("header level {} out of range 1-6", d.level));
      }
      BlockContent::Header { text: d.text, level: d.level }
    }
    "list" => {
      let d: ListData = serde_json::from_value(data).map_err(de)?;
      BlockContent::List {
        ordered: d.style.as_deref() == Some("ordered"),
        items:   d.items,
      }
    }
    "checklist" => {
      let d: ChecklistData = serde_json::from_value(data).map_err(de)?;
      BlockContent::Checklist { items: d.items }
    }
    "quote" => {
      let d: QuoteData = serde_json::from_value(data).map_err(de)?;
      BlockContent::Quote { text: d.text, caption: non_empty(d.caption) }
    }
    "code" => {
      let d: CodeData = serde_json::from_value(data).map_err(de)?;
      BlockContent::Code { code: d.code }
    }
    "delimiter" => BlockContent::Delimiter,
    "image" => {
      let d: ImageData = serde_json::from_value(data).map_err(de)?;
      let url = d
        .file
        .map(|f| f.url)
        .or(d.url)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| "image block has no url".to_string())?;
      BlockContent::Image { url, caption: non_empty(d.caption) }
    }
    "table" => {
      let d: TableData = serde_json::from_value(data).map_err(de)?;
      BlockContent::Table { with_headings: d.with_headings, rows: d.content }
    }
    "embed" => {
      let d: EmbedData = serde_json::from_value(data).map_err(de)?;
      BlockContent::Embed {
        service: d.service,
        source:  d.source,
        caption: non_empty(d.caption),
      }
    }
    other => BlockContent::Unknown { kind: other.to_string(), data },
  };
  Ok(content)
}

impl TryFrom<RawBlock> for Block {
  type Error = String;

  fn try_from(raw: RawBlock) -> Result<Self, String> {
    Ok(Block { id: raw.id, content: decode(&raw.kind, raw.data)? })
  }
}

// ─── Encode ──────────────────────────────────────────────────────────────────

fn encode(content: BlockContent) -> (String, Value) {
  let kind = content.kind().to_string();
  let data = match content {
    BlockContent::Paragraph { text } => json!({ "text": text }),
    BlockContent::Header { text, level } => json!({ "text": text, "level": level }),
    BlockContent::List { ordered, items } => json!({
      "style": if ordered { "ordered" } else { "unordered" },
      "items": items,
    }),
    BlockContent::Checklist { items } => json!({ "items": items }),
    BlockContent::Quote { text, caption } => json!({
      "text": text,
      "caption": caption.unwrap_or_default(),
    }),
    BlockContent::Code { code } => json!({ "code": code }),
    BlockContent::Delimiter => json!({}),
    BlockContent::Image { url, caption } => json!({
      "file": { "url": url },
      "caption": caption.unwrap_or_default(),
    }),
    BlockContent::Table { with_headings, rows } => json!({
      "withHeadings": with_headings,
      "content": rows,
    }),
    BlockContent::Embed { service, source, caption } => json!({
      "service": service,
      "source": source,
      "caption": caption.unwrap_or_default(),
    }),
    BlockContent::Unknown { data, .. } => data,
  };
  (kind, data)
}

impl From<Block> for RawBlock {
  fn from(block: Block) -> Self {
    let (kind, data) = encode(block.content);
    RawBlock { id: block.id, kind, data }
  }
}

// ─── Entry points ────────────────────────────────────────────────────────────

/// Parse a stored JSON block document.
///
/// Fails on malformed JSON and on blocks whose data does not fit their
/// declared type (e.g. a header with level 9, an image without a url).
pub fn parse(input: &str) -> Result<Document> {
  let raw: RawDocument = serde_json::from_str(input)?;

  let blocks = raw
    .blocks
    .into_iter()
    .enumerate()
    .map(|(index, rb)| {
      let kind = rb.kind.clone();
      Block::try_from(rb).map_err(|reason| Error::InvalidBlock { index, kind, reason })
    })
    .collect::<Result<Vec<_>>>()?;

  Ok(Document { time: raw.time, blocks, version: raw.version })
}

/// Parse a descriptive field that may hold either a block document or
/// legacy plain text.
///
/// Text that does not start with `{` is wrapped in a single paragraph, with
/// markup characters escaped and newlines turned into `<br>`.
pub fn parse_field(input: &str) -> Result<Document> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Ok(Document::default());
  }
  if trimmed.starts_with('{') {
    return parse(trimmed);
  }
  Ok(Document::from_paragraph(escape(trimmed).replace('\n', "<br>")))
}
