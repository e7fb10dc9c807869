//! Rendering a [`Document`] to HTML and to plain text.

use std::fmt::Write as _;

use crate::{
  BlockContent, CheckItem, Document, ListItem,
  inline::{escape, sanitize, strip_tags},
};

// ─── Plain text ──────────────────────────────────────────────────────────────

fn push_line(out: &mut String, line: &str) {
  let line = line.trim();
  if line.is_empty() {
    return;
  }
  if !out.is_empty() {
    out.push('\n');
  }
  out.push_str(line);
}

fn list_text(out: &mut String, items: &[ListItem]) {
  for item in items {
    push_line(out, &strip_tags(item.text()));
    list_text(out, item.children());
  }
}

/// The document's readable text, one line per text-bearing block (list
/// items, checklist items and table rows get a line each). Markup is
/// stripped and entities decoded.
pub fn plain_text(doc: &Document) -> String {
  let mut out = String::new();
  for block in &doc.blocks {
    match &block.content {
      BlockContent::Paragraph { text } | BlockContent::Header { text, .. } => {
        push_line(&mut out, &strip_tags(text));
      }
      BlockContent::List { items, .. } => list_text(&mut out, items),
      BlockContent::Checklist { items } => {
        for CheckItem { text, .. } in items {
          push_line(&mut out, &strip_tags(text));
        }
      }
      BlockContent::Quote { text, caption } => {
        push_line(&mut out, &strip_tags(text));
        if let Some(c) = caption {
          push_line(&mut out, &strip_tags(c));
        }
      }
      BlockContent::Code { code } => push_line(&mut out, code),
      BlockContent::Image { caption, .. } | BlockContent::Embed { caption, .. } => {
        if let Some(c) = caption {
          push_line(&mut out, &strip_tags(c));
        }
      }
      BlockContent::Table { rows, .. } => {
        for row in rows {
          let cells: Vec<String> = row.iter().map(|c| strip_tags(c)).collect();
          push_line(&mut out, &cells.join(" | "));
        }
      }
      BlockContent::Unknown { data, .. } => {
        if let Some(text) = data.get("text").and_then(|t| t.as_str()) {
          push_line(&mut out, &strip_tags(text));
        }
      }
      BlockContent::Delimiter => {}
    }
  }
  out
}

/// A single-line excerpt of at most `max_chars` characters (plus an
/// ellipsis when truncated). Cuts at a word boundary when one is available.
pub fn summary(doc: &Document, max_chars: usize) -> String {
  let text = plain_text(doc);
  let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
  if collapsed.chars().count() <= max_chars {
    return collapsed;
  }

  let cut: String = collapsed.chars().take(max_chars).collect();
  let trimmed = match cut.rfind(' ') {
    Some(pos) if pos > 0 => &cut[..pos],
    _ => cut.as_str(),
  };
  format!("{}…", trimmed.trim_end())
}

/// URLs of every image block, in document order.
pub fn image_urls(doc: &Document) -> Vec<&str> {
  doc
    .blocks
    .iter()
    .filter_map(|b| match &b.content {
      BlockContent::Image { url, .. } => Some(url.as_str()),
      _ => None,
    })
    .collect()
}

// ─── HTML ────────────────────────────────────────────────────────────────────

/// Image sources must be absolute http(s) URLs or site-relative paths.
fn safe_src(url: &str) -> bool {
  let lower = url.trim().to_ascii_lowercase();
  lower.starts_with("https://")
    || lower.starts_with("http://")
    || (lower.starts_with('/') && !lower.starts_with("//"))
}

fn list_html(out: &mut String, ordered: bool, items: &[ListItem]) {
  let tag = if ordered { "ol" } else { "ul" };
  let _ = write!(out, "<{tag}>");
  for item in items {
    let _ = write!(out, "<li>{}", sanitize(item.text()));
    if !item.children().is_empty() {
      list_html(out, ordered, item.children());
    }
    out.push_str("</li>");
  }
  let _ = write!(out, "</{tag}>");
}

/// Render the document as an HTML fragment. Inline markup inside blocks is
/// sanitised; unknown block types are skipped.
pub fn render_html(doc: &Document) -> String {
  let mut out = String::new();
  for block in &doc.blocks {
    match &block.content {
      BlockContent::Paragraph { text } => {
        let _ = write!(out, "<p>{}</p>", sanitize(text));
      }
      BlockContent::Header { text, level } => {
        let level = (*level).clamp(1, 6);
        let _ = write!(out, "<h{level}>{}</h{level}>", sanitize(text));
      }
      BlockContent::List { ordered, items } => list_html(&mut out, *ordered, items),
      BlockContent::Checklist { items } => {
        out.push_str("<ul class=\"checklist\">");
        for item in items {
          let class = if item.checked { " class=\"checked\"" } else { "" };
          let _ = write!(out, "<li{class}>{}</li>", sanitize(&item.text));
        }
        out.push_str("</ul>");
      }
      BlockContent::Quote { text, caption } => {
        let _ = write!(out, "<blockquote><p>{}</p>", sanitize(text));
        if let Some(c) = caption {
          let _ = write!(out, "<cite>{}</cite>", sanitize(c));
        }
        out.push_str("</blockquote>");
      }
      BlockContent::Code { code } => {
        let _ = write!(out, "<pre><code>{}</code></pre>", escape(code));
      }
      BlockContent::Delimiter => out.push_str("<hr>"),
      BlockContent::Image { url, caption } => {
        if !safe_src(url) {
          continue;
        }
        let alt = caption.as_deref().map(strip_tags).unwrap_or_default();
        let _ = write!(
          out,
          "<figure><img src=\"{}\" alt=\"{}\">",
          escape(url.trim()),
          escape(&alt)
        );
        if let Some(c) = caption {
          let _ = write!(out, "<figcaption>{}</figcaption>", sanitize(c));
        }
        out.push_str("</figure>");
      }
      BlockContent::Table { with_headings, rows } => {
        out.push_str("<table>");
        for (i, row) in rows.iter().enumerate() {
          let cell = if *with_headings && i == 0 { "th" } else { "td" };
          out.push_str("<tr>");
          for c in row {
            let _ = write!(out, "<{cell}>{}</{cell}>", sanitize(c));
          }
          out.push_str("</tr>");
        }
        out.push_str("</table>");
      }
      BlockContent::Embed { service, source, caption } => {
        if !safe_src(source) {
          continue;
        }
        let label = caption
          .as_deref()
          .map(sanitize)
          .unwrap_or_else(|| escape(service));
        let _ = write!(
          out,
          "<figure class=\"embed\"><a href=\"{}\">{label}</a></figure>",
          escape(source.trim())
        );
      }
      BlockContent::Unknown { .. } => {}
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse;

  fn doc() -> Document {
    parse(
      r#"{"blocks":[
        {"type":"header","data":{"text":"House <i>Varn</i>","level":3}},
        {"type":"paragraph","data":{"text":"Sworn to the &amp; crown<script>x()</script>"}},
        {"type":"list","data":{"style":"unordered","items":["Swords",{"content":"Ships","items":["Galleys"]}]}},
        {"type":"checklist","data":{"items":[{"text":"Map the coast","checked":true},{"text":"Name the king"}]}},
        {"type":"image","data":{"url":"/uploads/varn.png","caption":"Sigil"}},
        {"type":"image","data":{"url":"javascript:alert(1)"}},
        {"type":"table","data":{"withHeadings":true,"content":[["Name","Seat"],["Varn","Kest"]]}},
        {"type":"delimiter","data":{}},
        {"type":"code","data":{"code":"<tag>"}}
      ]}"#,
    )
    .unwrap()
  }

  #[test]
  fn plain_text_covers_text_bearing_blocks() {
    let text = plain_text(&doc());
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec![
      "House Varn",
      "Sworn to the & crownx()",
      "Swords",
      "Ships",
      "Galleys",
      "Map the coast",
      "Name the king",
      "Sigil",
      "Name | Seat",
      "Varn | Kest",
      "<tag>",
    ]);
  }

  #[test]
  fn summary_truncates_on_word_boundary() {
    let d = Document::from_paragraph("The quick brown fox jumps over the lazy dog");
    assert_eq!(summary(&d, 100), "The quick brown fox jumps over the lazy dog");
    assert_eq!(summary(&d, 12), "The quick…");
  }

  #[test]
  fn image_urls_in_order() {
    assert_eq!(image_urls(&doc()), vec!["/uploads/varn.png", "javascript:alert(1)"]);
  }

  #[test]
  fn html_is_structural_and_sanitised() {
    let html = render_html(&doc());
    assert!(html.starts_with("<h3>House <i>Varn</i></h3>"), "{html}");
    assert!(html.contains("<p>Sworn to the &amp; crownx()</p>"), "{html}");
    assert!(html.contains("<ul><li>Swords</li><li>Ships<ul><li>Galleys</li></ul></li></ul>"), "{html}");
    assert!(html.contains("<li class=\"checked\">Map the coast</li>"), "{html}");
    assert!(html.contains("<img src=\"/uploads/varn.png\" alt=\"Sigil\">"), "{html}");
    assert!(!html.contains("javascript"), "{html}");
    assert!(html.contains("<tr><th>Name</th><th>Seat</th></tr>"), "{html}");
    assert!(html.contains("<hr>"), "{html}");
    assert!(html.ends_with("<pre><code>&lt;tag&gt;</code></pre>"), "{html}");
  }
}
