//! Inline markup handling for block text.
//!
//! Block text carries the editor's inline HTML (`<b>`, `<i>`, `<a href>`…).
//! [`sanitize`] keeps a small allow-list of tags and escapes everything else;
//! [`strip_tags`] reduces the text to plain characters for search and
//! summaries.

/// Tags allowed through [`sanitize`]. `a` additionally keeps its `href`.
const ALLOWED: &[&str] = &["a", "b", "br", "code", "em", "i", "mark", "strong", "u"];

/// Tags that never have a closing counterpart.
const VOID: &[&str] = &["br"];

const SAFE_SCHEMES: &[&str] = &["http://", "https://", "mailto:"];

/// Escape the five HTML-significant characters.
pub fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      other => out.push(other),
    }
  }
  out
}

/// Length of a character/numeric entity reference at the start of `s`
/// (including `&` and `;`), if there is one.
fn entity_len(s: &str) -> Option<usize> {
  let body = s.strip_prefix('&')?;
  let end = body.find(';')?;
  let name = &body[..end];
  let valid = !name.is_empty()
    && name.len() <= 10
    && (name.chars().all(|c| c.is_ascii_alphanumeric())
      || name
        .strip_prefix('#')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_alphanumeric())));
  valid.then_some(end + 2)
}

fn decode_entity(entity: &str) -> Option<char> {
  let name = entity.strip_prefix('&')?.strip_suffix(';')?;
  match name {
    "amp" => Some('&'),
    "lt" => Some('<'),
    "gt" => Some('>'),
    "quot" => Some('"'),
    "apos" => Some('\''),
    "nbsp" => Some(' '),
    _ => {
      let num = name.strip_prefix('#')?;
      let code = match num.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => num.parse().ok()?,
      };
      char::from_u32(code)
    }
  }
}

/// A parsed `<...>` tag.
struct Tag<'a> {
  name:    String,
  closing: bool,
  attrs:   &'a str,
}

/// `inner` is the text between `<` and `>`. A tag name must follow the `<`
/// (or `</`) directly; anything else is literal text.
fn parse_tag(inner: &str) -> Option<Tag<'_>> {
  let (closing, rest) = match inner.strip_prefix('/') {
    Some(r) => (true, r),
    None => (false, inner),
  };
  if !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
    return None;
  }
  let rest = rest.trim_end_matches('/').trim_end();
  let name_end = rest
    .find(|c: char| !c.is_ascii_alphanumeric())
    .unwrap_or(rest.len());
  if name_end == 0 {
    return None;
  }
  Some(Tag {
    name: rest[..name_end].to_ascii_lowercase(),
    closing,
    attrs: &rest[name_end..],
  })
}

/// Extract the `href` attribute value from a tag's attribute string.
fn href(attrs: &str) -> Option<&str> {
  let lower = attrs.to_ascii_lowercase();
  let start = lower.find("href")?;
  let after = attrs[start + 4..].trim_start().strip_prefix('=')?.trim_start();
  let value = match after.chars().next()? {
    q @ ('"' | '\'') => {
      let body = &after[1..];
      &body[..body.find(q)?]
    }
    _ => after.split_whitespace().next()?,
  };
  Some(value)
}

fn safe_href(value: &str) -> bool {
  let lower = value.trim().to_ascii_lowercase();
  SAFE_SCHEMES.iter().any(|s| lower.starts_with(s))
}

/// Keep allow-listed inline tags, drop every other tag (keeping its text),
/// and escape stray markup characters. The output is always balanced.
pub fn sanitize(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut open: Vec<String> = Vec::new();
  let mut rest = text;

  while let Some(c) = rest.chars().next() {
    match c {
      '<' => {
        let found = rest
          .find('>')
          .and_then(|close| Some((close, parse_tag(&rest[1..close])?)));
        let Some((close, tag)) = found else {
          out.push_str("&lt;");
          rest = &rest[1..];
          continue;
        };
        if ALLOWED.contains(&tag.name.as_str()) {
          if tag.closing {
            if let Some(pos) = open.iter().rposition(|t| *t == tag.name) {
              for t in open.drain(pos..).rev() {
                out.push_str(&format!("</{t}>"));
              }
            }
          } else if VOID.contains(&tag.name.as_str()) {
            out.push_str(&format!("<{}>", tag.name));
          } else if tag.name == "a" {
            match href(tag.attrs).filter(|h| safe_href(h)) {
              Some(h) => out.push_str(&format!("<a href=\"{}\">", escape(h.trim()))),
              None => out.push_str("<a>"),
            }
            open.push(tag.name);
          } else {
            out.push_str(&format!("<{}>", tag.name));
            open.push(tag.name);
          }
        }
        rest = &rest[close + 1..];
      }
      '&' => match entity_len(rest) {
        Some(len) => {
          out.push_str(&rest[..len]);
          rest = &rest[len..];
        }
        None => {
          out.push_str("&amp;");
          rest = &rest[1..];
        }
      },
      '>' => {
        out.push_str("&gt;");
        rest = &rest[1..];
      }
      '"' => {
        out.push_str("&quot;");
        rest = &rest[1..];
      }
      other => {
        out.push(other);
        rest = &rest[other.len_utf8()..];
      }
    }
  }

  for t in open.into_iter().rev() {
    out.push_str(&format!("</{t}>"));
  }
  out
}

/// Remove all tags and decode entities. `<br>` becomes a space.
pub fn strip_tags(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut rest = text;

  while let Some(c) = rest.chars().next() {
    match c {
      '<' => match rest
        .find('>')
        .and_then(|close| Some((close, parse_tag(&rest[1..close])?)))
      {
        Some((close, tag)) => {
          if tag.name == "br" {
            out.push(' ');
          }
          rest = &rest[close + 1..];
        }
        None => {
          out.push('<');
          rest = &rest[1..];
        }
      },
      '&' => match entity_len(rest).and_then(|len| Some((len, decode_entity(&rest[..len])?))) {
        Some((len, ch)) => {
          out.push(ch);
          rest = &rest[len..];
        }
        None => {
          out.push('&');
          rest = &rest[1..];
        }
      },
      other => {
        out.push(other);
        rest = &rest[other.len_utf8()..];
      }
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn keeps_allowed_tags() {
    assert_eq!(sanitize("a <b>bold</b> and <i>it</i>"), "a <b>bold</b> and <i>it</i>");
  }

  #[test]
  fn drops_disallowed_tags_but_keeps_text() {
    assert_eq!(
      sanitize("<script>alert(1)</script><span style=\"x\">hi</span>"),
      "alert(1)hi"
    );
  }

  #[test]
  fn links_keep_only_safe_hrefs() {
    assert_eq!(
      sanitize("<a href=\"https://example.com\" onclick=\"x()\">go</a>"),
      "<a href=\"https://example.com\">go</a>"
    );
    assert_eq!(sanitize("<a href=\"javascript:alert(1)\">no</a>"), "<a>no</a>");
  }

  #[test]
  fn unbalanced_tags_are_closed() {
    assert_eq!(sanitize("<b><i>open"), "<b><i>open</i></b>");
    assert_eq!(sanitize("stray</b>"), "stray");
  }

  #[test]
  fn stray_markup_characters_are_escaped() {
    assert_eq!(sanitize("1 < 2 & 3 > 2"), "1 &lt; 2 &amp; 3 &gt; 2");
    assert_eq!(sanitize("fish &amp; chips"), "fish &amp; chips");
  }

  #[test]
  fn strip_tags_decodes_entities() {
    assert_eq!(
      strip_tags("<b>Fire</b> &amp; ice<br>&#65;&#x42;"),
      "Fire & ice AB"
    );
  }

  #[test]
  fn href_handles_single_quotes_and_bare_values() {
    assert_eq!(href(" href='mailto:a@b.c'"), Some("mailto:a@b.c"));
    assert_eq!(href(" href=http://x.y class=z"), Some("http://x.y"));
  }
}
