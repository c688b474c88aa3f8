//! Content-line parser for the card format.
//!
//! Pipeline:
//!   raw &str
//!     └─ unfold_lines()          → Vec<String>
//!          └─ ascii_tag()        → tag segment folded to plain ASCII
//!               └─ parse_content_line() → Property
//!                    └─ fold_fields()   → field name → rendered string

use std::collections::BTreeMap;

use deunicode::deunicode;

use crate::error::{Error, Result};

// ─── Property representation ─────────────────────────────────────────────────

/// One content line: lowercased ASCII name, collected TYPE values, value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Property {
  pub name:  String,
  pub types: Vec<String>,
  pub value: String,
}

// ─── Low-level helpers ───────────────────────────────────────────────────────

/// Join CRLF+SP (or LF+SP / LF+HT) continuation lines. Tolerates bare LF
/// line endings and drops blank lines.
fn unfold_lines(s: &str) -> Vec<String> {
  let mut lines: Vec<String> = Vec::new();
  for raw in s.split('\n') {
    let line = raw.strip_suffix('\r').unwrap_or(raw);
    if line.starts_with(' ') || line.starts_with('\t') {
      if let Some(last) = lines.last_mut() {
        last.push_str(&line[1..]);
      }
      // leading continuation with no prior line: discard
    } else {
      lines.push(line.to_string());
    }
  }
  lines.retain(|l| !l.is_empty());
  lines
}

/// Find the first `:` that is not inside a double-quoted string.
fn find_unquoted_colon(s: &str) -> Option<usize> {
  let mut in_quotes = false;
  for (i, c) in s.char_indices() {
    match c {
      '"' => in_quotes = !in_quotes,
      ':' if !in_quotes => return Some(i),
      _ => {}
    }
  }
  None
}

/// Split on `;` while respecting double-quoted strings.
fn split_semicolons(s: &str) -> Vec<&str> {
  let mut result = Vec::new();
  let mut start = 0usize;
  let mut in_quotes = false;
  for (i, c) in s.char_indices() {
    match c {
      '"' => in_quotes = !in_quotes,
      ';' if !in_quotes => {
        result.push(&s[start..i]);
        start = i + 1;
      }
      _ => {}
    }
  }
  result.push(&s[start..]);
  result
}

/// Whether `c` may appear in a raw (pre-transliteration) tag name:
/// uppercase ASCII, a limited range of accented capitals, or `-`.
fn is_tag_char(c: char) -> bool {
  c == '-' || c.is_ascii_uppercase() || (('À'..='Ý').contains(&c) && c != '×')
}

/// Fold an accented tag name to plain ASCII before structural parsing.
///
/// Some card producers emit accented property names; the structural
/// grammar only admits ASCII tags, so the name segment (up to the first
/// `;` or unquoted `:`) is transliterated when it looks like a tag.
fn ascii_tag(line: &str) -> String {
  let Some(colon) = find_unquoted_colon(line) else {
    return line.to_string();
  };
  let name_end = line[..colon].find(';').unwrap_or(colon);
  let tag = &line[..name_end];
  if !tag.is_empty() && !tag.is_ascii() && tag.chars().all(is_tag_char) {
    format!("{}{}", deunicode(tag), &line[name_end..])
  } else {
    line.to_string()
  }
}

/// Undo the card format's value escaping.
fn unescape(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  let mut chars = value.chars();
  while let Some(c) = chars.next() {
    if c != '\\' {
      out.push(c);
      continue;
    }
    match chars.next() {
      Some('n') | Some('N') => out.push('\n'),
      Some(escaped) => out.push(escaped),
      None => out.push('\\'),
    }
  }
  out
}

// ─── Content-line parsing ────────────────────────────────────────────────────

fn parse_content_line(line: &str) -> Result<Property> {
  let colon = find_unquoted_colon(line).ok_or_else(|| Error::MalformedLine(line.to_string()))?;
  let (head, value) = (&line[..colon], &line[colon + 1..]);

  let mut segments = split_semicolons(head).into_iter();
  let name = segments
    .next()
    .filter(|n| !n.is_empty())
    .ok_or_else(|| Error::MalformedLine(line.to_string()))?
    .to_ascii_lowercase();

  // Collect TYPE= values, handling `TYPE=A,B` and repeated params.
  let mut types = Vec::new();
  for segment in segments {
    if let Some((key, values)) = segment.split_once('=')
      && key.eq_ignore_ascii_case("TYPE")
    {
      for t in values.split(',') {
        let t = t.trim().trim_matches('"').to_uppercase();
        if !t.is_empty() {
          types.push(t);
        }
      }
    }
  }

  Ok(Property {
    name,
    types,
    value: unescape(value),
  })
}

/// Parse a single card. The `BEGIN:VCARD … END:VCARD` envelope is
/// required; the markers themselves do not become fields.
pub(crate) fn parse_one(input: &str) -> Result<Vec<Property>> {
  let lines = unfold_lines(input);

  let begin = lines
    .iter()
    .position(|l| l.eq_ignore_ascii_case("BEGIN:VCARD"))
    .ok_or(Error::MissingEnvelope)?;
  let end = lines[begin + 1..]
    .iter()
    .position(|l| l.eq_ignore_ascii_case("END:VCARD"))
    .map(|offset| begin + 1 + offset)
    .ok_or(Error::MissingEnvelope)?;

  lines[begin + 1..end]
    .iter()
    .map(|line| parse_content_line(&ascii_tag(line)))
    .collect()
}

// ─── Folding into record fields ──────────────────────────────────────────────

/// Render one entry: plain value text, or `<name{T1,T2} value>` when the
/// entry carries type tags.
fn render_entry(property: &Property) -> String {
  if property.types.is_empty() {
    property.value.clone()
  } else {
    format!(
      "<{}{{{}}} {}>",
      property.name,
      property.types.join(","),
      property.value
    )
  }
}

/// Group properties by field name (input order within a field) and coerce
/// each group to its bracketed string representation.
pub(crate) fn fold_fields(properties: &[Property]) -> BTreeMap<String, String> {
  let mut grouped: BTreeMap<String, Vec<&Property>> = BTreeMap::new();
  for property in properties {
    grouped.entry(property.name.clone()).or_default().push(property);
  }

  grouped
    .into_iter()
    .map(|(name, entries)| {
      let rendered: Vec<String> = entries.iter().map(|p| render_entry(p)).collect();
      (name, format!("[{}]", rendered.join(", ")))
    })
    .collect()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse_card;

  #[test]
  fn unfolds_continuation_lines() {
    let lines = unfold_lines("FN:Ali\r\n ce\r\nTEL:+1\n\t555\r\n");
    assert_eq!(lines, ["FN:Alice", "TEL:+1555"]);
  }

  #[test]
  fn folds_accented_tags_to_ascii() {
    assert_eq!(ascii_tag("ADRÉSSE:12 rue du Bac"), "ADRESSE:12 rue du Bac");
    // Lowercase (a value-looking line) is left alone.
    assert_eq!(ascii_tag("note:café"), "note:café");
  }

  #[test]
  fn parses_type_params() {
    let p = parse_content_line("TEL;TYPE=HOME,VOICE;TYPE=pref:+15551234").unwrap();
    assert_eq!(p.name, "tel");
    assert_eq!(p.types, ["HOME", "VOICE", "PREF"]);
    assert_eq!(p.value, "+15551234");
  }

  #[test]
  fn line_without_colon_is_malformed() {
    assert!(matches!(
      parse_content_line("NO-SEPARATOR-HERE"),
      Err(Error::MalformedLine(_))
    ));
  }

  #[test]
  fn missing_envelope_is_rejected() {
    assert!(matches!(
      parse_card("FN:Alice\r\n"),
      Err(Error::MissingEnvelope)
    ));
    assert!(matches!(
      parse_card("BEGIN:VCARD\r\nFN:Alice\r\n"),
      Err(Error::MissingEnvelope)
    ));
  }

  #[test]
  fn unescapes_values() {
    let p = parse_content_line(r"NOTE:line one\nline two\, really").unwrap();
    assert_eq!(p.value, "line one\nline two, really");
  }

  #[test]
  fn folds_a_full_card() {
    let card = "BEGIN:VCARD\r\n\
                VERSION:3.0\r\n\
                FN:Alice Smith\r\n\
                TEL;TYPE=HOME:+15551234\r\n\
                TEL;TYPE=WORK:+15559876\r\n\
                END:VCARD\r\n";
    let fields = parse_card(card).unwrap();

    assert_eq!(fields["version"], "[3.0]");
    assert_eq!(fields["fn"], "[Alice Smith]");
    assert_eq!(
      fields["tel"],
      "[<tel{HOME} +15551234>, <tel{WORK} +15559876>]"
    );
    assert!(!fields.contains_key("begin"));
    assert!(!fields.contains_key("end"));
  }

  #[test]
  fn accented_tag_survives_structural_parse() {
    let card = "BEGIN:VCARD\r\nADRÉSSE;TYPE=HOME:12 rue du Bac\r\nEND:VCARD\r\n";
    let fields = parse_card(card).unwrap();
    assert_eq!(fields["adresse"], "[<adresse{HOME} 12 rue du Bac>]");
  }
}
