//! Line-oriented model of a `KEY=value` env file.
//!
//! A [`Document`] is an ordered list of lines: entries, comments, blanks and
//! anything else kept verbatim. Parsing never fails; a line the model does
//! not understand is carried through untouched so that editing one key never
//! disturbs the rest of the file.

use std::fmt;

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

const COMMENT_PREFIX: &str = "#";
const ASSIGNMENT_OPERATOR: char = '=';

/// An in-memory env file, preserving line order and non-entry content.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
  pub lines: Vec<Line>,
}

/// One line of an env file.
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
  /// `KEY=VALUE`. The value is the raw text after the first `=`, quoting and
  /// all; use [`parse_value`] to read it back.
  Entry { key: String, value: String },
  /// A `#`-prefixed line, kept verbatim.
  Comment(String),
  EmptyLine,
  /// A non-blank, non-comment line without `=`, kept verbatim and ignored by
  /// every query.
  Raw(String),
}

impl fmt::Display for Document {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for line in &self.lines {
      write!(f, "{}", line)?;
    }
    Ok(())
  }
}

impl fmt::Display for Line {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Line::Entry { key, value } => {
        writeln!(f, "{}{}{}", key, ASSIGNMENT_OPERATOR, value)
      }
      Line::Comment(text) | Line::Raw(text) => writeln!(f, "{}", text),
      Line::EmptyLine => writeln!(f),
    }
  }
}

impl From<&str> for Line {
  fn from(s: &str) -> Self {
    let trimmed = s.trim();

    if trimmed.is_empty() {
      Line::EmptyLine
    } else if trimmed.starts_with(COMMENT_PREFIX) {
      Line::Comment(s.to_string())
    } else if let Some((key, value)) = s.split_once(ASSIGNMENT_OPERATOR) {
      Line::Entry {
        key: key.to_string(),
        value: value.to_string(),
      }
    } else {
      Line::Raw(s.to_string())
    }
  }
}

impl Document {
  /// Parses the whole file content. Infallible: unknown lines become
  /// [`Line::Raw`].
  pub fn parse(s: &str) -> Self {
    #[cfg(feature = "tracing")]
    debug!("Parsing env file with {} lines", s.lines().count());

    let lines = s.lines().map(Line::from).collect();

    Self { lines }
  }

  /// Returns the raw value of the first entry with this key.
  pub fn get(&self, key: &str) -> Option<&str> {
    self.lines.iter().find_map(|line| {
      if let Line::Entry { key: k, value } = line
        && k == key
      {
        Some(value.as_str())
      } else {
        None
      }
    })
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.get(key).is_some()
  }

  /// All entries in file order. Duplicate keys are last-wins: the value of a
  /// later occurrence overwrites, the position of the first is kept.
  pub fn entries(&self) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    for line in &self.lines {
      if let Line::Entry { key, value } = line {
        let parsed = parse_value(value);
        if let Some(existing) = pairs.iter_mut().find(|(k, _)| k == key) {
          existing.1 = parsed;
        } else {
          pairs.push((key.clone(), parsed));
        }
      }
    }

    pairs
  }

  /// Replaces the first entry with this key in place, or appends a new one at
  /// the end. Returns the previous raw value when the key existed.
  pub fn set(&mut self, key: &str, raw_value: String) -> Option<String> {
    if let Some(old) = self.replace(key, raw_value.clone()) {
      return Some(old);
    }

    #[cfg(feature = "tracing")]
    trace!("Appending new entry for {}", key);

    self.lines.push(Line::Entry {
      key: key.to_string(),
      value: raw_value,
    });

    None
  }

  /// Replaces the first entry with this key in place. Returns `None` without
  /// touching the document when the key is absent.
  pub fn replace(&mut self, key: &str, raw_value: String) -> Option<String> {
    for line in &mut self.lines {
      if let Line::Entry { key: k, value } = line
        && k == key
      {
        #[cfg(feature = "tracing")]
        trace!("Replacing value of {}", key);

        return Some(std::mem::replace(value, raw_value));
      }
    }
    None
  }

  /// Removes the first entry with this key, taking its whole line with it.
  /// Returns false when the key is absent.
  pub fn remove(&mut self, key: &str) -> bool {
    let position = self
      .lines
      .iter()
      .position(|line| matches!(line, Line::Entry { key: k, .. } if k == key));

    match position {
      Some(index) => {
        self.lines.remove(index);
        true
      }
      None => false,
    }
  }
}

/// Serializes a value for storage: wrapped in double quotes, with `\` and `"`
/// escaped, when it contains a space or a double quote. Shell-style quoting,
/// not JSON.
pub fn format_value(value: &str) -> String {
  if !value.contains(' ') && !value.contains('"') {
    return value.to_string();
  }

  let mut quoted = String::with_capacity(value.len() + 2);
  quoted.push('"');
  for c in value.chars() {
    if c == '"' || c == '\\' {
      quoted.push('\\');
    }
    quoted.push(c);
  }
  quoted.push('"');
  quoted
}

/// Reads a stored value back: trims surrounding whitespace, strips one layer
/// of matching double or single quotes and unescapes backslash sequences.
/// Always returns a string; `8080` stays `"8080"`.
pub fn parse_value(raw: &str) -> String {
  let trimmed = raw.trim();

  let quoted = trimmed.len() >= 2
    && (trimmed.starts_with('"') && trimmed.ends_with('"')
      || trimmed.starts_with('\'') && trimmed.ends_with('\''));

  if !quoted {
    return trimmed.to_string();
  }

  let inner = &trimmed[1..trimmed.len() - 1];
  let mut value = String::with_capacity(inner.len());
  let mut chars = inner.chars();
  while let Some(c) = chars.next() {
    if c == '\\' {
      match chars.next() {
        Some(escaped) => value.push(escaped),
        None => value.push('\\'),
      }
    } else {
      value.push(c);
    }
  }
  value
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_simple() {
    let doc = Document::parse("KEY=value\nANOTHER=test");

    assert_eq!(doc.lines.len(), 2);
    assert_eq!(doc.get("KEY"), Some("value"));
    assert_eq!(doc.get("ANOTHER"), Some("test"));
  }

  #[test]
  fn test_parse_mixed_lines() {
    let doc = Document::parse("# comment\n\nKEY=value\nnot an entry\n");

    assert_eq!(doc.lines[0], Line::Comment("# comment".to_string()));
    assert_eq!(doc.lines[1], Line::EmptyLine);
    assert_eq!(
      doc.lines[2],
      Line::Entry {
        key: "KEY".to_string(),
        value: "value".to_string(),
      }
    );
    assert_eq!(doc.lines[3], Line::Raw("not an entry".to_string()));
  }

  #[test]
  fn test_roundtrip() {
    let input = "# Comment\nKEY=value\n\nTEST=123\nweird line\n";
    let doc = Document::parse(input);

    assert_eq!(doc.to_string(), input);
  }

  #[test]
  fn test_value_is_rest_of_line() {
    // Only the first '=' splits; '#' after it belongs to the value.
    let doc = Document::parse("URL=https://example.com?a=1#frag");
    assert_eq!(doc.get("URL"), Some("https://example.com?a=1#frag"));
  }

  #[test]
  fn test_get_first_occurrence_entries_last_wins() {
    let doc = Document::parse("A=1\nB=2\nA=3");

    assert_eq!(doc.get("A"), Some("1"));

    let entries = doc.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0], ("A".to_string(), "3".to_string()));
    assert_eq!(entries[1], ("B".to_string(), "2".to_string()));
  }

  #[test]
  fn test_set_replaces_in_place() {
    let mut doc = Document::parse("A=1\nB=2");

    assert_eq!(doc.set("A", "9".to_string()), Some("1".to_string()));
    assert_eq!(doc.to_string(), "A=9\nB=2\n");
  }

  #[test]
  fn test_set_appends_at_end() {
    let mut doc = Document::parse("A=1");

    assert_eq!(doc.set("B", "2".to_string()), None);
    assert_eq!(doc.to_string(), "A=1\nB=2\n");
  }

  #[test]
  fn test_replace_absent_key_is_untouched() {
    let mut doc = Document::parse("A=1");

    assert_eq!(doc.replace("B", "2".to_string()), None);
    assert_eq!(doc.to_string(), "A=1\n");
  }

  #[test]
  fn test_remove_takes_whole_line() {
    let mut doc = Document::parse("A=1\nB=2\nC=3");

    assert!(doc.remove("B"));
    assert_eq!(doc.to_string(), "A=1\nC=3\n");
    assert!(!doc.remove("B"));
  }

  #[test]
  fn test_format_value_plain() {
    assert_eq!(format_value("simple"), "simple");
    assert_eq!(format_value("8080"), "8080");
    assert_eq!(format_value(""), "");
    assert_eq!(format_value("C:\\path"), "C:\\path");
  }

  #[test]
  fn test_format_value_quoted() {
    assert_eq!(format_value("two words"), "\"two words\"");
    assert_eq!(format_value("say \"hi\""), "\"say \\\"hi\\\"\"");
    assert_eq!(format_value("a\\ b"), "\"a\\\\ b\"");
  }

  #[test]
  fn test_parse_value_unquotes() {
    assert_eq!(parse_value("plain"), "plain");
    assert_eq!(parse_value("  padded  "), "padded");
    assert_eq!(parse_value("\"two words\""), "two words");
    assert_eq!(parse_value("'single quoted'"), "single quoted");
    assert_eq!(parse_value("\"say \\\"hi\\\"\""), "say \"hi\"");
  }

  #[test]
  fn test_format_parse_roundtrip() {
    for value in [
      "simple",
      "two words",
      "say \"hi\"",
      "a\\ b",
      "https://example.com/path with spaces",
      "",
    ] {
      assert_eq!(parse_value(&format_value(value)), value);
    }
  }
}
