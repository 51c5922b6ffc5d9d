//! Chapter timestamps as they appear in video descriptions.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// `M:SS`, `MM:SS` or `H:MM:SS`. Digit counts only; `1:99` is accepted.
static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
  // Safety: literal pattern, exercised by the tests below.
  Regex::new(r"^(?:[0-9]{1,2}|[0-9]+:[0-9]{2}):[0-9]{2}$").expect("timestamp pattern is valid")
});

#[derive(Debug, Error, PartialEq, Eq)]
#[error("not a chapter timestamp: {0:?}")]
pub struct InvalidTimestamp(pub String);

/// A validated chapter timestamp, kept in the form it was written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp(String);

impl Timestamp {
  /// Validate `text` as-is. Callers trim first; surrounding whitespace is rejected.
  pub fn parse(text: &str) -> Option<Self> {
    TIMESTAMP.is_match(text).then(|| Self(text.to_string()))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl TryFrom<String> for Timestamp {
  type Error = InvalidTimestamp;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    if TIMESTAMP.is_match(&value) { Ok(Self(value)) } else { Err(InvalidTimestamp(value)) }
  }
}

impl From<Timestamp> for String {
  fn from(ts: Timestamp) -> Self {
    ts.0
  }
}

impl fmt::Display for Timestamp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_minutes_and_hours() {
    for ok in ["0:00", "12:34", "1:23:45", "10:00:00", "123:00:00"] {
      assert!(Timestamp::parse(ok).is_some(), "{ok} should parse");
    }
  }

  #[test]
  fn rejects_malformed() {
    for bad in ["123", "12:3", "12:345", " 1:23", "1:23 ", "123:45", "1:2:34", "a:bc", "", "1:23:4", "１:２３"] {
      assert!(Timestamp::parse(bad).is_none(), "{bad:?} should be rejected");
    }
  }

  #[test]
  fn does_not_range_check_components() {
    assert!(Timestamp::parse("1:99").is_some());
    assert!(Timestamp::parse("1:75:99").is_some());
  }

  #[test]
  fn keeps_source_text() {
    let ts = Timestamp::parse("05:07").unwrap();
    assert_eq!(ts.as_str(), "05:07");
    assert_eq!(ts.to_string(), "05:07");
  }

  #[test]
  fn deserialization_revalidates() {
    let ok: Timestamp = serde_json::from_str("\"1:05\"").unwrap();
    assert_eq!(ok.as_str(), "1:05");
    assert!(serde_json::from_str::<Timestamp>("\"intro\"").is_err());
  }
}
