use anyhow::{Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::constants::constants;

static YOUTUBE_PAGE: LazyLock<Regex> = LazyLock::new(|| {
  // Safety: the pattern comes from the embedded constants file and is covered by tests.
  Regex::new(&constants().youtube_page_pattern).expect("youtube_page_pattern must be a valid regex")
});

/// Opaque key for the page under inspection: its address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageIdentity(String);

impl PageIdentity {
  pub fn new(address: impl Into<String>) -> Self {
    Self(address.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Whether the address is a YouTube page the extractor knows how to read.
  pub fn is_youtube_page(&self) -> bool {
    YOUTUBE_PAGE.is_match(&self.0)
  }
}

impl fmt::Display for PageIdentity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A bare YouTube video id, e.g. `dQw4w9WgXcQ`.
fn is_video_id(s: &str) -> bool {
  s.len() == 11 && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Resolve a user-supplied link. Full `http(s)` addresses are kept verbatim so the
/// cache key matches the address the browser reports; bare video ids become watch URLs.
pub fn resolve_link(input: &str) -> Result<PageIdentity> {
  let trimmed = input.trim();
  if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
    return Ok(PageIdentity::new(trimmed));
  }
  if is_video_id(trimmed) {
    return Ok(PageIdentity::new(format!("{}{}", constants().watch_url_prefix, trimmed)));
  }
  Err(anyhow!("Not a link or video id: '{}'", trimmed))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detects_youtube_pages() {
    assert!(PageIdentity::new("https://www.youtube.com/watch?v=dQw4w9WgXcQ").is_youtube_page());
    assert!(PageIdentity::new("https://youtube.com/watch?v=dQw4w9WgXcQ").is_youtube_page());
    assert!(!PageIdentity::new("http://www.youtube.com/watch?v=dQw4w9WgXcQ").is_youtube_page());
    assert!(!PageIdentity::new("https://example.com/youtube.com/").is_youtube_page());
    assert!(!PageIdentity::new("https://youtu.be/dQw4w9WgXcQ").is_youtube_page());
  }

  #[test]
  fn resolve_link_keeps_full_urls() {
    let id = resolve_link("  https://www.youtube.com/watch?v=abc&t=10s ").unwrap();
    assert_eq!(id.as_str(), "https://www.youtube.com/watch?v=abc&t=10s");
  }

  #[test]
  fn resolve_link_expands_video_ids() {
    let id = resolve_link("dQw4w9WgXcQ").unwrap();
    assert_eq!(id.as_str(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
  }

  #[test]
  fn resolve_link_rejects_other_text() {
    assert!(resolve_link("lofi hip hop").is_err());
    assert!(resolve_link("").is_err());
    assert!(resolve_link("short").is_err());
  }
}
