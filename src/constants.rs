//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!`, parsed once on first access
//! via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Description expansion
  pub expand_poll_interval_ms: u64,
  pub expand_max_attempts: u32,
  pub settle_delay_ms: u64,

  // YouTube
  pub youtube_page_pattern: String,
  pub watch_url_prefix: String,
  pub search_url_prefix: String,

  // Chromium / DevTools
  pub browser_request_timeout_secs: u64,
  pub attach_settle_ms: u64,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time and covered by the tests below.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

/// Delays and bounds used by one extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
  /// Pause before each probe for the expand control.
  pub poll_interval: Duration,
  /// Probes made before giving up on the expand control.
  pub max_attempts: u32,
  /// Pause between expansion and reading the content.
  pub settle_delay: Duration,
}

impl Timing {
  pub fn from_constants() -> Self {
    let c = constants();
    Self {
      poll_interval: Duration::from_millis(c.expand_poll_interval_ms),
      max_attempts: c.expand_max_attempts,
      settle_delay: Duration::from_millis(c.settle_delay_ms),
    }
  }

  /// Same bound, no waiting. Used for static snapshots where nothing renders.
  pub fn immediate() -> Self {
    Self { poll_interval: Duration::ZERO, settle_delay: Duration::ZERO, ..Self::from_constants() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert_eq!(c.expand_poll_interval_ms, 500);
    assert_eq!(c.expand_max_attempts, 22);
    assert_eq!(c.settle_delay_ms, 1500);
    assert!(c.search_url_prefix.ends_with("search_query="));
  }

  #[test]
  fn immediate_timing_keeps_bound() {
    let t = Timing::immediate();
    assert_eq!(t.poll_interval, Duration::ZERO);
    assert_eq!(t.settle_delay, Duration::ZERO);
    assert_eq!(t.max_attempts, Timing::from_constants().max_attempts);
  }
}
