//! Access to a page's live content.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

use crate::expand::EXPAND_SELECTOR;

#[derive(Debug, Error)]
pub enum PageError {
  #[error("page not ready: {0}")]
  NotReady(String),
  #[error("page script failed: {0}")]
  Script(String),
  #[error("browser error: {0}")]
  Browser(String),
}

/// The narrow surface the extraction pipeline needs from a page.
#[async_trait]
pub trait PageSession: Send {
  /// Whether the description's "...more" control is currently in the page.
  async fn has_expand_control(&mut self) -> Result<bool, PageError>;

  /// Click the "...more" control once.
  async fn click_expand_control(&mut self) -> Result<(), PageError>;

  /// The page's current HTML.
  async fn content(&mut self) -> Result<String, PageError>;

  /// Give back anything the session opened. Called once the run is over.
  async fn release(&mut self) {}
}

// Safety: built from a literal selector.
static EXPAND: LazyLock<Selector> = LazyLock::new(|| Selector::parse(EXPAND_SELECTOR).expect("expand selector is valid"));
static CANONICAL: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse(r#"link[rel="canonical"]"#).expect("canonical selector is valid"));
static OG_URL: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse(r#"meta[property="og:url"]"#).expect("og:url selector is valid"));

/// A saved copy of a rendered page. Nothing re-renders, so clicking is a no-op.
pub struct HtmlSnapshot {
  html: String,
}

impl HtmlSnapshot {
  pub fn new(html: impl Into<String>) -> Self {
    Self { html: html.into() }
  }
}

#[async_trait]
impl PageSession for HtmlSnapshot {
  async fn has_expand_control(&mut self) -> Result<bool, PageError> {
    Ok(Html::parse_document(&self.html).select(&EXPAND).next().is_some())
  }

  async fn click_expand_control(&mut self) -> Result<(), PageError> {
    debug!("snapshot: expand control present, content is already final");
    Ok(())
  }

  async fn content(&mut self) -> Result<String, PageError> {
    Ok(self.html.clone())
  }
}

/// Address a saved page was captured from: canonical link, then `og:url`.
pub fn snapshot_address(html: &str) -> Option<String> {
  let document = Html::parse_document(html);
  let canonical = document.select(&CANONICAL).next().and_then(|el| el.value().attr("href"));
  let og_url = || document.select(&OG_URL).next().and_then(|el| el.value().attr("content"));
  canonical.or_else(og_url).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// `file://` address for a snapshot with no embedded address.
pub fn file_address(path: &Path) -> String {
  let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
  format!("file://{}", absolute.display())
}
