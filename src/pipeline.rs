//! Extraction orchestration: cache, expansion, settling, extraction.
//!
//! Every entry point (active tab, pasted link, saved page) goes through the
//! same [`ChapterPipeline`]; they differ only in how the identity and the
//! page session are obtained.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cache::{ResultCache, Store};
use crate::chapters::{ExtractionResult, extract_chapters};
use crate::constants::Timing;
use crate::expand::{ExpandOutcome, wait_for_expansion};
use crate::page::{PageError, PageSession};
use crate::youtube::PageIdentity;

#[derive(Debug, Error)]
pub enum ExtractError {
  #[error("content unavailable: {0}")]
  ContentUnavailable(#[from] PageError),
}

/// Where the request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
  /// Page detected in a running browser; needs the user's confirmation.
  ActiveTab,
  /// Link supplied by the user.
  Link,
  /// Saved HTML file supplied by the user.
  Snapshot,
}

#[derive(Debug, Clone)]
pub struct Request {
  pub identity: PageIdentity,
  pub origin: Origin,
}

/// What to do with a request before touching the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
  Cached(ExtractionResult),
  /// Ask the user first.
  Confirm,
  /// Detected page is not one the extractor can read.
  Unsupported,
  Run,
}

/// Progress of a running extraction, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
  Expansion(ExpandOutcome),
  Settling,
  Extracting,
}

pub struct ChapterPipeline<S> {
  cache: ResultCache<S>,
  timing: Timing,
}

impl<S: Store> ChapterPipeline<S> {
  pub fn new(store: S, timing: Timing) -> Self {
    Self { cache: ResultCache::new(store), timing }
  }

  pub fn cached(&self, identity: &PageIdentity) -> Option<ExtractionResult> {
    self.cache.get(identity)
  }

  pub fn admit(&self, request: &Request) -> Admission {
    if let Some(hit) = self.cached(&request.identity) {
      return Admission::Cached(hit);
    }
    match request.origin {
      Origin::ActiveTab if !request.identity.is_youtube_page() => Admission::Unsupported,
      Origin::ActiveTab => Admission::Confirm,
      Origin::Link | Origin::Snapshot => Admission::Run,
    }
  }

  pub async fn extract<P: PageSession + ?Sized>(
    &self,
    identity: &PageIdentity,
    page: &mut P,
  ) -> Result<ExtractionResult, ExtractError> {
    self.extract_with_progress(identity, page, None).await
  }

  /// Cached result, or a fresh run against `page`. Only completed runs are cached.
  pub async fn extract_with_progress<P: PageSession + ?Sized>(
    &self,
    identity: &PageIdentity,
    page: &mut P,
    progress: Option<&mpsc::UnboundedSender<Progress>>,
  ) -> Result<ExtractionResult, ExtractError> {
    if let Some(hit) = self.cache.get(identity) {
      info!(page = %identity, "pipeline: cache hit");
      return Ok(hit);
    }

    info!(page = %identity, "pipeline: extracting");
    let outcome = wait_for_expansion(page, &self.timing).await?;
    report(progress, Progress::Expansion(outcome));

    report(progress, Progress::Settling);
    tokio::time::sleep(self.timing.settle_delay).await;
    report(progress, Progress::Extracting);

    let html = page.content().await?;
    if html.trim().is_empty() {
      return Err(PageError::NotReady("document is empty".to_string()).into());
    }

    let result = extract_chapters(&html);
    match &result {
      ExtractionResult::Chapters(entries) => info!(page = %identity, chapters = entries.len(), "pipeline: done"),
      ExtractionResult::NotFound => info!(page = %identity, "pipeline: no description on page"),
    }

    if let Err(e) = self.cache.put(identity, &result) {
      warn!(page = %identity, err = %e, "pipeline: failed to cache result");
    }
    Ok(result)
  }
}

fn report(progress: Option<&mpsc::UnboundedSender<Progress>>, event: Progress) {
  if let Some(tx) = progress {
    let _ = tx.send(event);
  }
}
