//! Chapter extraction from a rendered video description.
//!
//! YouTube renders the description as one pre-wrap span holding a flat run of
//! inline spans. A chapter marker is a span wrapping a link whose text is a
//! timestamp; the chapter title is the text of the span right after it.

use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

use crate::timestamp::Timestamp;

pub const DESCRIPTION_SELECTOR: &str = "span.yt-core-attributed-string--white-space-pre-wrap";

// Safety: literal selectors, exercised by every extraction test.
static DESCRIPTION: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse(DESCRIPTION_SELECTOR).expect("description selector is valid"));
static SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").expect("span selector is valid"));
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("link selector is valid"));

/// One chapter: where it starts and what it is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterEntry {
  pub timestamp: Timestamp,
  /// Non-empty, single line.
  pub title: String,
}

/// Outcome of a completed extraction run. Both variants are cacheable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "chapters", rename_all = "snake_case")]
pub enum ExtractionResult {
  /// The description was located; entries may be empty.
  Chapters(Vec<ChapterEntry>),
  /// No description container on the page.
  NotFound,
}

/// Extract chapters from the page's current HTML. Read-only.
pub fn extract_chapters(html: &str) -> ExtractionResult {
  let document = Html::parse_document(html);
  let Some(description) = document.select(&DESCRIPTION).next() else {
    debug!("chapters: description container not found");
    return ExtractionResult::NotFound;
  };

  let mut entries = Vec::new();
  let mut segments = 0usize;
  for segment in description.select(&SPAN) {
    let Some(link) = segment.select(&LINK).next() else { continue };
    segments += 1;

    let Some(timestamp) = Timestamp::parse(visible_text(link).trim()) else { continue };
    let Some(next) = segment.next_siblings().find_map(ElementRef::wrap) else { continue };
    if let Some(title) = canonical_title(&visible_text(next)) {
      entries.push(ChapterEntry { timestamp, title });
    }
  }

  debug!(segments, chapters = entries.len(), "chapters: description scanned");
  ExtractionResult::Chapters(entries)
}

/// First line of `text`, trimmed. `None` when nothing is left.
fn canonical_title(text: &str) -> Option<String> {
  let first_line = text.trim().split('\n').next().unwrap_or_default().trim();
  (!first_line.is_empty()).then(|| first_line.to_string())
}

/// Text content of an element with `<br>` rendered as a line break.
fn visible_text(element: ElementRef<'_>) -> String {
  let mut out = String::new();
  for node in element.descendants() {
    match node.value() {
      Node::Text(text) => out.push_str(text),
      Node::Element(el) if el.name() == "br" => out.push('\n'),
      _ => {}
    }
  }
  out
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  /// Wrap inline segments in a description container the way YouTube renders it.
  pub(crate) fn description_page(segments: &str) -> String {
    format!(
      r#"<html><body><div id="description-inline-expander">
<span class="yt-core-attributed-string yt-core-attributed-string--white-space-pre-wrap" dir="auto">{segments}</span>
</div></body></html>"#
    )
  }

  pub(crate) fn marker(ts: &str) -> String {
    format!(r#"<span class="yt-core-attributed-string--link-inherit-color"><a class="yt-core-attributed-string__link" href="/watch?v=abc&amp;t=0s">{ts}</a></span>"#)
  }

  pub(crate) fn text(t: &str) -> String {
    format!(r#"<span class="yt-core-attributed-string--link-inherit-color">{t}</span>"#)
  }

  fn entry(ts: &str, title: &str) -> ChapterEntry {
    ChapterEntry { timestamp: Timestamp::parse(ts).unwrap(), title: title.to_string() }
  }

  #[test]
  fn pairs_markers_with_following_titles() {
    let html = description_page(&format!("{}{}{}{}", marker("0:00"), text(" Intro\n"), marker("1:05"), text("Main\nExtra")));
    assert_eq!(
      extract_chapters(&html),
      ExtractionResult::Chapters(vec![entry("0:00", "Intro"), entry("1:05", "Main")])
    );
  }

  #[test]
  fn non_timestamp_link_is_ignored_with_its_neighbour() {
    let html = description_page(&format!(
      "{}{}{}{}",
      marker("hello"),
      text("Not a chapter"),
      marker("2:00"),
      text("Song A")
    ));
    assert_eq!(extract_chapters(&html), ExtractionResult::Chapters(vec![entry("2:00", "Song A")]));
  }

  #[test]
  fn blank_title_drops_entry() {
    let html = description_page(&format!("{}{}{}{}", marker("0:00"), text("   \n  "), marker("3:10"), text("Outro")));
    assert_eq!(extract_chapters(&html), ExtractionResult::Chapters(vec![entry("3:10", "Outro")]));
  }

  #[test]
  fn marker_without_sibling_drops_entry() {
    let html = description_page(&marker("0:00"));
    assert_eq!(extract_chapters(&html), ExtractionResult::Chapters(vec![]));
  }

  #[test]
  fn link_text_is_trimmed_before_matching() {
    let html = description_page(&format!("{}{}", marker(" 1:23:45 "), text("Long one")));
    assert_eq!(extract_chapters(&html), ExtractionResult::Chapters(vec![entry("1:23:45", "Long one")]));
  }

  #[test]
  fn br_counts_as_line_break_in_titles() {
    let html = description_page(&format!("{}{}", marker("4:20"), text("First<br>Second")));
    assert_eq!(extract_chapters(&html), ExtractionResult::Chapters(vec![entry("4:20", "First")]));
  }

  #[test]
  fn keeps_document_order_and_duplicates() {
    let html = description_page(&format!(
      "{}{}{}{}{}{}",
      marker("5:00"),
      text("Later"),
      marker("0:30"),
      text("Earlier"),
      marker("0:30"),
      text("Earlier")
    ));
    assert_eq!(
      extract_chapters(&html),
      ExtractionResult::Chapters(vec![entry("5:00", "Later"), entry("0:30", "Earlier"), entry("0:30", "Earlier")])
    );
  }

  #[test]
  fn container_without_markers_is_empty_not_missing() {
    let html = description_page(&text("Just a plain description."));
    let result = extract_chapters(&html);
    assert_eq!(result, ExtractionResult::Chapters(vec![]));
    assert_ne!(result, ExtractionResult::NotFound);
  }

  #[test]
  fn missing_container_is_not_found() {
    let html = r#"<html><body><span class="other"><span><a>0:00</a></span><span>Intro</span></span></body></html>"#;
    assert_eq!(extract_chapters(html), ExtractionResult::NotFound);
  }

  #[test]
  fn result_serializes_with_kind_tag() {
    let json = serde_json::to_string(&ExtractionResult::NotFound).unwrap();
    assert_eq!(json, r#"{"kind":"not_found"}"#);
    let back: ExtractionResult =
      serde_json::from_str(r#"{"kind":"chapters","chapters":[{"timestamp":"0:00","title":"Intro"}]}"#).unwrap();
    assert_eq!(back, ExtractionResult::Chapters(vec![entry("0:00", "Intro")]));
  }
}
