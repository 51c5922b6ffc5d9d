//! Turning extraction results and status text into something to show.

use crate::chapters::ExtractionResult;
use crate::constants::constants;

pub const CHECKING: &str = "Checking current tab...";
pub const RUNNING: &str = "Running extractor...";
pub const CANCELLED: &str = "Extractor cancelled by user.";
pub const NOT_YOUTUBE: &str = "Not a YouTube page. Open a YouTube video to use extractor.";
pub const CONFIRM: &str = "Detected YouTube page. Run playlist extractor?";
pub const NO_DESCRIPTION: &str = "No description found";
pub const NO_CHAPTERS: &str = "No chapters found in description";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRow {
  pub timestamp: String,
  pub title: String,
  /// Search for the title on YouTube.
  pub search_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
  Message(String),
  Chapters(Vec<ChapterRow>),
}

impl View {
  pub fn message(text: impl Into<String>) -> Self {
    View::Message(text.into())
  }

  pub fn error(err: impl std::fmt::Display) -> Self {
    View::Message(format!("Error: {}", err))
  }

  /// Plain text, one line per row: `0:00 - Intro`.
  pub fn to_lines(&self) -> Vec<String> {
    match self {
      View::Message(text) => vec![text.clone()],
      View::Chapters(rows) => rows.iter().map(|r| format!("{} - {}", r.timestamp, r.title)).collect(),
    }
  }
}

pub fn present(result: &ExtractionResult) -> View {
  match result {
    ExtractionResult::NotFound => View::message(NO_DESCRIPTION),
    ExtractionResult::Chapters(entries) if entries.is_empty() => View::message(NO_CHAPTERS),
    ExtractionResult::Chapters(entries) => View::Chapters(
      entries
        .iter()
        .map(|e| ChapterRow {
          timestamp: e.timestamp.to_string(),
          title: e.title.clone(),
          search_url: search_url(&e.title),
        })
        .collect(),
    ),
  }
}

pub fn search_url(title: &str) -> String {
  format!("{}{}", constants().search_url_prefix, urlencoding::encode(title))
}
