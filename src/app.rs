use ratatui::widgets::ListState;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

use crate::cache::Store;
use crate::chapters::ExtractionResult;
use crate::config::Config;
use crate::page::PageSession;
use crate::pipeline::{Admission, ChapterPipeline, ExtractError, Progress, Request};
use crate::presenter::{self, ChapterRow, View};
use crate::theme::{self, THEMES};

// --- Types ---

pub type SharedPipeline = Arc<ChapterPipeline<Box<dyn Store>>>;
pub type ExtractOutcome = Result<ExtractionResult, ExtractError>;

const ERROR_TTL: Duration = Duration::from_secs(5);
const INFO_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  /// Waiting for the user to approve extraction on a detected page.
  Confirm,
  /// Extraction task in flight.
  Running,
  /// Showing the final view.
  Ready,
}

/// In-flight extraction task receivers.
pub(crate) struct ExtractTask {
  result_rx: oneshot::Receiver<ExtractOutcome>,
  progress_rx: mpsc::UnboundedReceiver<Progress>,
}

pub struct App {
  pub mode: AppMode,
  pub request: Request,
  pub view: View,
  pub list_state: ListState,
  pub theme_index: usize,
  pub status_message: Option<String>,
  /// Informational message, lower priority than status/error.
  pub info_message: Option<String>,
  pub last_error: Option<String>,
  pub should_quit: bool,
  pub config: Config,
  pipeline: SharedPipeline,
  /// Handed to the extraction task when it starts.
  session: Option<Box<dyn PageSession>>,
  task: Option<ExtractTask>,
  /// When the last error was set, for auto-dismiss.
  error_time: Option<Instant>,
  info_time: Option<Instant>,
}

impl App {
  pub fn new(request: Request, session: Box<dyn PageSession>, pipeline: SharedPipeline, config: Config) -> Self {
    let theme_index = config.theme_name.as_deref().map(theme::index_of).unwrap_or(0);
    Self {
      mode: AppMode::Running,
      request,
      view: View::message(presenter::CHECKING),
      list_state: ListState::default(),
      theme_index,
      status_message: Some(presenter::CHECKING.to_string()),
      info_message: None,
      last_error: None,
      should_quit: false,
      config,
      pipeline,
      session: Some(session),
      task: None,
      error_time: None,
      info_time: None,
    }
  }

  pub fn theme(&self) -> &'static theme::Theme {
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  pub fn set_info(&mut self, msg: String) {
    self.info_message = Some(msg);
    self.info_time = Some(Instant::now());
  }

  fn clear_info(&mut self) {
    self.info_message = None;
    self.info_time = None;
  }

  /// Drop errors and info messages that have been on screen long enough.
  pub fn expire_messages(&mut self) {
    if self.error_time.is_some_and(|t| t.elapsed() >= ERROR_TTL) {
      self.clear_error();
    }
    if self.info_time.is_some_and(|t| t.elapsed() >= INFO_TTL) {
      self.clear_info();
    }
  }

  /// Decide what to do with the request: show the cached result, ask, or run.
  pub fn start(&mut self) {
    match self.pipeline.admit(&self.request) {
      Admission::Cached(result) => {
        info!(page = %self.request.identity, "app: showing cached result");
        self.show(presenter::present(&result));
      }
      Admission::Unsupported => self.show(View::message(presenter::NOT_YOUTUBE)),
      Admission::Confirm => {
        self.mode = AppMode::Confirm;
        self.status_message = None;
        self.view = View::message(presenter::CONFIRM);
      }
      Admission::Run => self.trigger_extract(),
    }
  }

  /// Answer the confirmation prompt. Ignored outside `Confirm` mode.
  pub fn confirm(&mut self, accepted: bool) {
    if self.mode != AppMode::Confirm {
      return;
    }
    if accepted {
      self.trigger_extract();
    } else {
      info!(page = %self.request.identity, "app: extraction declined");
      self.show(View::message(presenter::CANCELLED));
    }
  }

  fn show(&mut self, view: View) {
    self.status_message = None;
    self.list_state.select(match &view {
      View::Chapters(rows) if !rows.is_empty() => Some(0),
      _ => None,
    });
    self.view = view;
    self.mode = AppMode::Ready;
  }

  fn trigger_extract(&mut self) {
    let Some(mut session) = self.session.take() else { return };
    self.clear_error();
    self.mode = AppMode::Running;
    self.view = View::message(presenter::RUNNING);
    self.status_message = Some(presenter::RUNNING.to_string());

    let (tx, result_rx) = oneshot::channel();
    let (progress_tx, progress_rx) = mpsc::unbounded_channel();
    let pipeline = Arc::clone(&self.pipeline);
    let identity = self.request.identity.clone();
    tokio::spawn(async move {
      let result = pipeline.extract_with_progress(&identity, session.as_mut(), Some(&progress_tx)).await;
      session.release().await;
      let _ = tx.send(result);
    });
    self.task = Some(ExtractTask { result_rx, progress_rx });
  }

  pub fn check_pending(&mut self) {
    let Some(mut task) = self.task.take() else { return };

    while let Ok(progress) = task.progress_rx.try_recv() {
      self.status_message = Some(match progress {
        Progress::Expansion(outcome) => format!("Click result for See More: {}", outcome),
        Progress::Settling => match self.status_message.take() {
          Some(current) => format!("{}, settling…", current),
          None => "Settling…".to_string(),
        },
        Progress::Extracting => "Reading description…".to_string(),
      });
    }

    match task.result_rx.try_recv() {
      Ok(Ok(result)) => self.show(presenter::present(&result)),
      Ok(Err(e)) => {
        error!(page = %self.request.identity, err = %e, "app: extraction failed");
        self.set_error(format!("{}", e));
        self.show(View::error(&e));
      }
      Err(oneshot::error::TryRecvError::Empty) => {
        self.task = Some(task);
      }
      Err(oneshot::error::TryRecvError::Closed) => {
        self.set_error("Extraction task failed.".to_string());
        self.show(View::error("extraction task failed"));
      }
    }
  }

  /// Release a session that never ran (cache hit, declined, unsupported).
  pub async fn release_session(&mut self) {
    if let Some(mut session) = self.session.take() {
      session.release().await;
    }
  }

  pub fn rows(&self) -> &[ChapterRow] {
    match &self.view {
      View::Chapters(rows) => rows,
      View::Message(_) => &[],
    }
  }

  pub fn selected_row(&self) -> Option<&ChapterRow> {
    self.list_state.selected().and_then(|i| self.rows().get(i))
  }

  /// Move the selection to row `i`; the last search notice no longer applies.
  pub fn select(&mut self, i: usize) {
    if i < self.rows().len() {
      self.list_state.select(Some(i));
      self.clear_info();
    }
  }

  pub fn select_next(&mut self) {
    let count = self.rows().len();
    if count > 0 {
      self.select(self.list_state.selected().map_or(0, |i| (i + 1) % count));
    }
  }

  pub fn select_previous(&mut self) {
    let count = self.rows().len();
    if count > 0 {
      self.select(self.list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 }));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStore;
  use crate::chapters::tests::{description_page, marker, text};
  use crate::constants::Timing;
  use crate::page::fake::ScriptedPage;
  use crate::pipeline::Origin;
  use crate::youtube::PageIdentity;

  const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

  fn pipeline() -> SharedPipeline {
    Arc::new(ChapterPipeline::new(Box::new(MemoryStore::new()) as Box<dyn Store>, Timing::from_constants()))
  }

  fn app_for(origin: Origin, url: &str, pipeline: SharedPipeline) -> App {
    let html = description_page(&format!("{}{}{}{}", marker("0:00"), text("Intro"), marker("1:05"), text("Main")));
    let page = ScriptedPage { control_on_probe: Some(1), ..ScriptedPage::with_html(html) };
    App::new(Request { identity: PageIdentity::new(url), origin }, Box::new(page), pipeline, Config::default())
  }

  async fn settle(app: &mut App) {
    for _ in 0..100 {
      app.check_pending();
      if app.mode == AppMode::Ready {
        return;
      }
      tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("extraction never finished");
  }

  #[tokio::test(start_paused = true)]
  async fn link_runs_extraction_and_lists_chapters() {
    let mut app = app_for(Origin::Link, URL, pipeline());
    app.start();
    assert_eq!(app.mode, AppMode::Running);

    settle(&mut app).await;

    assert_eq!(app.rows().len(), 2);
    assert_eq!(app.selected_row().map(|r| r.title.as_str()), Some("Intro"));
    assert!(app.status_message.is_none());
  }

  #[tokio::test(start_paused = true)]
  async fn active_tab_waits_for_confirmation() {
    let mut app = app_for(Origin::ActiveTab, URL, pipeline());
    app.start();
    assert_eq!(app.mode, AppMode::Confirm);
    assert_eq!(app.view, View::message(presenter::CONFIRM));

    app.confirm(true);
    settle(&mut app).await;
    assert_eq!(app.rows().len(), 2);
  }

  #[tokio::test]
  async fn declining_leaves_cache_empty() {
    let pipeline = pipeline();
    let mut app = app_for(Origin::ActiveTab, URL, Arc::clone(&pipeline));
    app.start();
    app.confirm(false);

    assert_eq!(app.mode, AppMode::Ready);
    assert_eq!(app.view, View::message(presenter::CANCELLED));
    assert_eq!(pipeline.cached(&PageIdentity::new(URL)), None);
    app.release_session().await;
  }

  #[test]
  fn non_youtube_active_tab_is_unsupported() {
    let mut app = app_for(Origin::ActiveTab, "https://example.com/", pipeline());
    app.start();
    assert_eq!(app.mode, AppMode::Ready);
    assert_eq!(app.view, View::message(presenter::NOT_YOUTUBE));
  }

  #[tokio::test(start_paused = true)]
  async fn second_activation_is_served_from_cache() {
    let pipeline = pipeline();
    let mut first = app_for(Origin::Link, URL, Arc::clone(&pipeline));
    first.start();
    settle(&mut first).await;

    let mut second = app_for(Origin::ActiveTab, URL, pipeline);
    second.start();
    // No confirmation, no task: straight from the cache.
    assert_eq!(second.mode, AppMode::Ready);
    assert_eq!(second.view, first.view);
  }

  #[test]
  fn selection_wraps_both_ways() {
    let mut app = app_for(Origin::Link, URL, pipeline());
    app.show(View::Chapters(vec![
      ChapterRow { timestamp: "0:00".into(), title: "A".into(), search_url: "a".into() },
      ChapterRow { timestamp: "1:00".into(), title: "B".into(), search_url: "b".into() },
    ]));
    assert_eq!(app.list_state.selected(), Some(0));
    app.select_previous();
    assert_eq!(app.list_state.selected(), Some(1));
    app.select_next();
    assert_eq!(app.list_state.selected(), Some(0));
  }

  #[test]
  fn search_notice_clears_on_selection_change() {
    let mut app = app_for(Origin::Link, URL, pipeline());
    app.show(View::Chapters(vec![
      ChapterRow { timestamp: "0:00".into(), title: "A".into(), search_url: "a".into() },
      ChapterRow { timestamp: "1:00".into(), title: "B".into(), search_url: "b".into() },
    ]));
    app.set_info("Searching 'A' in browser".to_string());
    app.select_next();
    assert_eq!(app.info_message, None);
  }

  #[tokio::test(start_paused = true)]
  async fn search_notice_expires() {
    let mut app = app_for(Origin::Link, URL, pipeline());
    app.set_info("Searching 'A' in browser".to_string());
    app.expire_messages();
    assert!(app.info_message.is_some());

    tokio::time::sleep(INFO_TTL).await;
    app.expire_messages();
    assert_eq!(app.info_message, None);
  }

  #[tokio::test(start_paused = true)]
  async fn settling_keeps_click_result_visible() {
    let mut app = app_for(Origin::Link, URL, pipeline());
    app.start();
    // Past the first probe and click, before the settle delay ends.
    tokio::time::sleep(Duration::from_millis(600)).await;
    app.check_pending();
    assert_eq!(app.status_message.as_deref(), Some("Click result for See More: clicked, settling…"));
  }

  #[test]
  fn messages_have_no_selection() {
    let mut app = app_for(Origin::Link, URL, pipeline());
    app.show(View::message("nothing"));
    app.select_next();
    assert_eq!(app.selected_row(), None);
  }
}
