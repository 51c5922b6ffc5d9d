use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::info;

use crate::app::{App, AppMode};

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return;
  }

  match app.mode {
    AppMode::Confirm => handle_confirm_key(app, key),
    AppMode::Running => {
      if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
        app.should_quit = true;
      }
    }
    AppMode::Ready => handle_list_key(app, key),
  }
}

fn handle_confirm_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm(true),
    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.confirm(false),
    _ => {}
  }
}

fn handle_list_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => app.select_next(),
    KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
    KeyCode::Home | KeyCode::Char('g') => {
      app.select(0);
    }
    KeyCode::End | KeyCode::Char('G') => {
      if let Some(last) = app.rows().len().checked_sub(1) {
        app.select(last);
      }
    }
    KeyCode::Enter | KeyCode::Char('s') => {
      if let Some(row) = app.selected_row() {
        let (url, title) = (row.search_url.clone(), row.title.clone());
        match open_url(app.config.open_command.as_deref(), &url) {
          Ok(()) => {
            info!(url = %url, "input: opened search");
            app.set_info(format!("Searching '{}' in browser", title));
          }
          Err(e) => app.set_error(format!("Failed to open browser: {}", e)),
        }
      }
    }
    KeyCode::Esc | KeyCode::Char('q') => app.should_quit = true,
    _ => {}
  }
}

/// Open `url` with the configured command, or the platform default.
pub fn open_url(command: Option<&str>, url: &str) -> std::io::Result<()> {
  #[cfg(target_os = "macos")]
  let default = "open";
  #[cfg(not(target_os = "macos"))]
  let default = "xdg-open";

  let mut child = std::process::Command::new(command.unwrap_or(default))
    .arg(url)
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()?;
  // Reap the child in a background thread to avoid zombie processes.
  std::thread::spawn(move || {
    let _ = child.wait();
  });
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn open_url_reports_missing_command() {
    assert!(open_url(Some("/nonexistent/ytchapters-open"), "https://example.com").is_err());
  }
}
