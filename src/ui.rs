use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, AppMode};
use crate::presenter::View;
use crate::theme::Theme;

// --- Helpers ---

/// Display width of a string (accounting for double-width CJK).
fn display_width(s: &str) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` columns, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  use unicode_width::UnicodeWidthChar;
  if display_width(s) <= max_width {
    return s.to_string();
  }
  let mut out = String::new();
  let mut used = 0;
  for c in s.chars() {
    let w = c.width().unwrap_or(0);
    if used + w + 1 > max_width {
      break;
    }
    out.push(c);
    used += w;
  }
  format!("{}…", out)
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, footer_area] =
    Layout::vertical([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)])
      .areas(frame.area());

  render_header(frame, app, header_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let left = Line::from(vec![
    Span::styled(" ▶ ytchapters ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    Span::styled(
      truncate_str(app.request.identity.as_str(), area.width.saturating_sub(30) as usize),
      Style::default().fg(theme.muted),
    ),
  ]);
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  if matches!(app.view, View::Chapters(_)) {
    render_chapters(frame, app, area);
  } else {
    render_message(frame, app, area);
  }
}

fn render_message(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let View::Message(message) = &app.view else { return };

  let mut text = vec![Line::from(""), Line::from(Span::styled(message.as_str(), Style::default().fg(theme.fg)))];
  if app.mode == AppMode::Confirm {
    text.push(Line::from(""));
    text.push(Line::from(Span::styled("Press y to run, n to cancel.", Style::default().fg(theme.muted))));
  }

  let paragraph = Paragraph::new(text).alignment(Alignment::Center).wrap(Wrap { trim: true }).block(
    Block::bordered()
      .border_type(ratatui::widgets::BorderType::Rounded)
      .border_style(Style::default().fg(theme.border)),
  );
  frame.render_widget(paragraph, area);
}

fn render_chapters(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;
  let badge_w = app.rows().iter().map(|r| r.timestamp.len()).max().unwrap_or(0) + 2;

  let items: Vec<ListItem> = app
    .rows()
    .iter()
    .enumerate()
    .map(|(i, row)| {
      let is_selected = Some(i) == app.list_state.selected();
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let bg = if is_selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };

      let badge = format!(" {:>width$} ", row.timestamp, width = badge_w - 2);
      let title = truncate_str(&row.title, inner_w.saturating_sub(badge_w + 1));
      let line = Line::from(vec![
        Span::styled(badge, Style::default().fg(theme.badge_fg).bg(theme.badge_bg)),
        Span::raw(" "),
        Span::styled(title, Style::default().fg(fg)),
      ]);
      ListItem::new(line).bg(bg)
    })
    .collect();

  let title = format!(" Chapters — {} ", items.len());
  let list = List::new(items)
    .block(
      Block::bordered()
        .title(title)
        .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
        .border_type(ratatui::widgets::BorderType::Rounded)
        .border_style(Style::default().fg(theme.border)),
    )
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ℹ {}", info), Style::default().fg(theme.muted))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Confirm => vec![("y", "Run"), ("n", "Cancel"), ("^t", "Theme")],
    AppMode::Running => vec![("^t", "Theme"), ("Esc", "Quit")],
    AppMode::Ready if app.rows().is_empty() => vec![("^t", "Theme"), ("Esc", "Quit")],
    AppMode::Ready => vec![("Enter", "Search"), ("j/k", "Navigate"), ("^t", "Theme"), ("Esc", "Quit")],
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}
