use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub muted: Color,
  pub accent: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub badge_fg: Color,
  pub badge_bg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub const THEMES: [Theme; 3] = [
  Theme {
    name: "Night",
    bg: Color::Rgb(24, 24, 32),
    fg: Color::Rgb(220, 220, 230),
    muted: Color::Rgb(120, 120, 140),
    accent: Color::Rgb(255, 85, 85),
    border: Color::Rgb(70, 70, 90),
    highlight_fg: Color::Rgb(24, 24, 32),
    highlight_bg: Color::Rgb(255, 85, 85),
    stripe_bg: Color::Rgb(30, 30, 40),
    badge_fg: Color::Rgb(24, 24, 32),
    badge_bg: Color::Rgb(110, 160, 255),
    status: Color::Rgb(240, 200, 90),
    error: Color::Rgb(255, 110, 110),
    key_fg: Color::Rgb(24, 24, 32),
    key_bg: Color::Rgb(120, 120, 140),
  },
  Theme {
    name: "Paper",
    bg: Color::Rgb(250, 248, 240),
    fg: Color::Rgb(40, 40, 40),
    muted: Color::Rgb(130, 125, 115),
    accent: Color::Rgb(200, 30, 30),
    border: Color::Rgb(200, 195, 180),
    highlight_fg: Color::Rgb(250, 248, 240),
    highlight_bg: Color::Rgb(200, 30, 30),
    stripe_bg: Color::Rgb(242, 239, 228),
    badge_fg: Color::Rgb(250, 248, 240),
    badge_bg: Color::Rgb(13, 110, 253),
    status: Color::Rgb(170, 120, 0),
    error: Color::Rgb(190, 20, 20),
    key_fg: Color::Rgb(250, 248, 240),
    key_bg: Color::Rgb(130, 125, 115),
  },
  Theme {
    name: "Terminal",
    bg: Color::Reset,
    fg: Color::White,
    muted: Color::DarkGray,
    accent: Color::Red,
    border: Color::DarkGray,
    highlight_fg: Color::Black,
    highlight_bg: Color::Red,
    stripe_bg: Color::Reset,
    badge_fg: Color::Black,
    badge_bg: Color::Blue,
    status: Color::Yellow,
    error: Color::LightRed,
    key_fg: Color::Black,
    key_bg: Color::Gray,
  },
];

/// Index of the theme called `name`, ignoring case. Unknown names fall back to the first theme.
pub fn index_of(name: &str) -> usize {
  THEMES.iter().position(|t| t.name.eq_ignore_ascii_case(name)).unwrap_or(0)
}
