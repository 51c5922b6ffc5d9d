use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// User preferences stored in `prefs.toml` under the platform config dir.
#[derive(Serialize, Deserialize, Default, Debug)]
pub struct Config {
  pub theme_name: Option<String>,
  /// Command used to open search results, e.g. `firefox`. Defaults to `open`/`xdg-open`.
  pub open_command: Option<String>,
  /// DevTools endpoint of a running browser, e.g. `http://127.0.0.1:9222`.
  pub remote_debugging_url: Option<String>,
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "ytchapters") {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file)
        && let Ok(config) = toml::from_str(&content)
      {
        return config;
      }
    }
    Self::default()
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "ytchapters") {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          let _ = std::fs::write(config_file, content);
        }
      }
    }
  }
}
