//! Client settings: an optional TOML file layered under `PLACEMENT_*`
//! environment variables, with command-line flags applied last.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use placement_core::status::TerminalPolicy;
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "placement.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
  /// Base URL of the placement API; requests go to `{api_url}/api/...`.
  pub api_url:              String,
  pub store_path:           PathBuf,
  /// Whether an accepted record may later be rejected and vice versa.
  pub terminal_policy:      TerminalPolicy,
  pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
  fn default() -> Self {
    Self {
      api_url:              "http://localhost:3000".to_string(),
      store_path:           PathBuf::from("~/.local/share/placement/store.db"),
      terminal_policy:      TerminalPolicy::default(),
      request_timeout_secs: 10,
    }
  }
}

impl ClientSettings {
  /// Read `file` (required when given, otherwise `placement.toml` if it
  /// exists) and the environment.
  pub fn load(file: Option<&Path>) -> anyhow::Result<Self> {
    let source = match file {
      Some(path) => config::File::from(path).required(true),
      None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let settings: Self = config::Config::builder()
      .add_source(source)
      .add_source(config::Environment::with_prefix("PLACEMENT"))
      .build()
      .context("failed to read settings")?
      .try_deserialize()
      .context("failed to deserialise ClientSettings")?;

    Ok(Self { store_path: expand_tilde(&settings.store_path), ..settings })
  }

  pub fn with_overrides(
    mut self,
    api_url: Option<String>,
    store_path: Option<PathBuf>,
  ) -> Self {
    if let Some(url) = api_url {
      self.api_url = url;
    }
    if let Some(path) = store_path {
      self.store_path = expand_tilde(&path);
    }
    self
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn file_values_override_defaults() {
    let path = std::env::temp_dir()
      .join(format!("placement-settings-{}.toml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "api_url = \"http://api.test\"").unwrap();
    writeln!(file, "terminal_policy = \"reversible\"").unwrap();
    writeln!(file, "store_path = \"/tmp/placement.db\"").unwrap();
    drop(file);

    let settings = ClientSettings::load(Some(&path)).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(settings.api_url, "http://api.test");
    assert_eq!(settings.terminal_policy, TerminalPolicy::Reversible);
    assert_eq!(settings.store_path, PathBuf::from("/tmp/placement.db"));
    assert_eq!(settings.request_timeout_secs, 10);
  }

  #[test]
  fn missing_explicit_file_is_an_error() {
    let path = Path::new("/definitely/not/here/placement.toml");
    assert!(ClientSettings::load(Some(path)).is_err());
  }

  #[test]
  fn flags_override_loaded_settings() {
    let settings = ClientSettings::default()
      .with_overrides(Some("http://flag.test".into()), None);
    assert_eq!(settings.api_url, "http://flag.test");
    assert_eq!(settings.terminal_policy, TerminalPolicy::Locked);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/store.db")),
      PathBuf::from(home).join("store.db")
    );
    assert_eq!(expand_tilde(Path::new("/abs")), PathBuf::from("/abs"));
  }
}
