//! Runtime settings: an optional TOML file layered under `RAPPORT_*`
//! environment variables.
//!
//! ```toml
//! store_path = "~/.local/share/rapport/rapport.db"
//!
//! [owner]
//! phone = "(319) 555-0134"
//! names = ["Sam Owner", "Sam"]
//!
//! [ingest]
//! skip_duplicate_messages = false
//! file_limit = 500
//!
//! [metrics]
//! since = "2020-01-01"
//! ```
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `RAPPORT_OWNER__PHONE`; `RAPPORT_OWNER__NAMES` is comma separated.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use rapport_core::normalize::{normalize_phone, parse_timestamp};
use rapport_import::google_voice::OWNER_DISPLAY_NAME;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub owner:      OwnerSettings,
  #[serde(default)]
  pub ingest:     IngestSettings,
  #[serde(default)]
  pub metrics:    MetricsSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnerSettings {
  /// The owner's phone number in any format.
  pub phone: Option<String>,
  /// Names the owner appears under; people with these names are the owner.
  /// The Google Voice owner name is always included.
  #[serde(default)]
  pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestSettings {
  /// Drop messages whose fingerprint is already stored.
  #[serde(default)]
  pub skip_duplicate_messages: bool,
  /// Cap on the number of files read per Google Voice import.
  pub file_limit:              Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsSettings {
  /// Start of the reciprocity window.
  pub since: Option<String>,
}

fn default_store_path() -> PathBuf { PathBuf::from("rapport.db") }

impl Settings {
  /// Read `file` (if it exists) and the environment.
  pub fn load(file: &Path) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(
        config::Environment::with_prefix("RAPPORT")
          .prefix_separator("_")
          .separator("__")
          .list_separator(",")
          .with_list_parse_key("owner.names")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  /// The store path with a leading `~/` expanded.
  pub fn store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  /// The owner's phone as a Google Voice `tel:+…` id.
  pub fn owner_phone(&self) -> Result<String> {
    let raw = self
      .owner
      .phone
      .as_deref()
      .context("owner.phone must be set to import Google Voice")?;
    normalize_phone(raw).with_context(|| format!("owner.phone {raw:?} is not a phone number"))
  }

  /// Configured owner names plus the name Google Voice gives the owner.
  pub fn owner_names(&self) -> Vec<String> {
    let mut names = self.owner.names.clone();
    if !names.iter().any(|n| n == OWNER_DISPLAY_NAME) {
      names.push(OWNER_DISPLAY_NAME.to_owned());
    }
    names
  }

  /// The reciprocity window start: `override_since` if given, else
  /// `metrics.since`.
  pub fn since(&self, override_since: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    override_since
      .or(self.metrics.since.as_deref())
      .map(|s| parse_timestamp(s).with_context(|| format!("invalid date {s:?}")))
      .transpose()
  }
}

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
  use super::*;

  fn from_toml(toml: &str) -> Settings {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rapport.toml");
    std::fs::write(&path, toml).unwrap();
    Settings::load(&path).unwrap()
  }

  #[test]
  fn file_values_are_read() {
    let settings = from_toml(
      r#"
store_path = "/tmp/r.db"

[owner]
phone = "(319) 555-0134"
names = ["Sam Owner"]

[ingest]
skip_duplicate_messages = true
"#,
    );
    assert_eq!(settings.store_path(), PathBuf::from("/tmp/r.db"));
    assert_eq!(settings.owner.names, vec!["Sam Owner"]);
    assert_eq!(settings.owner_names(), vec!["Sam Owner", "Me"]);
    assert_eq!(settings.owner_phone().unwrap(), "tel:+13195550134");
    assert!(settings.ingest.skip_duplicate_messages);
    assert_eq!(settings.ingest.file_limit, None);
  }

  #[test]
  fn missing_file_gives_defaults() {
    let settings = Settings::load(Path::new("/nonexistent/rapport.toml")).unwrap();
    assert_eq!(settings.store_path, PathBuf::from("rapport.db"));
    assert!(settings.owner_phone().is_err());
    assert_eq!(settings.owner_names(), vec!["Me"]);
    assert_eq!(settings.since(None).unwrap(), None);
  }

  #[test]
  fn since_override_wins() {
    let settings = from_toml("[metrics]\nsince = \"2020-01-01\"\n");
    let from_file = settings.since(None).unwrap().unwrap();
    assert_eq!(from_file.to_rfc3339(), "2020-01-01T00:00:00+00:00");

    let overridden = settings.since(Some("2021-06-01")).unwrap().unwrap();
    assert_eq!(overridden.to_rfc3339(), "2021-06-01T00:00:00+00:00");
    assert!(settings.since(Some("soon")).is_err());
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/r.db")), PathBuf::from(home).join("r.db"));
    assert_eq!(expand_tilde(Path::new("/abs/r.db")), PathBuf::from("/abs/r.db"));
  }
}
