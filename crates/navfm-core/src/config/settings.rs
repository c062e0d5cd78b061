//! Application configuration loaded from a TOML file.
//!
//! Every field has a default, so an empty (or absent) file gives the same
//! behaviour as no configuration at all.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::icon::favicon::DEFAULT_CANDIDATES;
use crate::nav::filter::{SortDirection, SortField, ViewPreferences};

/// Top-level application configuration.
///
/// Call [`Config::load`] to read from a TOML path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub icons: IconConfig,
    #[serde(default)]
    pub drives: DrivesConfig,
}

impl Config {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::PermissionDenied`] if the file is not readable.
    /// - [`CoreError::ConfigParse`] if the TOML is malformed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => CoreError::PermissionDenied(path.to_path_buf()),
            _ => CoreError::Io(e),
        })?;
        toml::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))
    }
}

/// Initial listing presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub sort_field: SortField,
    #[serde(default)]
    pub sort_direction: SortDirection,
    #[serde(default)]
    pub group_directories_first: bool,
    #[serde(default)]
    pub show_hidden: bool,
    #[serde(default = "default_hidden_extensions")]
    pub hide_known_extensions: Vec<String>,
    #[serde(default = "default_true")]
    pub hide_extensions_enabled: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            sort_field: SortField::Name,
            sort_direction: SortDirection::Ascending,
            group_directories_first: false,
            show_hidden: false,
            hide_known_extensions: default_hidden_extensions(),
            hide_extensions_enabled: true,
        }
    }
}

impl ViewConfig {
    /// The starting [`ViewPreferences`]. Extensions are lowercased and any
    /// leading dot is dropped.
    pub fn preferences(&self) -> ViewPreferences {
        ViewPreferences {
            sort_field: self.sort_field,
            sort_direction: self.sort_direction,
            group_directories_first: self.group_directories_first,
            show_hidden: self.show_hidden,
            hide_known_extensions: normalize_extensions(&self.hide_known_extensions),
            hide_extensions: self.hide_extensions_enabled,
        }
    }
}

/// Icon resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IconConfig {
    /// Upper bound for each favicon request.
    #[serde(default = "default_favicon_timeout_ms")]
    pub favicon_timeout_ms: u64,
    /// Paths tried against a site's origin, in order.
    #[serde(default = "default_favicon_candidates")]
    pub favicon_candidates: Vec<String>,
    /// File extensions whose icon is looked up per file rather than per type.
    #[serde(default = "default_hidden_extensions")]
    pub native_icon_extensions: Vec<String>,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            favicon_timeout_ms: default_favicon_timeout_ms(),
            favicon_candidates: default_favicon_candidates(),
            native_icon_extensions: default_hidden_extensions(),
        }
    }
}

impl IconConfig {
    pub fn favicon_timeout(&self) -> Duration {
        Duration::from_millis(self.favicon_timeout_ms)
    }
}

/// Storage root polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrivesConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for DrivesConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl DrivesConfig {
    /// The poll interval, never shorter than one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

pub(crate) fn normalize_extensions(list: &[String]) -> std::collections::BTreeSet<String> {
    list.iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_hidden_extensions() -> Vec<String> {
    vec!["lnk".to_string(), "url".to_string(), "exe".to_string()]
}

fn default_favicon_timeout_ms() -> u64 {
    3000
}

fn default_favicon_candidates() -> Vec<String> {
    DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect()
}

fn default_poll_interval_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_config_view() {
        let config = Config::default();

        assert_eq!(config.view.sort_field, SortField::Name);
        assert_eq!(config.view.sort_direction, SortDirection::Ascending);
        assert!(!config.view.group_directories_first);
        assert!(!config.view.show_hidden);
        assert!(config.view.hide_extensions_enabled);
        assert_eq!(config.view.hide_known_extensions, vec!["lnk", "url", "exe"]);
    }

    #[test]
    fn default_config_icons_and_drives() {
        let config = Config::default();

        assert_eq!(config.icons.favicon_timeout(), Duration::from_secs(3));
        assert_eq!(config.icons.favicon_candidates[0], "favicon.ico");
        assert_eq!(config.icons.favicon_candidates.len(), 5);
        assert_eq!(config.drives.poll_interval(), Duration::from_secs(10));
    }

    #[test]
    fn default_preferences_match_view_defaults() {
        assert_eq!(Config::default().view.preferences(), ViewPreferences::default());
    }

    #[test]
    fn load_full_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[view]
sort_field = "modified"
sort_direction = "descending"
group_directories_first = true
show_hidden = true
hide_known_extensions = [".LNK", "txt"]
hide_extensions_enabled = false

[icons]
favicon_timeout_ms = 500
favicon_candidates = ["icon.svg"]
native_icon_extensions = ["lnk"]

[drives]
poll_interval_secs = 30
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        let prefs = config.view.preferences();

        assert_eq!(prefs.sort_field, SortField::Date);
        assert_eq!(prefs.sort_direction, SortDirection::Descending);
        assert!(prefs.group_directories_first);
        assert!(prefs.show_hidden);
        assert!(!prefs.hide_extensions);
        assert_eq!(
            prefs.hide_known_extensions.into_iter().collect::<Vec<_>>(),
            vec!["lnk", "txt"]
        );

        assert_eq!(config.icons.favicon_timeout(), Duration::from_millis(500));
        assert_eq!(config.icons.favicon_candidates, vec!["icon.svg"]);
        assert_eq!(config.icons.native_icon_extensions, vec!["lnk"]);
        assert_eq!(config.drives.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn load_partial_toml_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[view]
show_hidden = true
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();

        assert!(config.view.show_hidden);
        assert_eq!(config.view.sort_field, SortField::Name);
        assert!(config.view.hide_extensions_enabled);
        assert_eq!(config.icons.favicon_timeout_ms, 3000);
        assert_eq!(config.drives.poll_interval_secs, 10);
    }

    #[test]
    fn load_empty_toml_uses_all_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        let default = Config::default();

        assert_eq!(config.view.preferences(), default.view.preferences());
        assert_eq!(config.icons.favicon_candidates, default.icons.favicon_candidates);
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let drives = DrivesConfig {
            poll_interval_secs: 0,
        };
        assert_eq!(drives.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn unknown_sort_field_is_config_parse() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[view]\nsort_field = \"colour\"\n").unwrap();

        assert!(matches!(
            Config::load(&path).unwrap_err(),
            CoreError::ConfigParse(_)
        ));
    }

    #[test]
    fn load_nonexistent_returns_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = Config::load(&tmp.path().join("nonexistent.toml"));
        assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
    }

    #[test]
    fn load_invalid_toml_returns_config_parse() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "this is not valid [[[toml").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result.unwrap_err(), CoreError::ConfigParse(_)));
    }
}
