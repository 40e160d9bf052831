//! Configuration for the session logger
//!
//! Settings are a flat, case-insensitive key/value view over an external source
//! (a TOML or JSON file, or values supplied by the host). Nested tables are
//! flattened into dotted keys, so `[LogFiles] Folder = "..."` is read as
//! `LogFiles.Folder`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Key holding the log directory
pub const FOLDER_KEY: &str = "LogFiles.Folder";

/// Key holding the log file lifespan in months
pub const LIFESPAN_KEY: &str = "LogFiles.Lifespan";

/// Directory name used under the current directory when no folder is configured
pub const DEFAULT_LOG_DIR_NAME: &str = "log";

/// Raw value as found in a settings file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SettingValue {
    Table(BTreeMap<String, SettingValue>),
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Other(serde::de::IgnoredAny),
}

/// Case-insensitive key/value settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Values keyed by lowercased dotted key
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Create empty settings (every lookup falls back to defaults)
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Insert or replace a value
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    /// Look up a value, ignoring key case
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }

    /// Whether no keys are stored
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Load settings from a `.toml` or `.json` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Load settings from a file if it exists, otherwise return empty settings
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: BTreeMap<String, SettingValue> =
            toml::from_str(content).context("Failed to parse TOML settings")?;
        Ok(Self::from_table(table))
    }

    /// Parse settings from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let table: BTreeMap<String, SettingValue> =
            serde_json::from_str(content).context("Failed to parse JSON settings")?;
        Ok(Self::from_table(table))
    }

    fn from_table(table: BTreeMap<String, SettingValue>) -> Self {
        let mut settings = Self::default();
        flatten_into(&mut settings, "", table);
        settings
    }

    /// Resolve the log directory
    ///
    /// Uses `LogFiles.Folder` when set and non-empty, otherwise `<cwd>/log`.
    pub fn log_directory(&self) -> std::io::Result<PathBuf> {
        if let Some(folder) = self.get(FOLDER_KEY).map(str::trim) {
            if !folder.is_empty() {
                return Ok(PathBuf::from(shellexpand::tilde(folder).into_owned()));
            }
        }
        default_log_dir()
    }

    /// Resolve the retention policy from `LogFiles.Lifespan`
    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy::parse(self.get(LIFESPAN_KEY))
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

fn flatten_into(settings: &mut Settings, prefix: &str, table: BTreeMap<String, SettingValue>) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            SettingValue::Table(nested) => flatten_into(settings, &full_key, nested),
            SettingValue::Text(s) => settings.set(&full_key, s),
            SettingValue::Integer(i) => settings.set(&full_key, i.to_string()),
            SettingValue::Float(f) => settings.set(&full_key, f.to_string()),
            SettingValue::Bool(b) => settings.set(&full_key, b.to_string()),
            SettingValue::Other(_) => {}
        }
    }
}

/// The default log directory, `<cwd>/log`
pub fn default_log_dir() -> std::io::Result<PathBuf> {
    Ok(std::env::current_dir()?.join(DEFAULT_LOG_DIR_NAME))
}

/// How long log files are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Lifespan in months; `None` disables retention
    lifespan_months: Option<u32>,
}

impl RetentionPolicy {
    /// Retention disabled
    pub const DISABLED: Self = Self {
        lifespan_months: None,
    };

    /// Keep files for `months` months (0 disables retention)
    pub fn months(months: u32) -> Self {
        Self {
            lifespan_months: (months >= 1).then_some(months),
        }
    }

    /// Parse a configured lifespan; absent, non-numeric or < 1 disables retention
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim).and_then(|v| v.parse::<i64>().ok()) {
            Some(n) if n >= 1 => Self {
                lifespan_months: u32::try_from(n).ok(),
            },
            _ => Self::DISABLED,
        }
    }

    /// Configured lifespan in months, if retention is enabled
    pub fn lifespan_months(&self) -> Option<u32> {
        self.lifespan_months
    }

    pub fn is_enabled(&self) -> bool {
        self.lifespan_months.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let settings = Settings::new().with("LogFiles.Folder", "/var/log/app");
        assert_eq!(settings.get("logfiles.folder"), Some("/var/log/app"));
        assert_eq!(settings.get("LOGFILES.FOLDER"), Some("/var/log/app"));
        assert_eq!(settings.get("LogFiles.Lifespan"), None);
    }

    #[test]
    fn test_toml_tables_are_flattened() {
        let settings = Settings::from_toml_str(
            r#"
            [LogFiles]
            Folder = "/tmp/logs"
            Lifespan = 3
            Enabled = true
            Tags = ["a", "b"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.get(FOLDER_KEY), Some("/tmp/logs"));
        assert_eq!(settings.get(LIFESPAN_KEY), Some("3"));
        assert_eq!(settings.get("LogFiles.Enabled"), Some("true"));
        assert_eq!(settings.get("LogFiles.Tags"), None);
    }

    #[test]
    fn test_toml_dotted_quoted_key() {
        let settings = Settings::from_toml_str(r#""logfiles.folder" = "x""#).unwrap();
        assert_eq!(settings.get(FOLDER_KEY), Some("x"));
    }

    #[test]
    fn test_json_settings() {
        let settings =
            Settings::from_json_str(r#"{"LogFiles": {"Folder": "/srv/log", "Lifespan": "6"}}"#)
                .unwrap();
        assert_eq!(settings.get(FOLDER_KEY), Some("/srv/log"));
        assert_eq!(settings.retention_policy(), RetentionPolicy::months(6));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(Settings::from_toml_str("[LogFiles").is_err());
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::TempDir::new().unwrap();
        let json = dir.path().join("appsettings.json");
        std::fs::write(&json, r#"{"LogFiles.Lifespan": 2}"#).unwrap();
        let toml_path = dir.path().join("appsettings.toml");
        std::fs::write(&toml_path, "[LogFiles]\nLifespan = 4\n").unwrap();

        assert_eq!(
            Settings::load(&json).unwrap().retention_policy(),
            RetentionPolicy::months(2)
        );
        assert_eq!(
            Settings::load(&toml_path).unwrap().retention_policy(),
            RetentionPolicy::months(4)
        );
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert!(settings.is_empty());
    }

    #[test]
    fn test_log_directory_default() {
        let dir = Settings::new().log_directory().unwrap();
        assert_eq!(dir, std::env::current_dir().unwrap().join("log"));
    }

    #[test]
    fn test_log_directory_blank_falls_back() {
        let settings = Settings::new().with(FOLDER_KEY, "   ");
        assert_eq!(settings.log_directory().unwrap(), default_log_dir().unwrap());
    }

    #[test]
    fn test_log_directory_configured_is_trimmed() {
        let settings = Settings::new().with(FOLDER_KEY, "  /tmp/logs  ");
        assert_eq!(settings.log_directory().unwrap(), PathBuf::from("/tmp/logs"));
    }

    #[test]
    fn test_retention_policy_parse() {
        assert_eq!(RetentionPolicy::parse(None), RetentionPolicy::DISABLED);
        assert_eq!(RetentionPolicy::parse(Some("abc")), RetentionPolicy::DISABLED);
        assert_eq!(RetentionPolicy::parse(Some("0")), RetentionPolicy::DISABLED);
        assert_eq!(RetentionPolicy::parse(Some("-2")), RetentionPolicy::DISABLED);
        assert_eq!(RetentionPolicy::parse(Some("1.5")), RetentionPolicy::DISABLED);
        assert_eq!(RetentionPolicy::parse(Some(" 12 ")).lifespan_months(), Some(12));
        assert!(!RetentionPolicy::months(0).is_enabled());
    }
}
