//! Project and user configuration.
//!
//! Project settings live in `.journey/config.toml` under the project root;
//! user settings in `<config_dir>/journey/config.toml`. Both files are
//! optional and every key has a default.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::storage::FileStorage;
use crate::timelock::{DEFAULT_START, ScheduleError, TimeLock, UnlockSchedule};

/// Directory under the project root holding config and data.
pub const PROJECT_DIR: &str = ".journey";

/// Default data directory, relative to [`PROJECT_DIR`].
pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub timelock: TimeLockConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// `[timelock]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLockConfig {
    /// Hold chapters back until their date. Off by default.
    #[serde(default)]
    pub enforce: bool,
    /// Date chapter 1 opens, as `"YYYY-MM-DD"`.
    #[serde(default = "default_start")]
    pub start: NaiveDate,
    /// Days between consecutive chapters.
    #[serde(default = "default_interval_days")]
    pub interval_days: u32,
}

impl Default for TimeLockConfig {
    fn default() -> Self {
        Self {
            enforce: false,
            start: default_start(),
            interval_days: default_interval_days(),
        }
    }
}

impl TimeLockConfig {
    /// Build the calendar lock this table describes.
    ///
    /// # Errors
    ///
    /// [`ScheduleError`] if `start` and `interval_days` put a chapter past the
    /// last representable date.
    pub fn to_time_lock(&self) -> Result<TimeLock, ScheduleError> {
        let schedule = UnlockSchedule::daily(self.start, self.interval_days)?;
        Ok(if self.enforce {
            TimeLock::enforced(schedule)
        } else {
            TimeLock::bypassed(schedule)
        })
    }
}

/// `[storage]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Relative paths are taken from the project root.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// How long to wait for another process to release the data directory.
    #[serde(default)]
    pub lock_timeout_ms: Option<u64>,
}

impl ProjectConfig {
    /// Directory the progress files live in for `project_root`.
    #[must_use]
    pub fn data_dir(&self, project_root: &Path) -> PathBuf {
        match &self.storage.dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => project_root.join(dir),
            None => project_root.join(PROJECT_DIR).join(DEFAULT_DATA_DIR),
        }
    }

    /// File-backed storage rooted at [`Self::data_dir`].
    #[must_use]
    pub fn file_storage(&self, project_root: &Path) -> FileStorage {
        let mut storage = FileStorage::new(self.data_dir(project_root));
        if let Some(ms) = self.storage.lock_timeout_ms {
            storage = storage.with_lock_timeout(Duration::from_millis(ms));
        }
        storage
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

/// Path of the project config file.
#[must_use]
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(PROJECT_DIR).join("config.toml")
}

/// Read `.journey/config.toml`, or defaults if it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_config_path(project_root);
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .timelock
        .to_time_lock()
        .with_context(|| format!("Invalid [timelock] in {}", path.display()))?;
    Ok(config)
}

/// Read the per-user config, or defaults if there is none.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("journey/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load both config files and settle the output mode.
///
/// # Errors
///
/// Returns an error if either config file is unreadable or malformed.
pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.as_deref(), env_format.as_deref());

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

/// Output mode by precedence: `--json`, then `FORMAT`, then the user config,
/// then `pretty` on a terminal and `text` otherwise.
#[must_use]
pub fn resolve_output(cli_json: bool, user_output: Option<&str>, env_format: Option<&str>) -> String {
    fn normalize(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }
    if let Some(mode) = env_format.and_then(normalize) {
        return mode.to_string();
    }
    if let Some(mode) = user_output.and_then(normalize) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

/// Template written by `journey init`.
#[must_use]
pub fn default_config_toml() -> String {
    let defaults = TimeLockConfig::default();
    format!(
        "[timelock]\n\
         # Hold each chapter back until its calendar date.\n\
         enforce = {}\n\
         start = \"{}\"\n\
         interval_days = {}\n\
         \n\
         [storage]\n\
         # dir = \"{PROJECT_DIR}/{DEFAULT_DATA_DIR}\"\n\
         # lock_timeout_ms = 500\n",
        defaults.enforce,
        defaults.start.format("%Y-%m-%d"),
        defaults.interval_days,
    )
}

fn default_start() -> NaiveDate {
    let (y, m, d) = DEFAULT_START;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

const fn default_interval_days() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn write_config(root: &Path, content: &str) {
        let path = project_config_path(root);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = TempDir::new().unwrap();
        let cfg = load_project_config(root.path()).unwrap();
        assert_eq!(cfg, ProjectConfig::default());
        assert!(!cfg.timelock.enforce);
        assert_eq!(cfg.timelock.interval_days, 1);
        assert_eq!(cfg.data_dir(root.path()), root.path().join(".journey/data"));
    }

    #[test]
    fn partial_tables_fill_defaults() {
        let root = TempDir::new().unwrap();
        write_config(root.path(), "[timelock]\nenforce = true\n");
        let cfg = load_project_config(root.path()).unwrap();
        assert!(cfg.timelock.enforce);
        assert_eq!(cfg.timelock.start, default_start());
        assert_eq!(cfg.storage.dir, None);
    }

    #[test]
    fn malformed_config_reports_path() {
        let root = TempDir::new().unwrap();
        write_config(root.path(), "[timelock\nenforce = ");
        let err = load_project_config(root.path()).unwrap_err();
        assert!(format!("{err}").contains("config.toml"));
    }

    #[test]
    fn relative_storage_dir_is_project_relative() {
        let root = TempDir::new().unwrap();
        write_config(root.path(), "[storage]\ndir = \"state\"\n");
        let cfg = load_project_config(root.path()).unwrap();
        assert_eq!(cfg.data_dir(root.path()), root.path().join("state"));
    }

    #[test]
    fn timelock_table_builds_schedule() {
        let cfg: ProjectConfig = toml::from_str(
            "[timelock]\nenforce = true\nstart = \"2026-03-01\"\ninterval_days = 2\n",
        )
        .unwrap();
        let lock = cfg.timelock.to_time_lock().unwrap();
        assert!(lock.is_enforced());
        let opens = Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap();
        assert_eq!(lock.schedule().unlock_at(1), opens);
        assert!(lock.is_locked(1, opens - chrono::Duration::seconds(1)));
    }

    #[test]
    fn oversized_interval_is_a_config_error() {
        let root = TempDir::new().unwrap();
        write_config(root.path(), "[timelock]\ninterval_days = 4000000000\n");
        let err = load_project_config(root.path()).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("[timelock]"), "{message}");
        assert!(message.contains("past the end of the calendar"), "{message}");
    }

    #[test]
    fn start_at_end_of_calendar_is_a_config_error() {
        let cfg = TimeLockConfig {
            start: NaiveDate::MAX,
            ..TimeLockConfig::default()
        };
        assert!(cfg.to_time_lock().is_err());
    }

    #[test]
    fn lock_timeout_reaches_file_storage() {
        let root = TempDir::new().unwrap();
        write_config(root.path(), "[storage]\nlock_timeout_ms = 25\n");
        let cfg = load_project_config(root.path()).unwrap();
        let storage = cfg.file_storage(root.path());
        assert_eq!(storage.lock_timeout(), Duration::from_millis(25));
        assert_eq!(
            ProjectConfig::default().file_storage(root.path()).lock_timeout(),
            crate::storage::DEFAULT_LOCK_TIMEOUT
        );
    }

    #[test]
    fn default_template_parses_to_defaults() {
        let cfg: ProjectConfig = toml::from_str(&default_config_toml()).unwrap();
        assert_eq!(cfg, ProjectConfig::default());
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        assert_eq!(resolve_output(true, Some("pretty"), Some("text")), "json");
    }

    #[test]
    fn env_beats_user_config() {
        assert_eq!(resolve_output(false, Some("json"), Some("human")), "pretty");
        assert_eq!(resolve_output(false, Some("plain"), Some("bogus")), "text");
    }
}
