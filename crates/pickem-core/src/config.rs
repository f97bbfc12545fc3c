// Configuration loading and parsing (config/client.toml).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// client.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default)]
    pub submit_style: SubmitStyle,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Where the (league, sport, week) scope goes when posting picks. Backends
/// disagree on this, so it is a deployment setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStyle {
    /// `POST /picks` with `leagueId`, `sportId`, `week` and `picks` in the body.
    #[default]
    BatchedBody,
    /// `POST /leagues/{l}/sports/{s}/weeks/{w}/picks` with `picks` in the body.
    PathScoped,
    /// `POST /picks?leagueId=..&sportId=..&week=..` with `picks` in the body.
    QueryScoped,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub db_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
    #[serde(default = "default_notice_ttl_secs")]
    pub notice_ttl_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            tick_rate_ms: default_tick_rate_ms(),
            notice_ttl_secs: default_notice_ttl_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_tick_rate_ms() -> u64 {
    250
}

fn default_notice_ttl_secs() -> u64 {
    6
}

/// Longest a notice may stay on screen.
pub const MAX_NOTICE_TTL_SECS: u64 = 3600;

impl Config {
    /// Location of the session database. `":memory:"` and absolute paths are
    /// used as-is; relative paths go under the platform data directory, or
    /// the working directory when no home directory can be determined.
    pub fn resolve_db_path(&self) -> String {
        let raw = self.session.db_path.as_str();
        if raw == ":memory:" || Path::new(raw).is_absolute() {
            return raw.to_string();
        }
        match directories::ProjectDirs::from("", "", "pickem") {
            Some(dirs) => dirs.data_dir().join(raw).to_string_lossy().into_owned(),
            None => raw.to_string(),
        }
    }

    pub fn notice_ttl(&self) -> chrono::Duration {
        let secs = self.ui.notice_ttl_secs.min(MAX_NOTICE_TTL_SECS);
        chrono::Duration::seconds(i64::try_from(secs).unwrap_or(0))
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/client.toml` relative to
/// `base_dir`.
///
/// Does not copy defaults. Prefer `load_config()`, or call
/// `ensure_config_files` first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("client.toml");
    let text = read_file(&path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or pass --config-dir",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Loads config relative to the current working directory, copying defaults
/// first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let base = config.api.base_url.trim();
    if base.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "api.base_url".into(),
            message: "must not be empty".into(),
        });
    }
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(ConfigError::ValidationError {
            field: "api.base_url".into(),
            message: format!("must be an http(s) URL, got {base}"),
        });
    }

    if config.api.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "api.timeout_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.session.db_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "session.db_path".into(),
            message: "must not be empty".into(),
        });
    }

    if config.ui.tick_rate_ms == 0 {
        return Err(ConfigError::ValidationError {
            field: "ui.tick_rate_ms".into(),
            message: "must be greater than 0".into(),
        });
    }

    let ttl = config.ui.notice_ttl_secs;
    if ttl == 0 || ttl > MAX_NOTICE_TTL_SECS {
        return Err(ConfigError::ValidationError {
            field: "ui.notice_ttl_secs".into(),
            message: format!("must be between 1 and {MAX_NOTICE_TTL_SECS}, got {ttl}"),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Repository root, where `defaults/` lives.
    fn project_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        tmp
    }

    fn write_client_toml(dir: &Path, text: &str) {
        fs::write(dir.join("config/client.toml"), text).unwrap();
    }

    #[test]
    fn load_defaults_from_project_files() {
        let tmp = scratch_dir("pickem_config_defaults");
        fs::copy(
            project_root().join("defaults/client.toml"),
            tmp.join("config/client.toml"),
        )
        .unwrap();

        let config = load_config_from(&tmp).expect("defaults should be valid");
        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.api.submit_style, SubmitStyle::BatchedBody);
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.session.db_path, "pickem-session.db");
        assert_eq!(config.ui.tick_rate_ms, 250);
        assert_eq!(config.ui.notice_ttl_secs, 6);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ui_section_and_optional_keys_default() {
        let tmp = scratch_dir("pickem_config_minimal");
        write_client_toml(
            &tmp,
            r#"
[api]
base_url = "https://picks.example.com/api"

[session]
db_path = ":memory:"
"#,
        );

        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.api.submit_style, SubmitStyle::BatchedBody);
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.ui.tick_rate_ms, 250);
        assert_eq!(config.resolve_db_path(), ":memory:");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parses_submit_styles() {
        let tmp = scratch_dir("pickem_config_styles");
        for (raw, expected) in [
            ("batched_body", SubmitStyle::BatchedBody),
            ("path_scoped", SubmitStyle::PathScoped),
            ("query_scoped", SubmitStyle::QueryScoped),
        ] {
            write_client_toml(
                &tmp,
                &format!(
                    "[api]\nbase_url = \"http://localhost:5000/api\"\nsubmit_style = \"{raw}\"\n\n[session]\ndb_path = \"s.db\"\n"
                ),
            );
            let config = load_config_from(&tmp).unwrap();
            assert_eq!(config.api.submit_style, expected);
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn unknown_submit_style_is_a_parse_error() {
        let tmp = scratch_dir("pickem_config_bad_style");
        write_client_toml(
            &tmp,
            "[api]\nbase_url = \"http://x\"\nsubmit_style = \"carrier_pigeon\"\n\n[session]\ndb_path = \"s.db\"\n",
        );
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }), "got: {err}");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_non_http_base_url() {
        let tmp = scratch_dir("pickem_config_bad_url");
        write_client_toml(
            &tmp,
            "[api]\nbase_url = \"localhost:5000\"\n\n[session]\ndb_path = \"s.db\"\n",
        );
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "api.base_url"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_timeout_and_tick_rate() {
        let tmp = scratch_dir("pickem_config_zeroes");
        write_client_toml(
            &tmp,
            "[api]\nbase_url = \"http://x\"\ntimeout_secs = 0\n\n[session]\ndb_path = \"s.db\"\n",
        );
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "api.timeout_secs"),
            other => panic!("expected ValidationError, got: {other}"),
        }

        write_client_toml(
            &tmp,
            "[api]\nbase_url = \"http://x\"\n\n[session]\ndb_path = \"s.db\"\n\n[ui]\ntick_rate_ms = 0\n",
        );
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "ui.tick_rate_ms"),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_notice_ttl_out_of_range() {
        let tmp = scratch_dir("pickem_config_notice_ttl");
        for ttl in ["0", "3601", "10000000000000000"] {
            write_client_toml(
                &tmp,
                &format!(
                    "[api]\nbase_url = \"http://x\"\n\n[session]\ndb_path = \"s.db\"\n\n[ui]\nnotice_ttl_secs = {ttl}\n"
                ),
            );
            match load_config_from(&tmp).unwrap_err() {
                ConfigError::ValidationError { field, .. } => {
                    assert_eq!(field, "ui.notice_ttl_secs")
                }
                other => panic!("expected ValidationError for {ttl}, got: {other}"),
            }
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn notice_ttl_is_capped_when_built_in_code() {
        let config = Config {
            api: ApiConfig {
                base_url: "http://x".into(),
                submit_style: SubmitStyle::default(),
                timeout_secs: 5,
            },
            session: SessionConfig { db_path: ":memory:".into() },
            ui: UiConfig { tick_rate_ms: 50, notice_ttl_secs: u64::MAX },
        };
        assert_eq!(
            config.notice_ttl(),
            chrono::Duration::seconds(MAX_NOTICE_TTL_SECS as i64)
        );
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let tmp = std::env::temp_dir().join("pickem_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("config/client.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }
    }

    #[test]
    fn ensure_config_files_copies_once_and_skips_examples() {
        let tmp = std::env::temp_dir().join("pickem_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults/client.toml"), "original").unwrap();
        fs::write(tmp.join("defaults/extra.toml.example"), "template").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied, vec![tmp.join("config/client.toml")]);
        assert!(!tmp.join("config/extra.toml.example").exists());

        // User edits survive a second run.
        fs::write(tmp.join("config/client.toml"), "edited").unwrap();
        let copied = ensure_config_files(&tmp).unwrap();
        assert!(copied.is_empty());
        assert_eq!(fs::read_to_string(tmp.join("config/client.toml")).unwrap(), "edited");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_errors_without_either_directory() {
        let tmp = std::env::temp_dir().join("pickem_config_nothing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let err = ensure_config_files(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::DefaultsCopyError { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }
}
