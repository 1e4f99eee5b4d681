//! Server configuration read from the environment.
//!
//! - `ARCHBOARD_DB_PATH`: SQLite database file path (default: "archboard.db")
//! - `ARCHBOARD_PORT`: listen port (default: 3000)
//! - `ARCHBOARD_LOCAL_DIR`: directory for device-local state such as version
//!   history (default: unset, kept in memory)
//! - `ARCHBOARD_AUTOSAVE_MS`: auto-save debounce in milliseconds (default: 2000)
//! - `ARCHBOARD_SNAPSHOT_SECS`: periodic version snapshot interval in seconds
//!   (default: 300)
//! - `ARCHBOARD_SESSION_IDLE_SECS`: open editors untouched this long are
//!   dropped (default: 1800, 0 keeps them until closed)

use std::path::PathBuf;
use std::time::Duration;

/// Default quiet period before an auto-save fires.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_secs(2);

/// Default interval between periodic version snapshots.
pub const DEFAULT_SNAPSHOT_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default time an untouched editor stays open.
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got '{value}'")]
    NotANumber { var: &'static str, value: String },
}

/// Timing knobs for one editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorConfig {
    pub autosave_delay: Duration,
    pub snapshot_interval: Duration,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: String,
    pub port: u16,
    pub local_dir: Option<PathBuf>,
    pub session_idle: Duration,
    pub editor: EditorConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            db_path: "archboard.db".to_string(),
            port: 3000,
            local_dir: None,
            session_idle: DEFAULT_SESSION_IDLE,
            editor: EditorConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults for
    /// unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ServerConfig::default();
        let number = |var: &'static str| -> Result<Option<u64>, ConfigError> {
            match lookup(var) {
                None => Ok(None),
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .map(Some)
                    .map_err(|_| ConfigError::NotANumber { var, value }),
            }
        };

        let port = match number("ARCHBOARD_PORT")? {
            Some(p) => u16::try_from(p).map_err(|_| ConfigError::NotANumber {
                var: "ARCHBOARD_PORT",
                value: p.to_string(),
            })?,
            None => defaults.port,
        };

        Ok(ServerConfig {
            db_path: lookup("ARCHBOARD_DB_PATH").unwrap_or(defaults.db_path),
            port,
            local_dir: lookup("ARCHBOARD_LOCAL_DIR").map(PathBuf::from),
            session_idle: number("ARCHBOARD_SESSION_IDLE_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_idle),
            editor: EditorConfig {
                autosave_delay: number("ARCHBOARD_AUTOSAVE_MS")?
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.editor.autosave_delay),
                snapshot_interval: number("ARCHBOARD_SNAPSHOT_SECS")?
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.editor.snapshot_interval),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn unset_variables_use_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.editor.autosave_delay, Duration::from_secs(2));
        assert_eq!(config.editor.snapshot_interval, Duration::from_secs(300));
        assert_eq!(config.session_idle, Duration::from_secs(1800));
    }

    #[test]
    fn variables_override_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("ARCHBOARD_DB_PATH", "/tmp/a.db"),
            ("ARCHBOARD_PORT", "8080"),
            ("ARCHBOARD_LOCAL_DIR", "/tmp/local"),
            ("ARCHBOARD_AUTOSAVE_MS", "500"),
            ("ARCHBOARD_SNAPSHOT_SECS", "60"),
            ("ARCHBOARD_SESSION_IDLE_SECS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, "/tmp/a.db");
        assert_eq!(config.port, 8080);
        assert_eq!(config.local_dir, Some(PathBuf::from("/tmp/local")));
        assert_eq!(config.editor.autosave_delay, Duration::from_millis(500));
        assert_eq!(config.editor.snapshot_interval, Duration::from_secs(60));
        assert_eq!(config.session_idle, Duration::ZERO);
    }

    #[test]
    fn bad_numbers_are_reported() {
        let err = ServerConfig::from_lookup(lookup_from(&[("ARCHBOARD_PORT", "99999")])).unwrap_err();
        assert!(err.to_string().contains("ARCHBOARD_PORT"));
        let err =
            ServerConfig::from_lookup(lookup_from(&[("ARCHBOARD_AUTOSAVE_MS", "soon")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ARCHBOARD_AUTOSAVE_MS must be a non-negative integer, got 'soon'"
        );
    }
}
