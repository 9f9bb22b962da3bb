//! Service configuration: defaults applied to new games, plus daemon
//! settings. Loaded from TOML at startup.

use std::path::Path;

use serde::Deserialize;

use crate::judge::error::JudgeError;
use crate::judge::game::PressRules;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// gRPC listen port.
    pub port: u16,
    /// From-address on judge-originated mail.
    pub from_addr: String,
    /// Default turn deadline for new games, in hours.
    pub deadline_hours: u32,
    /// Default grace period past the deadline, in hours.
    pub grace_hours: u32,
    /// Default press mode for new games.
    pub press: PressRules,
    /// Default draw-includes-all-survivors setting.
    pub dias: bool,
    /// Password accepted by `BECOME MASTER`.
    pub master_password: Option<String>,
    /// Process a turn as soon as every power's orders are in.
    pub auto_process: bool,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        JudgeConfig {
            port: 50051,
            from_addr: "judge@localhost".into(),
            deadline_hours: 24,
            grace_hours: 12,
            press: PressRules::White,
            dias: true,
            master_password: None,
            auto_process: true,
        }
    }
}

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: &Path) -> Result<JudgeConfig, JudgeError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| JudgeError::Config(format!("failed to read {}: {e}", path.display())))?;
    toml::from_str(&content)
        .map_err(|e| JudgeError::Config(format!("failed to parse {}: {e}", path.display())))
}

/// Try well-known paths, falling back to built-in defaults.
pub fn load_default_config() -> JudgeConfig {
    let candidates = ["judge.toml", "../judge.toml", "/etc/dip-judge/judge.toml"];
    for path in &candidates {
        let p = Path::new(path);
        if p.exists() {
            match load_config(p) {
                Ok(config) => {
                    tracing::info!(path = %p.display(), "loaded judge config");
                    return config;
                }
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "failed to load judge config");
                }
            }
        }
    }
    tracing::info!("no judge.toml found, using built-in defaults");
    JudgeConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let config = JudgeConfig::default();
        assert_eq!(config.port, 50051);
        assert_eq!(config.deadline_hours, 24);
        assert_eq!(config.press, PressRules::White);
        assert!(config.dias);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port = 6001\npress = \"grey\"\nmaster_password = \"hunter2\""
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.port, 6001);
        assert_eq!(config.press, PressRules::Grey);
        assert_eq!(config.master_password.as_deref(), Some("hunter2"));
        // Unspecified fields keep their defaults.
        assert_eq!(config.deadline_hours, 24);
        assert!(config.auto_process);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(JudgeError::Config(_))
        ));
    }
}
