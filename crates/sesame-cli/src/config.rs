use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};

/// User-level configuration loaded from `~/.config/sesame/config.toml` (platform-specific).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Override for the session directory (encrypted entries).
    pub session_dir: Option<PathBuf>,
    /// Prefix prepended to every key name.
    pub prefix: Option<String>,
    /// PBKDF2 rounds for entry keys.
    pub kdf_iterations: Option<u32>,
    /// Where the shared secret comes from.
    pub secret: Option<SecretConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SecretConfig {
    pub source: Option<SecretSource>,
    pub service: Option<String>,
    pub account: Option<String>,
    pub env_var: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SecretSource {
    #[default]
    Keyring,
    Env,
}

impl Config {
    /// Applies command-line overrides on top of file values.
    pub fn apply_overrides(&mut self, prefix: Option<String>, session_dir: Option<PathBuf>) {
        if prefix.is_some() {
            self.prefix = prefix;
        }
        if session_dir.is_some() {
            self.session_dir = session_dir;
        }
    }

    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or_default()
    }
}

/// Load config from the default path; if missing, return defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    load_from_path(path)
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("sesame").join("config.toml"))
}

/// Write the given config to the default path unless a file is already there.
pub fn write_default_if_missing(config: &Config) -> Result<PathBuf> {
    write_to_path_if_missing(config, &default_path()?)
}

/// Leaves an existing file untouched to avoid clobbering user edits.
fn write_to_path_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_default_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_from_path(dir.path().join("config.toml")).expect("load");
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.prefix(), "");
    }

    #[test]
    fn returns_default_when_blank() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "  \n").expect("write");
        assert_eq!(load_from_path(&path).expect("load"), Config::default());
    }

    #[test]
    fn parses_custom_config() {
        let contents = r#"
            session_dir = "/tmp/sesame-session"
            prefix = "app:"
            kdf_iterations = 20000
            [secret]
            source = "env"
            env_var = "APP_SESSION_SECRET"
        "#;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("write temp config");

        let cfg = load_from_path(&path).expect("load");
        assert_eq!(
            cfg,
            Config {
                session_dir: Some(PathBuf::from("/tmp/sesame-session")),
                prefix: Some("app:".into()),
                kdf_iterations: Some(20_000),
                secret: Some(SecretConfig {
                    source: Some(SecretSource::Env),
                    service: None,
                    account: None,
                    env_var: Some("APP_SESSION_SECRET".into()),
                }),
            }
        );
    }

    #[test]
    fn rejects_unknown_secret_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[secret]\nsource = \"vault\"\n").expect("write");
        assert!(load_from_path(&path).is_err());
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut cfg = Config {
            prefix: Some("file:".into()),
            ..Config::default()
        };
        cfg.apply_overrides(None, Some(PathBuf::from("/tmp/s")));
        assert_eq!(cfg.prefix(), "file:");
        assert_eq!(cfg.session_dir, Some(PathBuf::from("/tmp/s")));

        cfg.apply_overrides(Some("cli:".into()), None);
        assert_eq!(cfg.prefix(), "cli:");
    }

    #[test]
    fn write_default_creates_file_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config {
            prefix: Some("app:".into()),
            secret: Some(SecretConfig {
                source: Some(SecretSource::Keyring),
                service: Some("sesame".into()),
                account: Some("session-secret".into()),
                env_var: None,
            }),
            ..Config::default()
        };

        write_to_path_if_missing(&cfg, &path).expect("write should succeed");
        let other = Config::default();
        let second = write_to_path_if_missing(&other, &path).expect("second write ok");
        assert_eq!(second, path);
        let loaded = load_from_path(&path).expect("load");
        assert_eq!(loaded, cfg);
    }
}
