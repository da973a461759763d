// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_VERSION: i64 = 2;
pub const DEFAULT_UNDO_LIMIT: usize = 50;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub undo_limit: Option<i64>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            undo_limit: Some(DEFAULT_UNDO_LIMIT as i64),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("MICASA_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set MICASA_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(micasa_db::APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 2` and move values under [storage], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 2. Migrate your config to the v2 schema",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            micasa_db::validate_db_path(db_path)?;
        }

        if let Some(limit) = self.ui.undo_limit
            && limit <= 0
        {
            bail!(
                "ui.undo_limit in {} must be positive, got {}",
                path.display(),
                limit
            );
        }

        if let Some(level) = &self.log.level {
            tracing_subscriber::EnvFilter::try_new(level).with_context(|| {
                format!(
                    "log.level in {} is not a valid filter: {:?}",
                    path.display(),
                    level
                )
            })?;
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => micasa_db::default_db_path(),
        }
    }

    pub fn undo_limit(&self) -> usize {
        self.ui
            .undo_limit
            .and_then(|limit| usize::try_from(limit).ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_UNDO_LIMIT)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# micasa config\n# Place this file at: {}\n\nversion = 2\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/micasa/micasa.db)\n# db_path = \"/absolute/path/to/micasa.db\"\n\n[ui]\n# How many delete/restore/edit steps `u` can take back.\nundo_limit = {}\n\n[log]\n# tracing filter; MICASA_LOG overrides it.\nlevel = \"{}\"\n",
            path.display(),
            DEFAULT_UNDO_LIMIT,
            DEFAULT_LOG_LEVEL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, DEFAULT_UNDO_LIMIT};
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 2);
        assert_eq!(config.undo_limit(), DEFAULT_UNDO_LIMIT);
        assert_eq!(config.log_level(), "info");
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[ui]\nundo_limit = 10\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 2"));
        assert!(message.contains("[storage], [ui], and [log]"));
        Ok(())
    }

    #[test]
    fn v2_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 2\n[storage]\ndb_path = \"/tmp/house.db\"\n[ui]\nundo_limit = 12\n[log]\nlevel = \"micasa_tui=debug\"\n",
        )?;
        let config = Config::load(&path)?;
        assert_eq!(config.undo_limit(), 12);
        assert_eq!(config.log_level(), "micasa_tui=debug");
        assert_eq!(config.db_path()?, PathBuf::from("/tmp/house.db"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n")?;
        let error = Config::load(&path).expect_err("v1 config should fail");
        assert!(error.to_string().contains("unsupported config version 1"));
        Ok(())
    }

    #[test]
    fn non_positive_undo_limit_is_rejected() -> Result<()> {
        for limit in ["0", "-3"] {
            let (_temp, path) =
                write_config(&format!("version = 2\n[ui]\nundo_limit = {limit}\n"))?;
            let error = Config::load(&path).expect_err("undo limit must be positive");
            assert!(
                error.to_string().contains("must be positive"),
                "unexpected message: {error}"
            );
        }
        Ok(())
    }

    #[test]
    fn invalid_log_level_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n[log]\nlevel = \"micasa=loud\"\n")?;
        let error = Config::load(&path).expect_err("bad filter should fail");
        assert!(error.to_string().contains("log.level"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("MICASA_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("MICASA_CONFIG_PATH");
        }
        assert_eq!(resolved?, override_path);
        Ok(())
    }

    #[test]
    fn db_path_prefers_storage_config_over_env_override() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) =
            write_config("version = 2\n[storage]\ndb_path = \"/explicit/from-config.db\"\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("MICASA_DB_PATH", "/from/env.db");
        }
        let resolved = Config::load(&path).and_then(|config| config.db_path());
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("MICASA_DB_PATH");
        }
        assert_eq!(resolved?, PathBuf::from("/explicit/from-config.db"));
        Ok(())
    }

    #[test]
    fn db_path_uses_env_override_when_storage_db_path_missing() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) = write_config("version = 2\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("MICASA_DB_PATH", "/from/env-only.db");
        }
        let resolved = Config::load(&path).and_then(|config| config.db_path());
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("MICASA_DB_PATH");
        }
        assert_eq!(resolved?, PathBuf::from("/from/env-only.db"));
        Ok(())
    }

    #[test]
    fn db_path_rejects_uri_style_storage_value() -> Result<()> {
        let (_temp, path) =
            write_config("version = 2\n[storage]\ndb_path = \"https://evil.example/micasa.db\"\n")?;
        let error = Config::load(&path).expect_err("URI db_path should fail validation");
        assert!(error.to_string().contains("looks like a URI"));
        Ok(())
    }

    #[test]
    fn example_config_round_trips_through_load() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("[storage]"));
        assert!(example.contains("[ui]"));
        assert!(example.contains("[log]"));

        std::fs::write(&path, &example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.undo_limit(), DEFAULT_UNDO_LIMIT);
        assert_eq!(config.log_level(), "info");
        Ok(())
    }
}
