// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use micasa_tui::logs::{DEFAULT_LOG_CAPACITY, LogBuffer};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV: &str = "MICASA_LOG";

/// The terminal belongs to the TUI, so events go to a file beside the
/// default database.
pub fn default_log_path() -> Result<PathBuf> {
    let data_root = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("cannot resolve data directory for the log file"))?;
    let app_dir = data_root.join(micasa_db::APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create log directory {}", app_dir.display()))?;
    Ok(app_dir.join("micasa.log"))
}

/// `MICASA_LOG` wins over the configured level when it is set and non-blank.
fn filter_directives(from_env: Option<String>, configured: &str) -> (String, &'static str) {
    match from_env {
        Some(value) if !value.trim().is_empty() => (value, LOG_ENV),
        _ => (configured.to_owned(), "log.level"),
    }
}

/// The overlay keeps what the filter lets through. Directive sets too
/// complex to summarise fall back to INFO.
fn overlay_level(hint: Option<LevelFilter>) -> Option<Level> {
    match hint {
        Some(filter) => filter.into_level(),
        None => Some(Level::INFO),
    }
}

/// Installs a file layer and a layer feeding the returned in-app buffer.
pub fn init(configured_level: &str) -> Result<LogBuffer> {
    let (directives, source) = filter_directives(env::var(LOG_ENV).ok(), configured_level);
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid {source} filter {directives:?}"))?;
    let buffer = LogBuffer::new(overlay_level(filter.max_level_hint()), DEFAULT_LOG_CAPACITY);

    let path = default_log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_target(true)
        .with_ansi(false)
        .compact();
    let overlay_layer = fmt::layer()
        .with_writer(buffer.clone())
        .without_time()
        .with_target(true)
        .with_ansi(false)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(overlay_layer)
        .try_init()
        .context("install tracing subscriber")?;

    tracing::info!(log = %path.display(), filter = %directives, "logging initialised");
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::{filter_directives, overlay_level};
    use tracing::Level;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn env_value_overrides_configured_level() {
        let (directives, source) =
            filter_directives(Some("micasa_tui=trace".to_owned()), "warn");
        assert_eq!(directives, "micasa_tui=trace");
        assert_eq!(source, "MICASA_LOG");
    }

    #[test]
    fn blank_env_value_falls_back_to_config() {
        let (directives, source) = filter_directives(Some("  ".to_owned()), "debug");
        assert_eq!(directives, "debug");
        assert_eq!(source, "log.level");

        let (directives, _) = filter_directives(None, "info");
        assert_eq!(directives, "info");
    }

    #[test]
    fn overlay_level_follows_the_filter() {
        let hint = |directives: &str| EnvFilter::new(directives).max_level_hint();
        assert_eq!(overlay_level(hint("debug")), Some(Level::DEBUG));
        assert_eq!(overlay_level(hint("warn,micasa_db=trace")), Some(Level::TRACE));
        assert_eq!(overlay_level(Some(LevelFilter::OFF)), None);
        assert_eq!(overlay_level(None), Some(Level::INFO));
    }
}
