//! # configs
//!
//! Layered application configuration: optional `board.toml` file, then
//! `BOARD_*` environment variables (nested keys separated by `__`, e.g.
//! `BOARD_FEED__RECENTLY_VIEWED_CAP=20`). `.env` is loaded first when
//! present.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Most-recent-N cap on the recently-viewed list.
    #[serde(default = "default_recently_viewed_cap")]
    pub recently_viewed_cap: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path of the device-local key-value store file.
    #[serde(default = "default_device_store_path")]
    pub device_store_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// tracing env-filter directive, e.g. "info" or "services=debug".
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_recently_viewed_cap() -> usize {
    50
}

fn default_device_store_path() -> String {
    "./data/device-store.json".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            recently_viewed_cap: default_recently_viewed_cap(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            device_store_path: default_device_store_path(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: default_log_filter(),
        }
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();
    let cfg = config::Config::builder()
        .add_source(config::File::with_name("board").required(false))
        .add_source(config::Environment::with_prefix("BOARD").separator("__"))
        .build()?;
    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_any_source() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.feed.recently_viewed_cap, 50);
        assert_eq!(cfg.log.filter, "info");
        assert!(cfg.storage.device_store_path.ends_with("device-store.json"));
    }
}
