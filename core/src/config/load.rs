use std::path::{Path, PathBuf};

use anyhow::Context;

use super::types::AppConfig;

/// Explicit config file path, checked before any default location.
pub const CONFIG_ENV: &str = "CCPROXY_CONFIG";

/// Get the default ccproxy data directory: ~/.ccproxy
pub fn get_ccproxy_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".ccproxy"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: $CCPROXY_CONFIG
    let explicit = std::env::var(CONFIG_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);

    // Priority 2: ~/.ccproxy/config.toml
    let home_config = get_ccproxy_data_dir().ok().map(|d| d.join("config.toml"));

    // Priority 3: ./config.toml
    let local_config = Path::new("config.toml");

    let mut cfg = if let Some(path) = explicit {
        load_from_path(&path)?
    } else if let Some(path) = home_config.filter(|p| p.exists()) {
        load_from_path(&path)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    Ok(cfg)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str::<AppConfig>(&s)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

/// Environment variable overrides (highest priority). `lookup` is injected so
/// tests do not have to touch the process environment.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("CCPROXY_HOST") {
        cfg.http_server.host = v;
    }
    if let Some(v) = get("CCPROXY_PORT") {
        cfg.http_server.port = v
            .trim()
            .parse()
            .with_context(|| format!("CCPROXY_PORT is not a valid port: {v}"))?;
    }
    if let Some(v) = get("CCPROXY_TRANSPORT_BASE_URL") {
        cfg.transport.base_url = Some(v);
    }
    if let Some(v) = get("CCPROXY_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    Ok(())
}
