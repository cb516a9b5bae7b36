//! Configuration loader for Birdie.
//!
//! Reads `config.toml` (from the data directory unless a path is given) and
//! deserializes it into [`AppConfig`]. Falls back to defaults when the file
//! is missing or malformed, then applies environment overrides.

use std::path::Path;

use birdie_types::config::AppConfig;

pub const CONFIG_FILE: &str = "config.toml";

/// Load configuration from `path`.
///
/// - Missing file: [`AppConfig::default()`].
/// - Unreadable or unparseable file: logs a warning and returns the default.
pub async fn load_config(path: &Path) -> AppConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            AppConfig::default()
        }
    }
}

/// Apply deployment overrides that traditionally live in the environment.
///
/// `lookup` is `std::env::var` in production.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("GENAI_URL").filter(|v| !v.is_empty()) {
        config.analysis.base_url = url;
    }
    if let Some(id) = lookup("GOOGLE_DRIVE_ROOT_FOLDER_ID").filter(|v| !v.is_empty()) {
        config.drive.root_folder_id = id;
    }
}
