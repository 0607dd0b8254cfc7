use crate::domain::models::{AppConfig, AppError};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "LIGHTSWITCH_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "lightswitch.json";

pub fn settings_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Reads the settings file, writing the defaults first when it does not
/// exist yet.
pub fn load_or_default_settings(path: &Path) -> Result<AppConfig, AppError> {
    if !path.exists() {
        let config = AppConfig::default();
        write_settings(path, &config)?;
        tracing::info!(path = %path.display(), "wrote default settings");
        return Ok(config);
    }
    let content = std::fs::read_to_string(path).map_err(|error| {
        AppError::new(
            "SETTINGS_READ_FAIL",
            format!("failed to read settings: {error}"),
            None,
        )
    })?;
    serde_json::from_str::<AppConfig>(&content).map_err(|error| {
        AppError::new(
            "SETTINGS_PARSE_FAIL",
            format!("failed to parse settings: {error}"),
            Some(format!("fix or delete {}", path.display())),
        )
    })
}

pub fn write_settings(path: &Path, config: &AppConfig) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|error| {
            AppError::new(
                "SETTINGS_WRITE_FAIL",
                format!("failed to create settings dir: {error}"),
                None,
            )
        })?;
    }
    let raw = serde_json::to_string_pretty(config).map_err(|error| {
        AppError::new(
            "SETTINGS_WRITE_FAIL",
            format!("failed to serialize settings: {error}"),
            None,
        )
    })?;
    std::fs::write(path, raw).map_err(|error| {
        AppError::new(
            "SETTINGS_WRITE_FAIL",
            format!("failed to write settings: {error}"),
            None,
        )
    })
}
