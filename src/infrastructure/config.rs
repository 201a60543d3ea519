use crate::domain::models::Settings;
use crate::infrastructure::error::InfraError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const SETTINGS_JSON: &str = "settings.json";
const SUPPORTED_SCHEMA: u8 = 1;

/// On-disk default settings. These seed the schedule state on first launch;
/// afterwards the persisted snapshot is the source of truth.
#[derive(Debug, Serialize, Deserialize)]
struct SettingsFile {
    schema: u8,
    settings: Settings,
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    let path = config_dir.join(SETTINGS_JSON);
    if !path.exists() {
        let file = SettingsFile {
            schema: SUPPORTED_SCHEMA,
            settings: Settings::default(),
        };
        let formatted = serde_json::to_string_pretty(&file)?;
        fs::write(path, format!("{formatted}\n"))?;
    }
    Ok(())
}

pub fn load_default_settings(config_dir: &Path) -> Result<Settings, InfraError> {
    let path = config_dir.join(SETTINGS_JSON);
    let raw = fs::read_to_string(&path)?;
    let parsed: SettingsFile = serde_json::from_str(&raw)?;
    if parsed.schema != SUPPORTED_SCHEMA {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            parsed.schema,
            path.display()
        )));
    }
    Ok(parsed.settings)
}
