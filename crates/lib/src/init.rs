//! Initialize the configuration directory: create ~/.relay, a default config, and an editable
//! copy of the bundled training definition.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{AssistantConfig, Config};
use crate::training::TrainingDefinition;

/// Training file location written by init, relative to the config directory.
pub const TRAINING_FILE: &str = "training/workspace.json";

/// Config written on first init: defaults plus `assistant.trainingFile` pointing at the extracted copy.
pub fn default_config() -> Config {
    Config {
        assistant: AssistantConfig {
            training_file: Some(PathBuf::from(TRAINING_FILE)),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Create the config directory and default files if they do not exist.
/// - Creates the config directory (parent of config file path).
/// - Writes `config.json` from [`default_config`] if missing.
/// - Writes the bundled training definition to `training/workspace.json` if missing.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        let default_config = serde_json::to_string_pretty(&default_config())
            .context("serializing default config")?;
        std::fs::write(config_path, default_config)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    }

    let training = config_dir.join(TRAINING_FILE);
    if !training.exists() {
        if let Some(dir) = training.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating training directory {}", dir.display()))?;
        }
        std::fs::write(&training, TrainingDefinition::bundled_source())
            .with_context(|| format!("writing training definition to {}", training.display()))?;
        log::info!("wrote bundled training definition to {}", training.display());
    } else {
        log::debug!("training definition already exists at {}, skipping", training.display());
    }

    Ok(config_dir.to_path_buf())
}
