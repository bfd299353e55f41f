pub mod check_config;
pub mod run;

use anyhow::Context;
use std::path::PathBuf;
use vmbot_cloud_yandex::ServiceAccountKey;
use vmbot_config::BotConfig;

/// Paths given on the command line
pub struct ConfigPaths {
    pub config: Option<PathBuf>,
    pub key: Option<PathBuf>,
}

/// Validated startup configuration
pub struct Loaded {
    pub config_path: PathBuf,
    pub key_path: PathBuf,
    pub config: BotConfig,
    pub key: ServiceAccountKey,
}

pub fn load(paths: &ConfigPaths) -> anyhow::Result<Loaded> {
    let config_path = vmbot_config::find_config_file(paths.config.as_deref())
        .context("Failed to locate the bot configuration")?;
    let config = vmbot_config::load_bot_config(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let key_path = vmbot_config::find_key_file(paths.key.as_deref())
        .context("Failed to locate the service account key")?;
    let raw_key = vmbot_config::load_key(&key_path)
        .with_context(|| format!("Failed to load {}", key_path.display()))?;
    let key = ServiceAccountKey::from_value(raw_key)
        .with_context(|| format!("Invalid service account key in {}", key_path.display()))?;

    Ok(Loaded {
        config_path,
        key_path,
        config,
        key,
    })
}
