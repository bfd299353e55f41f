pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "bot_config.yaml";
pub const KEY_FILE: &str = "key.json";
pub const CONFIG_ENV: &str = "VMBOT_CONFIG";
pub const KEY_ENV: &str = "VMBOT_KEY";

/// Directory the container image mounts secrets into
const MOUNT_DIR: &str = "/config";

/// Bot configuration (`bot_config.yaml`)
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Telegram bot token
    pub token: String,

    /// Telegram user IDs allowed to issue commands
    pub whitelist: Vec<i64>,

    /// Chat that is told about every start/stop request
    #[serde(default)]
    pub notify_cid: Option<i64>,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("whitelist", &self.whitelist)
            .field("notify_cid", &self.notify_cid)
            .finish()
    }
}

impl BotConfig {
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        let config: BotConfig =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::Invalid("token must not be empty".to_string()));
        }
        if self.whitelist.is_empty() {
            return Err(ConfigError::Invalid(
                "whitelist must contain at least one user id".to_string(),
            ));
        }
        Ok(())
    }
}

/// vmbot's per-user configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("vmbot"))
}

/// Locate a configuration file
///
/// Search order:
/// 1. `explicit` (command line flag), which must exist
/// 2. the path in `env_var`
/// 3. the current directory
/// 4. `/config/`
/// 5. `~/.config/vmbot/`
fn find_file(
    explicit: Option<&Path>,
    env_var: &'static str,
    name: &'static str,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }

    if let Ok(config_path) = std::env::var(env_var) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::MissingFile(path));
    }

    let current = std::env::current_dir()?.join(name);
    if current.exists() {
        return Ok(current);
    }

    let mounted = Path::new(MOUNT_DIR).join(name);
    if mounted.exists() {
        return Ok(mounted);
    }

    if let Ok(dir) = get_config_dir() {
        let user = dir.join(name);
        if user.exists() {
            return Ok(user);
        }
    }

    Err(ConfigError::FileNotFound { name, env_var })
}

/// Locate `bot_config.yaml`
pub fn find_config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    find_file(explicit, CONFIG_ENV, CONFIG_FILE)
}

/// Locate the cloud credential file (`key.json`)
pub fn find_key_file(explicit: Option<&Path>) -> Result<PathBuf> {
    find_file(explicit, KEY_ENV, KEY_FILE)
}

/// Read and validate the bot configuration
pub fn load_bot_config(path: &Path) -> Result<BotConfig> {
    let content = std::fs::read_to_string(path)?;
    BotConfig::from_yaml(&content, path)
}

/// Read the cloud credential blob
///
/// The content is opaque here; the cloud provider interprets it.
pub fn load_key(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}
