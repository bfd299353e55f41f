use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    ConfigDirNotFound,

    #[error(
        "{name} not found. Looked in:\n\
        - the path given on the command line or in ${env_var}\n\
        - the current directory\n\
        - /config/\n\
        - ~/.config/vmbot/"
    )]
    FileNotFound {
        name: &'static str,
        env_var: &'static str,
    },

    #[error("File does not exist: {0}")]
    MissingFile(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("YAML error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
