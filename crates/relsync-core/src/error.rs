use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelsyncError {
    #[error("missing credential: set {0}")]
    MissingCredential(&'static str),

    #[error("invalid tag reference '{0}': expected refs/tags/<version>")]
    InvalidTagRef(String),

    #[error("config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown aggregate: {0}")]
    UnknownAggregate(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RelsyncError>;
