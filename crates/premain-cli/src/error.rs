use premain_core::{ScanError, cfg::CfgError, config::ConfigError};
use thiserror::Error as ThisError;

///
/// Error
///
/// Anything that stops a run before a report exists. Reported on stderr with
/// exit code 2.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid --cfg: {0}")]
    Cfg(#[from] CfgError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("cannot render json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("path '{0}' does not exist")]
    MissingPath(String),
}
