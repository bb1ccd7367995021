use crate::bind::BindError;
use crate::config::ConfigError;
use thiserror::Error;

/// Top-level error type for the dotbind library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("binding error: {0}")]
    Bind(#[from] BindError),
}
