//! Error types for mailbox-delegates

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("batch parse error: {0}")]
    Parse(String),

    #[error("credential error: {0}")]
    Credential(String),

    #[error("existence check failed: {0}")]
    ExistenceCheck(String),

    #[error("{0}")]
    Conflict(String),

    #[error("remote service error: {0}")]
    Remote(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
