use std::path::PathBuf;

use thiserror::Error as ThisError;

/// Failure taxonomy shared by the repositories, the attachment store and the auth service.
///
/// The HTTP layer is the only place that turns these into status codes.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// A unique key already exists.
    #[error("{0}")]
    Conflict(String),

    /// The requested row does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Unknown email or wrong password. Deliberately carries no detail.
    #[error("invalid credentials")]
    Auth,

    /// A store operation failed.
    #[error("storage operation failed: {0}")]
    Storage(#[from] sqlx::Error),

    /// An attachment could not be written or removed.
    #[error("file operation on {} failed: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
