use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[cfg(feature = "sqlite")]
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found")]
    NotFound,

    #[error("invalid notebook path: {0}")]
    Validation(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Failure reported by a [`NotebookClient`](crate::client::NotebookClient)
    /// implementation. Passed through as-is.
    #[error("remote error: {0}")]
    Remote(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn remote<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Remote(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
