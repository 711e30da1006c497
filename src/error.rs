//! Error types for fixed grid reading.

use {std::path::PathBuf, thiserror::Error};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Grid-description file missing, unparseable or unsupported
    #[error("Invalid grid configuration: {0}")]
    Config(String),

    /// Bad filename or payload not matching the declared grid shape
    #[error("Invalid data format: {0}")]
    Format(String),

    /// Channel count or column layout matches no known schema
    #[error("Unknown schema: {0}")]
    Schema(String),

    /// Coordinate reference system could not be bound to the dataset
    #[error("Failed to tag coordinate reference system: {0}")]
    GeoTag(String),

    /// Field was already reoriented into display order
    #[error("Field {0:?} is already oriented")]
    AlreadyOriented(String),

    #[error("Failed to serialize dataset: {0}")]
    Serialize(#[from] bincode::Error),

    #[error("Failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io<P: Into<PathBuf>>(path: P) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.into();
        move |source| Error::Io { path, source }
    }
}
