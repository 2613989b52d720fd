use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// The configuration form was rejected. The message is meant for the user.
    InvalidConfig(String),
    /// Tensor shapes do not line up (bad width list, wrong input columns, ...).
    Shape(String),
    /// A model was used after it was disposed.
    Disposed,
    /// Statistics were requested over a sample set with no rows.
    EmptyDataset,
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Error::Shape(msg) => write!(f, "shape mismatch: {}", msg),
            Error::Disposed => write!(f, "model used after dispose"),
            Error::EmptyDataset => write!(f, "dataset has no samples"),
            Error::Io(e) => write!(f, "io: {}", e),
            Error::Json(e) => write!(f, "json: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}
