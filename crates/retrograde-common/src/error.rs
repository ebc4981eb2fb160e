use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum RetrogradeError {
    /// A textual literal or tag tree could not be classified or parsed.
    InvalidFormat(String),
    /// A caller passed parameters outside the supported range.
    InvalidArgument(String),
    IoError(std::io::Error),
}

impl RetrogradeError {
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        RetrogradeError::InvalidFormat(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        RetrogradeError::InvalidArgument(msg.into())
    }
}

impl fmt::Display for RetrogradeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrogradeError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            RetrogradeError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            RetrogradeError::IoError(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl Error for RetrogradeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RetrogradeError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RetrogradeError {
    fn from(err: std::io::Error) -> Self {
        RetrogradeError::IoError(err)
    }
}

impl From<serde_json::Error> for RetrogradeError {
    fn from(err: serde_json::Error) -> Self {
        RetrogradeError::InvalidFormat(err.to_string())
    }
}
