//! Error types for the drill environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The input stream ended (EOF, window closed)
    #[error("Input closed")]
    InputClosed,

    /// A trainee action could not be understood
    #[error("Parse error: {0}")]
    Parse(String),

    /// Underlying I/O failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl EnvError {
    /// Creates a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

impl From<std::io::Error> for EnvError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
