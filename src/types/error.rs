use thiserror::Error;

/// runstat error types
#[derive(Error, Debug)]
pub enum RunstatError {
    /// Results service request failed
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Failed to parse a JSON payload
    #[error("parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for runstat
pub type Result<T> = std::result::Result<T, RunstatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RunstatError::Parse("invalid json".into());
        assert_eq!(err.to_string(), "parse error: invalid json");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: RunstatError = io_err.into();
        assert!(err.to_string().contains("io error"));
    }
}
