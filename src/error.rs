use thiserror::Error;

/// Main error type for nautex operations
#[derive(Error, Debug)]
pub enum NautexError {
    /// A concrete index rejected a key. Only the trigram engine produces
    /// this: keys must be exactly three bytes in `[a-z]`.
    #[error("invalid index key: {0}")]
    InvalidKey(String),

    #[error("storage error: {0}")]
    Storage(#[from] fjall::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dump parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("operation canceled")]
    Canceled,

    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for nautex operations
pub type Result<T> = std::result::Result<T, NautexError>;

impl NautexError {
    /// Whether indexing may continue past this error. Cancellation must
    /// stop the run; everything else is skipped per document.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, NautexError::Canceled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NautexError::InvalidKey("ab".to_string());
        assert_eq!(err.to_string(), "invalid index key: ab");
    }

    #[test]
    fn test_recoverable() {
        assert!(NautexError::InvalidKey("x".to_string()).is_recoverable());
        assert!(!NautexError::Canceled.is_recoverable());
    }
}
