use thiserror::Error;

/// Main error type for the battery arbitrage crate
#[derive(Error, Debug)]
pub enum ArbError {
    // Environment contract errors
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Data errors
    #[error("Invalid price data: {0}")]
    InvalidPriceData(String),

    // Configuration loading errors
    #[error("Config load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    // Persistence errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for ArbError
pub type Result<T> = std::result::Result<T, ArbError>;

impl ArbError {
    /// Whether the error ends the current episode under the environment contract
    pub fn is_episode_error(&self) -> bool {
        matches!(
            self,
            ArbError::InvalidAction(_) | ArbError::OutOfRange(_) | ArbError::Configuration(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_error_classification() {
        assert!(ArbError::OutOfRange("done".into()).is_episode_error());
        assert!(ArbError::InvalidAction("7".into()).is_episode_error());
        assert!(!ArbError::Checkpoint("missing".into()).is_episode_error());
    }

    #[test]
    fn test_error_display() {
        let err = ArbError::Configuration("capacity must be positive".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: capacity must be positive"
        );
    }
}
