use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid cloud source registration: {0}")]
    InvalidRegistration(String),
    #[error("Cloud source already registered: {0}")]
    DuplicateSource(String),
    #[error("Unknown cloud source: {0}")]
    UnknownSource(String),
    #[error("No configuration surface for component path: {0}")]
    UnknownComponent(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ImportError>;

/// A rejected upload. The server may not say why.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportFailure {
    pub message: Option<String>,
}

impl TransportFailure {
    pub const FALLBACK_MESSAGE: &'static str = "Unknown Error";

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    pub fn unknown() -> Self {
        Self { message: None }
    }

    pub fn display_message(&self) -> &str {
        match self.message.as_deref() {
            Some(message) if !message.trim().is_empty() => message,
            _ => Self::FALLBACK_MESSAGE,
        }
    }
}

impl std::fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_message_falls_back() {
        assert_eq!(TransportFailure::unknown().display_message(), "Unknown Error");
        assert_eq!(TransportFailure::new("  ").display_message(), "Unknown Error");
        assert_eq!(
            TransportFailure::new("Visibility is invalid").to_string(),
            "Visibility is invalid"
        );
    }
}
