//! Error Handling Module
//!
//! Defines custom error types for the leafsight inference core.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Main error type for leafsight operations
#[derive(Error, Debug)]
pub enum LeafsightError {
    /// Image bytes could not be decoded
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// A tensor produced during preprocessing does not match its expected shape
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// The class map is inconsistent with the classifier output
    #[error("Configuration integrity error: {0}")]
    ConfigIntegrity(String),

    /// Failure inside a network forward pass
    #[error("Inference error: {0}")]
    Inference(String),

    /// Error loading model weights
    #[error("Model error: {0}")]
    Model(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<image::ImageError> for LeafsightError {
    fn from(err: image::ImageError) -> Self {
        LeafsightError::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for LeafsightError {
    fn from(err: serde_json::Error) -> Self {
        LeafsightError::Serialization(err.to_string())
    }
}

impl LeafsightError {
    /// Whether the error was caused by bad caller input (correctable by the
    /// caller) rather than an internal processing failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, LeafsightError::Decode(_))
    }

    /// Message safe to hand back to callers. Client errors keep their detail;
    /// internal errors are reported generically and the full detail goes to
    /// the operator log instead.
    pub fn public_message(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            "internal processing error".to_string()
        }
    }
}

/// Convenience Result type for leafsight operations
pub type Result<T> = std::result::Result<T, LeafsightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LeafsightError::Inference("test error".to_string());
        assert_eq!(format!("{}", err), "Inference error: test error");
    }

    #[test]
    fn test_shape_mismatch_display() {
        let err = LeafsightError::ShapeMismatch {
            expected: "[1, 4, 299, 299]".to_string(),
            actual: "[1, 3, 299, 299]".to_string(),
        };
        assert!(format!("{}", err).contains("[1, 4, 299, 299]"));
    }

    #[test]
    fn test_client_error_split() {
        assert!(LeafsightError::Decode("bad magic".into()).is_client_error());
        assert!(!LeafsightError::Inference("nan".into()).is_client_error());
        assert!(!LeafsightError::ConfigIntegrity("gap".into()).is_client_error());
    }

    #[test]
    fn test_public_message_redacts_internal_detail() {
        let internal = LeafsightError::Inference("device lost at layer 3".into());
        assert_eq!(internal.public_message(), "internal processing error");

        let client = LeafsightError::Decode("not a JPEG".into());
        assert!(client.public_message().contains("not a JPEG"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LeafsightError = io_err.into();
        assert!(matches!(err, LeafsightError::Io(_)));
    }
}
