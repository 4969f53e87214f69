use thiserror::Error;

/// Unified error type for the gesture search library
#[derive(Debug, Error)]
pub enum SearchError {
    /// Missing or malformed run input; raised before any worker starts
    #[error("Invalid input for {field}: {message}")]
    InvalidInput { field: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// A string that does not decode to a legal gesture code
    #[error("Invalid gesture code '{code}': {reason}")]
    InvalidCode { code: String, reason: String },

    /// Transient failure of a single probe
    #[error("Probe failed for {code}: {message}")]
    Probe { code: String, message: String },

    /// Timeout errors
    #[error("Operation timed out: {operation} (timeout: {timeout_ms}ms)")]
    Timeout { operation: String, timeout_ms: u64 },

    /// IO errors
    #[error("IO operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization errors
    #[error("Serialization failed: {format}")]
    Serialization {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SearchError {
    /// Create an invalid input error
    pub fn invalid_input<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            field: None,
        }
    }

    /// Create a configuration error tied to a field
    pub fn configuration_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Configuration {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn invalid_code<C: Into<String>, R: Into<String>>(code: C, reason: R) -> Self {
        Self::InvalidCode {
            code: code.into(),
            reason: reason.into(),
        }
    }

    /// Create a probe error
    pub fn probe<C: Into<String>, M: Into<String>>(code: C, message: M) -> Self {
        Self::Probe {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Create an IO error
    pub fn io<S: Into<String>>(operation: S, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        format: S,
        source: E,
    ) -> Self {
        Self::Serialization {
            format: format.into(),
            source: Box::new(source),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if error is recoverable
    ///
    /// Recoverable errors are absorbed by the worker that hit them; the
    /// rest abort the run before it starts.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Probe { .. } | Self::Timeout { .. } | Self::Io { .. } => true,
            Self::InvalidInput { .. } | Self::Configuration { .. } => false,
            Self::InvalidCode { .. } | Self::Serialization { .. } | Self::Internal { .. } => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "input",
            Self::Configuration { .. } => "configuration",
            Self::InvalidCode { .. } => "code",
            Self::Probe { .. } => "probe",
            Self::Timeout { .. } => "timeout",
            Self::Io { .. } => "io",
            Self::Serialization { .. } => "serialization",
            Self::Internal { .. } => "internal",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SearchError>;

impl From<std::io::Error> for SearchError {
    fn from(err: std::io::Error) -> Self {
        Self::io("io_operation", err)
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("json", err)
    }
}

impl From<serde_yaml::Error> for SearchError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization("yaml", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SearchError::invalid_input("identifier", "must not be empty");
        assert!(matches!(err, SearchError::InvalidInput { .. }));
        assert_eq!(err.category(), "input");
        assert_eq!(
            err.to_string(),
            "Invalid input for identifier: must not be empty"
        );
    }

    #[test]
    fn test_error_recoverability() {
        assert!(SearchError::timeout("probe", 1000).is_recoverable());
        assert!(SearchError::probe("1234", "connection reset").is_recoverable());
        assert!(!SearchError::invalid_input("credential", "empty").is_recoverable());
        assert!(!SearchError::configuration("workers must be > 0").is_recoverable());
        assert!(!SearchError::internal("worker join failed").is_recoverable());
        assert!(!SearchError::invalid_code("13", "too short").is_recoverable());
    }

    #[test]
    fn test_conversions() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SearchError = io.into();
        assert_eq!(err.category(), "io");

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: SearchError = json_err.into();
        assert_eq!(err.category(), "serialization");
    }
}
