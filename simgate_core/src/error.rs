//! Unified error handling for SIMGATE
//!
//! This module provides a centralized error type for the whole bridge,
//! ensuring consistent error handling across all components. Variants map
//! onto the failure taxonomy of the telemetry pipeline: malformed metadata
//! aborts one cycle, temporal regression and calibration mismatch are fatal,
//! a transient simulator non-response is retried by the caller.

use thiserror::Error;

/// Main error type for SIMGATE operations
#[derive(Debug, Error)]
pub enum GateError {
    /// I/O related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parsing or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Communication layer errors (bus publish/subscribe)
    #[error("Communication error: {0}")]
    Communication(String),

    /// Node-related errors
    #[error("Node '{node}' error: {message}")]
    Node { node: String, message: String },

    /// Simulator protocol errors (unexpected or missing responses)
    #[error("Simulator error: {0}")]
    Simulator(String),

    /// The metadata parser could not extract a required field
    #[error("Malformed metadata: {0}")]
    MalformedMetadata(String),

    /// Non-increasing simulation time; all derived-velocity math assumes
    /// forward time, so the affected pipeline must stop
    #[error("Temporal regression: time {current} does not advance past {previous}")]
    TemporalRegression { previous: f64, current: f64 },

    /// Camera bootstrap validation failure; blocks entry into streaming
    #[error("Calibration mismatch: {0}")]
    CalibrationMismatch(String),

    /// Serialization/Deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Parse errors
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid input/argument errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Catch-all for other error types
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using GateError
pub type GateResult<T> = Result<T, GateError>;

// Implement conversions from common error types
impl From<serde_json::Error> for GateError {
    fn from(err: serde_json::Error) -> Self {
        GateError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for GateError {
    fn from(err: toml::de::Error) -> Self {
        GateError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<serde_yaml::Error> for GateError {
    fn from(err: serde_yaml::Error) -> Self {
        GateError::Config(format!("YAML parse error: {}", err))
    }
}

impl From<std::num::ParseIntError> for GateError {
    fn from(err: std::num::ParseIntError) -> Self {
        GateError::ParseError(format!("Integer parse error: {}", err))
    }
}

impl From<std::num::ParseFloatError> for GateError {
    fn from(err: std::num::ParseFloatError) -> Self {
        GateError::ParseError(format!("Float parse error: {}", err))
    }
}

impl<T> From<std::sync::PoisonError<T>> for GateError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        GateError::Other("Lock poisoned".to_string())
    }
}

impl From<anyhow::Error> for GateError {
    fn from(err: anyhow::Error) -> Self {
        GateError::Other(err.to_string())
    }
}

impl From<&str> for GateError {
    fn from(msg: &str) -> Self {
        GateError::Other(msg.to_string())
    }
}

impl From<String> for GateError {
    fn from(msg: String) -> Self {
        GateError::Other(msg)
    }
}

// Helper methods
impl GateError {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(msg: S) -> Self {
        GateError::Config(msg.into())
    }

    /// Create a communication error
    pub fn communication<S: Into<String>>(msg: S) -> Self {
        GateError::Communication(msg.into())
    }

    /// Create a node error with node name and message
    pub fn node<S: Into<String>, T: Into<String>>(node: S, message: T) -> Self {
        GateError::Node {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Create a simulator protocol error
    pub fn simulator<S: Into<String>>(msg: S) -> Self {
        GateError::Simulator(msg.into())
    }

    /// Create a malformed-metadata error
    pub fn malformed_metadata<S: Into<String>>(msg: S) -> Self {
        GateError::MalformedMetadata(msg.into())
    }

    /// Create a calibration-mismatch error
    pub fn calibration_mismatch<S: Into<String>>(msg: S) -> Self {
        GateError::CalibrationMismatch(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        GateError::InvalidInput(msg.into())
    }

    /// Check if this is a malformed-metadata error
    pub fn is_malformed_metadata(&self) -> bool {
        matches!(self, GateError::MalformedMetadata(_))
    }

    /// Check if this is a temporal-regression error
    pub fn is_temporal_regression(&self) -> bool {
        matches!(self, GateError::TemporalRegression { .. })
    }

    /// Check if this is a calibration-mismatch error
    pub fn is_calibration_mismatch(&self) -> bool {
        matches!(self, GateError::CalibrationMismatch(_))
    }

    /// Fatal errors stop the affected pipeline instead of abandoning a
    /// single cycle. Temporal regression breaks every downstream consumer's
    /// monotonic-time assumption; a calibration mismatch means the node and
    /// the simulator disagree about camera geometry.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GateError::TemporalRegression { .. } | GateError::CalibrationMismatch(_)
        )
    }
}
